//! melkacquire - Persian real-estate listing acquisition pipeline.
//!
//! Extracts listings from divar.ir pages, normalizes their Persian-language
//! numeric fields, downloads listing photos, and ingests everything into a
//! relational store.

pub mod cli;
pub mod config;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod services;
