//! Dealdrop - deal and coupon sharing backend
//!
//! Promoters post affiliate deals (one by one or from a CSV/XLSX sheet);
//! shoppers browse, vote, comment, save, share and follow promoters.
//! View/click/share/save events feed per-promoter analytics.
//!
//! # Architecture
//! - `storage`: SeaORM persistence (SQLite / PostgreSQL)
//! - `services`: business rules shared by the HTTP API and the CLI
//! - `api`: actix-web routes, identity middleware, JWT
//! - `config`: TOML + environment configuration
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
