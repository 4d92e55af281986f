//! Abroad - a command-line ledger for a study-abroad counseling pipeline
//!
//! This library provides the core functionality for Abroad, including:
//! - Database operations and migrations
//! - Data models for leads, tasks, stage history and users
//! - Repository layer for data access
//! - Login sessions and role-gated commands
//! - The stage transition rules and the lead workflow built on them
//! - CSV lead import, dashboards and reports
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use abroad::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod db;
pub mod models;
pub mod repo;
pub mod auth;
pub mod pipeline;
pub mod import;
pub mod report;
pub mod seed;
pub mod cli;
pub mod utils;
