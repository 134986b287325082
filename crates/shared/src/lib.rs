//! Shared types, errors, and configuration for the back-office core.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - The monetary tolerance applied to every balance check
//! - Error classification (category and severity) and `AppError`
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccountCodeMap, AppConfig};
pub use error::{AppError, AppResult, ErrorCategory, Notice, Severity};
