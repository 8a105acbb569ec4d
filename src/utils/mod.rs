// src/utils/mod.rs
//! Shared utilities: options and errors

pub mod config;
pub mod errors;
