//! Core domain types and logic.

pub mod bar;
pub mod ticker;
pub mod day_index;
pub mod series;
pub mod store;
pub mod coverage;
pub mod stats;
pub mod correlation;
pub mod engine;
pub mod config;
pub mod error;
