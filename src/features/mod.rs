//! Feature input handling
//!
//! Read-only feature matrices, built in memory or loaded from CSV.

pub mod matrix;

pub use matrix::FeatureMatrix;
