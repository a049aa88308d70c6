//! Prediction and inference
//!
//! Load trained classifiers and generate status predictions.

pub mod inference;

pub use inference::{predict, Predictor};
