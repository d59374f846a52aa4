//! API module
//!
//! Contains HTTP request handlers for the pipeline endpoints

pub mod pipeline;
pub mod streaming;
pub mod utils;
