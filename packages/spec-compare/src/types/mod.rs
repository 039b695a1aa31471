//! Data types flowing through the comparison pipeline.

pub mod attributes;
pub mod config;
pub mod content;
pub mod mapping;
pub mod record;
pub mod source;
