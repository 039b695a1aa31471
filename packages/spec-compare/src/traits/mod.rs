//! Core trait abstractions for the comparison library.
//!
//! These traits define the capabilities the pipeline depends on:
//! generation, web search, fetching and document conversion.

pub mod ai;
pub mod converter;
pub mod fetcher;
pub mod searcher;
