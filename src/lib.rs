//! Plotwise - routed diagram generation with automated visual review
//!
//! Takes technical questions, decides whether a figure helps, routes each one
//! to the renderer best suited to its subject, reviews the result with a
//! vision model for answer leakage and correctness, and retries or falls back
//! within a fixed attempt budget before publishing to an object store.

pub mod agent;
pub mod api;
pub mod classifier;
pub mod cli;
pub mod composer;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod question;
pub mod render;
pub mod review;
pub mod selection;
pub mod storage;
pub mod taxonomy;
