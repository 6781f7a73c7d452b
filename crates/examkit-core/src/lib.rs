//! Exam model, answer evaluation, and scoring.
//!
//! This crate defines the data model, the per-type evaluators, the
//! negative-marking scoring engine, and the report store trait that the rest
//! of examkit builds on.

pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scoring;
pub mod statistics;
pub mod traits;
