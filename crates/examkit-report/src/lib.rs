//! Rendering of scored attempts.
//!
//! Builds the per-question review list and a self-contained HTML result page.

pub mod html;
pub mod review;

pub use html::{generate_html, write_html_report};
pub use review::{build_review, correct_answer_text, ReviewEntry};
