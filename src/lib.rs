//! Finance Query Gateway
//!
//! A single HTTP endpoint that answers finance questions through Gemini:
//! - General questions are answered directly with a friendly Q&A prompt
//! - Portfolio requests (capital, investing, funds, risk) go to the portfolio planner
//!
//! FLOW:
//! REQUEST → CLASSIFY → (GENERAL PROMPT | PORTFOLIO PLAN) → RESPONSE

pub mod api;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gemini;
pub mod models;
pub mod portfolio;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{KeywordClassifier, QueryCategory, QueryClassifier, WordPrefixClassifier};
pub use dispatcher::Dispatcher;
