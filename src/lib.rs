//! Label Lens Server Library
//!
//! Backend for food-label analysis: an uploaded image goes through Google
//! Cloud Vision for OCR and labels, and the results are summarized by an
//! OpenAI chat model. The server binary lives in main.rs.
//!
//! # Modules
//!
//! - `vision`: credential resolution and the Cloud Vision client
//! - `summary`: prompt rendering, completion client, response decoding
//! - `analysis`: the detect-then-summarize pipeline
//! - `routes`: HTTP surface

pub mod analysis;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod summary;
pub mod vision;
