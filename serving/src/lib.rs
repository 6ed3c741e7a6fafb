//! Minimal HTTP client for the model server's REST predict endpoint.
//!
//! The serving host exposes the conventional
//! `POST /v1/models/<name>:predict` path on port 8501 with a JSON body of
//! `{signature_name, instances}`; this crate only wraps that one call.

mod client;

pub use client::{Instance, PredictClient, PredictRequest, PredictResponse, argmax};

/// Crate-wide result type.
pub type ServingResult<T> = anyhow::Result<T>;
