use crate::ServingResult;
use anyhow::Context;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One inference input: a (H, W, C) image as nested arrays.
pub type Instance = Vec<Vec<Vec<f32>>>;

/// JSON body for the predict call.
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub signature_name: String,
    pub instances: Vec<Instance>,
}

impl PredictRequest {
    /// Build a request against the default serving signature.
    pub fn new(instances: Vec<Instance>) -> Self {
        Self {
            signature_name: "serving_default".to_string(),
            instances,
        }
    }
}

/// JSON response: one per-class score vector per submitted instance.
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Vec<f32>>,
}

/// Blocking HTTP client bound to one model on one serving host.
#[derive(Debug, Clone)]
pub struct PredictClient {
    client: Client,
    base_url: String,
    model_name: String,
}

impl PredictClient {
    /// Create a client for `http://<hostname>:<port>`.
    pub fn new(hostname: &str, port: u16, model_name: &str) -> ServingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("http://{hostname}:{port}"),
            model_name: model_name.to_string(),
        })
    }

    /// The full predict URL for this client's model.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/models/{}:predict", self.base_url, self.model_name)
    }

    /// Send instances for inference and parse the score vectors.
    pub fn predict(&self, instances: Vec<Instance>) -> ServingResult<PredictResponse> {
        let url = self.endpoint();
        let response = self
            .client
            .post(&url)
            .json(&PredictRequest::new(instances))
            .send()
            .with_context(|| format!("predict request to {url} failed"))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("serving endpoint {url} returned an error status"))?;

        response
            .json()
            .with_context(|| format!("failed to parse predictions from {url}"))
    }
}

/// Index of the highest score; 0 when the vector is empty.
pub fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
