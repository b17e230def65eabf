//! Response payloads

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted class label
    pub prediction: i64,

    /// Maximum class probability, or 1.0 when the model exposes none
    pub confidence: f64,

    pub model_version: String,

    /// Echo of the client-supplied identifier, `null` when absent
    pub request_id: Option<String>,
}

/// Body of `GET /health` and `GET /ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_version: String,
}

/// Static descriptor served at `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

impl ServiceDescriptor {
    pub fn new(endpoints: &[&str]) -> Self {
        Self {
            service: "ML Inference Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        }
    }
}
