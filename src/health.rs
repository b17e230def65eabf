//! Liveness and readiness reporting

use crate::error::ServiceError;
use crate::metrics::{Endpoint, MetricsRegistry};
use crate::models::holder::ModelHolder;
use crate::types::response::HealthResponse;
use std::sync::Arc;

/// Reports process liveness and model readiness as separate signals.
#[derive(Clone)]
pub struct HealthReporter {
    model: Arc<ModelHolder>,
    metrics: Arc<MetricsRegistry>,
}

impl HealthReporter {
    pub fn new(model: Arc<ModelHolder>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { model, metrics }
    }

    /// Liveness: healthy whenever the process answers, loaded or not.
    pub fn health(&self) -> HealthResponse {
        self.metrics.record_success(Endpoint::Health);
        self.snapshot("healthy")
    }

    /// Readiness: fails with `NotLoaded` until the model is loaded.
    pub fn readiness(&self) -> Result<HealthResponse, ServiceError> {
        if !self.model.is_loaded() {
            self.metrics.record_failure(Endpoint::Ready);
            return Err(ServiceError::NotLoaded);
        }
        self.metrics.record_success(Endpoint::Ready);
        Ok(self.snapshot("ready"))
    }

    /// Current model state under the given status, without recording metrics.
    pub fn snapshot(&self, status: &str) -> HealthResponse {
        HealthResponse {
            status: status.to_string(),
            model_loaded: self.model.is_loaded(),
            model_version: self.model.version().to_string(),
        }
    }
}
