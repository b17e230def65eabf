//! Predict request orchestration.
//!
//! Validation, model invocation, confidence derivation and metrics
//! recording for one request, independent of the HTTP layer.

use crate::error::{ServiceError, ValidationError};
use crate::metrics::{Endpoint, MetricsRegistry};
use crate::models::holder::ModelHolder;
use crate::types::response::PredictionResponse;
use crate::validator::RequestValidator;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of a successful prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: i64,
    /// Max class probability, or 1.0 when the model has no probabilities
    pub confidence: f64,
    pub model_version: String,
    pub request_id: Option<String>,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        PredictionResponse {
            prediction: result.label,
            confidence: result.confidence,
            model_version: result.model_version,
            request_id: result.request_id,
        }
    }
}

/// Runs the validate, predict, record pipeline for `/predict`.
#[derive(Clone)]
pub struct InferenceHandler {
    model: Arc<ModelHolder>,
    metrics: Arc<MetricsRegistry>,
    validator: Arc<RequestValidator>,
}

impl InferenceHandler {
    pub fn new(model: Arc<ModelHolder>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            model,
            metrics,
            validator: Arc::new(RequestValidator::new()),
        }
    }

    /// Handle one prediction request.
    ///
    /// Success records one success count, one latency sample covering the
    /// whole call and one confidence sample. Any failure records exactly one
    /// failure count and nothing else.
    pub fn handle(
        &self,
        features: &[f64],
        request_id: Option<String>,
    ) -> Result<PredictionResult, ServiceError> {
        let start = Instant::now();

        match self.run(features, request_id) {
            Ok(result) => {
                self.metrics.record_success(Endpoint::Predict);
                self.metrics.observe_latency(start.elapsed());
                self.metrics.observe_confidence(result.confidence);
                debug!(
                    label = result.label,
                    confidence = result.confidence,
                    request_id = ?result.request_id,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Prediction complete"
                );
                Ok(result)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Count a request that failed before reaching [`InferenceHandler::handle`],
    /// such as an unreadable body.
    pub fn reject_malformed(&self, reason: impl Into<String>) -> ServiceError {
        self.reject(ValidationError::MalformedBody(reason.into()).into())
    }

    fn reject(&self, error: ServiceError) -> ServiceError {
        self.metrics.record_failure(Endpoint::Predict);
        match &error {
            ServiceError::Validation(reason) => {
                debug!(reason = %reason, "Prediction request rejected")
            }
            other => warn!(error = %other, "Prediction failed"),
        }
        error
    }

    fn run(
        &self,
        features: &[f64],
        request_id: Option<String>,
    ) -> Result<PredictionResult, ServiceError> {
        let features = self.validator.validate(features)?;

        if !self.model.is_loaded() {
            return Err(ServiceError::NotLoaded);
        }

        let classification = self.model.classify(&features)?;

        Ok(PredictionResult {
            label: classification.label,
            confidence: classification.probabilities.confidence(),
            model_version: self.model.version().to_string(),
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RequestStatus;
    use crate::models::fixtures::FixedLoader;
    use std::sync::atomic::Ordering;

    fn handler_with(loader: Option<&FixedLoader>) -> (InferenceHandler, Arc<MetricsRegistry>) {
        let mut holder = ModelHolder::new("1.0.0");
        if let Some(loader) = loader {
            holder.load_with(loader, "iris.onnx").unwrap();
        }
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        (
            InferenceHandler::new(Arc::new(holder), metrics.clone()),
            metrics,
        )
    }

    #[test]
    fn test_iris_prediction() {
        let loader = FixedLoader::with_probabilities(0, vec![0.98, 0.02, 0.0]);
        let (handler, metrics) = handler_with(Some(&loader));

        let result = handler
            .handle(&[5.1, 3.5, 1.4, 0.2], Some("req-1".to_string()))
            .unwrap();

        assert_eq!(result.label, 0);
        assert_eq!(result.confidence, 0.98);
        assert_eq!(result.model_version, "1.0.0");
        assert_eq!(result.request_id.as_deref(), Some("req-1"));

        assert_eq!(
            metrics.request_count(RequestStatus::Success, Endpoint::Predict),
            1
        );
        assert_eq!(metrics.latency_samples(), 1);
        assert_eq!(metrics.confidence_samples(), 1);
        assert!((metrics.confidence_sum() - 0.98).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_fallback_without_probabilities() {
        let loader = FixedLoader::label_only(1);
        let (handler, metrics) = handler_with(Some(&loader));

        let result = handler.handle(&[6.0, 2.9, 4.5, 1.5], None).unwrap();

        assert_eq!(result.label, 1);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(metrics.confidence_samples(), 1);
    }

    #[test]
    fn test_invalid_input_never_reaches_model() {
        let loader = FixedLoader::with_probabilities(0, vec![1.0, 0.0, 0.0]);
        let (handler, metrics) = handler_with(Some(&loader));

        let short = handler.handle(&[1.0, 2.0, 3.0], None).unwrap_err();
        let nan = handler.handle(&[1.0, f64::NAN, 2.0, 3.0], None).unwrap_err();
        let inf = handler
            .handle(&[1.0, 2.0, f64::INFINITY, 3.0], None)
            .unwrap_err();

        for err in [short, nan, inf] {
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.request_count(RequestStatus::Error, Endpoint::Predict), 3);
        assert_eq!(
            metrics.request_count(RequestStatus::Success, Endpoint::Predict),
            0
        );
        assert_eq!(metrics.latency_samples(), 0);
        assert_eq!(metrics.confidence_samples(), 0);
    }

    #[test]
    fn test_not_loaded_is_service_unavailable() {
        let (handler, metrics) = handler_with(None);

        let err = handler.handle(&[5.1, 3.5, 1.4, 0.2], None).unwrap_err();

        assert!(matches!(err, ServiceError::NotLoaded));
        assert_eq!(metrics.request_count(RequestStatus::Error, Endpoint::Predict), 1);
        assert_eq!(metrics.latency_samples(), 0);
    }

    #[test]
    fn test_malformed_body_counts_as_failure() {
        let (handler, metrics) = handler_with(None);

        let err = handler.reject_malformed("expected value at line 1 column 1");

        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MalformedBody(_))
        ));
        assert_eq!(metrics.request_count(RequestStatus::Error, Endpoint::Predict), 1);
    }
}
