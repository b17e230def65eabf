//! Request, latency and prediction metrics for the inference service.
//!
//! Collectors are prometheus atomics, so concurrent handlers can record
//! without extra locking and without lost updates.

use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Latency buckets in seconds.
const LATENCY_BUCKETS: [f64; 7] = [0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0];

/// Confidence buckets; confidence always lies in [0, 1].
const CONFIDENCE_BUCKETS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Outcome label on the request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Endpoint label on the request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Predict,
    Health,
    Ready,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::Predict, Endpoint::Health, Endpoint::Ready];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Predict => "predict",
            Endpoint::Health => "health",
            Endpoint::Ready => "ready",
        }
    }
}

/// Process-wide metrics registry.
pub struct MetricsRegistry {
    registry: Registry,
    /// Requests by status and endpoint
    requests: IntCounterVec,
    /// End-to-end predict latency, successful calls only
    latency: Histogram,
    /// Confidence of each successful prediction
    predictions: Histogram,
    /// 1 when the model under `version` is loaded, 0 otherwise
    model_version: IntGaugeVec,
}

impl MetricsRegistry {
    /// Create and register all collectors.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("inference_requests_total", "Total inference requests"),
            &["status", "endpoint"],
        )?;
        let latency = Histogram::with_opts(
            HistogramOpts::new("inference_request_duration_seconds", "Request latency")
                .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        let predictions = Histogram::with_opts(
            HistogramOpts::new("prediction_value_distribution", "Prediction distribution")
                .buckets(CONFIDENCE_BUCKETS.to_vec()),
        )?;
        let model_version = IntGaugeVec::new(
            Opts::new("model_version_info", "Model version info"),
            &["version"],
        )?;

        registry
            .register(Box::new(requests.clone()))
            .context("Failed to register request counter")?;
        registry
            .register(Box::new(latency.clone()))
            .context("Failed to register latency histogram")?;
        registry
            .register(Box::new(predictions.clone()))
            .context("Failed to register prediction histogram")?;
        registry
            .register(Box::new(model_version.clone()))
            .context("Failed to register model version gauge")?;

        // Labeled children only show up once touched; start every
        // combination at zero so scrapes see the full set.
        for endpoint in Endpoint::ALL {
            for status in [RequestStatus::Success, RequestStatus::Error] {
                requests.with_label_values(&[status.as_str(), endpoint.as_str()]);
            }
        }

        Ok(Self {
            registry,
            requests,
            latency,
            predictions,
            model_version,
        })
    }

    /// Count one request outcome.
    pub fn record_request(&self, status: RequestStatus, endpoint: Endpoint) {
        self.requests
            .with_label_values(&[status.as_str(), endpoint.as_str()])
            .inc();
    }

    pub fn record_success(&self, endpoint: Endpoint) {
        self.record_request(RequestStatus::Success, endpoint);
    }

    pub fn record_failure(&self, endpoint: Endpoint) {
        self.record_request(RequestStatus::Error, endpoint);
    }

    /// Record one latency sample.
    pub fn observe_latency(&self, elapsed: Duration) {
        self.latency.observe(elapsed.as_secs_f64());
    }

    /// Record one prediction-confidence sample.
    pub fn observe_confidence(&self, confidence: f64) {
        self.predictions.observe(confidence);
    }

    /// Publish the model version, 1 if it is serving and 0 if it failed to load.
    pub fn set_model_version(&self, version: &str, loaded: bool) {
        self.model_version
            .with_label_values(&[version])
            .set(i64::from(loaded));
    }

    /// Current value of a request counter.
    pub fn request_count(&self, status: RequestStatus, endpoint: Endpoint) -> u64 {
        self.requests
            .with_label_values(&[status.as_str(), endpoint.as_str()])
            .get()
    }

    /// Number of latency samples recorded.
    pub fn latency_samples(&self) -> u64 {
        self.latency.get_sample_count()
    }

    /// Number of confidence samples recorded.
    pub fn confidence_samples(&self) -> u64 {
        self.predictions.get_sample_count()
    }

    /// Sum of all confidence samples.
    pub fn confidence_sum(&self) -> f64 {
        self.predictions.get_sample_sum()
    }

    /// Render every registered collector in the Prometheus text format.
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
    }

    /// Content type of [`MetricsRegistry::export`] output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
