//! Classifier backed by an ONNX Runtime session

use crate::models::classifier::{Classification, Classifier, Probabilities};
use crate::types::features::{FeatureVector, FEATURE_COUNT};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Loaded ONNX classifier with the output names resolved at load time.
pub struct OnnxClassifier {
    name: String,
    /// Runs need exclusive access to the session
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
    /// `None` when the graph exposes no probability output
    probability_output: Option<String>,
}

impl OnnxClassifier {
    pub(crate) fn new(
        name: &str,
        session: Session,
        input_name: String,
        label_output: String,
        probability_output: Option<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        }
    }

    /// Runs never mutate model state, so a panic on another thread leaves
    /// the session usable.
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        lock_unpoisoned(&self.session)
    }

    fn input_tensor(&self, features: &FeatureVector) -> Result<Tensor<f32>> {
        // Shape [1, num_features]
        let shape = vec![1_i64, FEATURE_COUNT as i64];
        Tensor::from_array((shape, features.to_f32())).context("Failed to create input tensor")
    }

    /// Read the label from a tensor output. Integer labels are taken as is;
    /// float score tensors fall back to the arg-max of the first row.
    fn extract_label(&self, outputs: &SessionOutputs) -> Result<i64> {
        let output = outputs
            .get(self.label_output.as_str())
            .with_context(|| format!("Output {} missing from model result", self.label_output))?;

        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return data.first().copied().context("Empty label tensor");
        }

        if let Ok((_, data)) = output.try_extract_tensor::<i32>() {
            return data
                .first()
                .map(|&v| i64::from(v))
                .context("Empty label tensor");
        }

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let width = dims.last().copied().unwrap_or(1).max(1) as usize;
            let row = &data[..width.min(data.len())];
            if row.len() == 1 {
                return Ok(row[0].round() as i64);
            }
            return row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(index, _)| index as i64)
                .context("Empty score tensor");
        }

        anyhow::bail!(
            "Output {} of model {} is not a label tensor",
            self.label_output,
            self.name
        )
    }

    /// Extract the class distribution from tensor output (`zipmap=False`
    /// exports) or seq(map(int64, float)) output (default sklearn exports).
    fn extract_distribution(&self, outputs: &SessionOutputs, output_name: &str) -> Result<Vec<f64>> {
        let output = outputs
            .get(output_name)
            .with_context(|| format!("Output {} missing from model result", output_name))?;

        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let width = dims.last().copied().unwrap_or(data.len() as i64).max(0) as usize;
            let row = &data[..width.min(data.len())];
            debug!(model = %self.name, classes = row.len(), "Extracted from tensor");
            return Ok(row.iter().map(|&p| p as f64).collect());
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            return self.extract_from_sequence_map(output);
        }

        anyhow::bail!(
            "Output {} of model {} has unsupported type {:?}",
            output_name,
            self.name,
            dtype
        )
    }

    /// seq(map(int64, float)) holds one map per batch row; batch size is one.
    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps.first().context("Empty sequence")?;

        let mut kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
        kv_pairs.sort_by_key(|(class_id, _)| *class_id);

        debug!(model = %self.name, classes = kv_pairs.len(), "Extracted from seq(map)");

        Ok(kv_pairs.into_iter().map(|(_, p)| p as f64).collect())
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let input_tensor = self.input_tensor(features)?;

        let mut session = self.lock_session();
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        self.extract_label(&outputs)
    }

    fn supports_probability(&self) -> bool {
        self.probability_output.is_some()
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let output_name = self
            .probability_output
            .as_deref()
            .context("Model has no probability output")?;
        let input_tensor = self.input_tensor(features)?;

        let mut session = self.lock_session();
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        self.extract_distribution(&outputs, output_name)
    }

    /// Label and distribution come from the same session run.
    fn classify(&self, features: &FeatureVector) -> Result<Classification> {
        let input_tensor = self.input_tensor(features)?;

        let mut session = self.lock_session();
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let label = self.extract_label(&outputs)?;
        let probabilities = match self.probability_output.as_deref() {
            Some(output_name) => {
                Probabilities::Supported(self.extract_distribution(&outputs, output_name)?)
            }
            None => Probabilities::Unsupported,
        };

        Ok(Classification {
            label,
            probabilities,
        })
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
