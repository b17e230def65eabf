//! Request validation for classifier input.
//!
//! Every candidate feature list passes through here before the model is
//! touched, so a malformed request can never reach the model holder.

use crate::error::ValidationError;
use crate::types::features::{FeatureVector, FEATURE_COUNT};

/// Checks shape and numeric well-formedness of incoming feature lists.
pub struct RequestValidator;

impl RequestValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate feature list.
    ///
    /// Rejects anything that is not exactly [`FEATURE_COUNT`] finite values.
    /// The length check runs first so a short vector containing NaN reports
    /// the length problem.
    pub fn validate(&self, candidate: &[f64]) -> Result<FeatureVector, ValidationError> {
        if candidate.len() != FEATURE_COUNT {
            return Err(ValidationError::WrongLength {
                expected: FEATURE_COUNT,
                actual: candidate.len(),
            });
        }

        let mut values = [0.0; FEATURE_COUNT];
        for (index, (slot, &value)) in values.iter_mut().zip(candidate).enumerate() {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { index });
            }
            *slot = value;
        }

        Ok(FeatureVector::new(values))
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}
