//! Prediction request payload

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Raw feature values; shape and finiteness are checked by the validator
    #[serde(deserialize_with = "deserialize_features")]
    pub features: Vec<f64>,

    /// Optional client identifier echoed back in the response
    #[serde(default)]
    pub request_id: Option<String>,
}

/// JSON has no literal for NaN or infinity, so clients may send them as
/// strings ("NaN", "inf", "-Infinity").
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureValue {
    Number(f64),
    Text(String),
}

fn deserialize_features<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<FeatureValue>::deserialize(deserializer)?
        .into_iter()
        .map(|value| match value {
            FeatureValue::Number(n) => Ok(n),
            FeatureValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("feature {:?} is not a number", text))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_id() {
        let req: PredictionRequest =
            serde_json::from_str(r#"{"features": [5.1, 3.5, 1.4, 0.2]}"#).unwrap();

        assert_eq!(req.features, vec![5.1, 3.5, 1.4, 0.2]);
        assert!(req.request_id.is_none());
    }

    #[test]
    fn test_integers_and_special_strings() {
        let req: PredictionRequest = serde_json::from_str(
            r#"{"features": [1, "NaN", "-inf", "Infinity"], "request_id": "abc"}"#,
        )
        .unwrap();

        assert_eq!(req.features[0], 1.0);
        assert!(req.features[1].is_nan());
        assert_eq!(req.features[2], f64::NEG_INFINITY);
        assert_eq!(req.features[3], f64::INFINITY);
        assert_eq!(req.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejects_non_numeric_text() {
        let result =
            serde_json::from_str::<PredictionRequest>(r#"{"features": [1.0, "wide", 2.0, 3.0]}"#);
        assert!(result.is_err());
    }
}
