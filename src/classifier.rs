use crate::encoding::FeatureEncoder;
use crate::error::{Error, Result};
use crate::services::InferenceClient;
use log::{debug, info};
use serde::Deserialize;
use std::fmt;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// `0` is ham; every other code is spam.
    pub fn from_code(code: f64) -> Self {
        if code.trunc() == 0.0 {
            Label::Ham
        } else {
            Label::Spam
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ham => f.write_str("HAM"),
            Label::Spam => f.write_str("SPAM"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub label: Label,
    /// Probability exactly as reported by the endpoint.
    pub confidence: f64,
}

impl Verdict {
    /// Confidence as a whole percentage, truncated.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0) as u32
    }
}

/// Response body of the model endpoint. Both fields are row-major
/// matrices; a single-message request must yield exactly one cell each.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    pub predicted_label: Vec<Vec<f64>>,
    pub predicted_probability: Vec<Vec<f64>>,
}

impl PredictionResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::MalformedPrediction(format!("unreadable response: {e}")))
    }

    pub fn into_verdict(self) -> Result<Verdict> {
        let code = single_cell("predicted_label", &self.predicted_label)?;
        let probability = single_cell("predicted_probability", &self.predicted_probability)?;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(Error::MalformedPrediction(format!(
                "predicted_probability {probability} is outside [0, 1]"
            )));
        }

        Ok(Verdict {
            label: Label::from_code(code),
            confidence: probability,
        })
    }
}

fn single_cell(field: &str, rows: &[Vec<f64>]) -> Result<f64> {
    match rows {
        [row] => match row.as_slice() {
            [value] => Ok(*value),
            _ => Err(Error::MalformedPrediction(format!(
                "{field} row has {} columns, expected 1",
                row.len()
            ))),
        },
        _ => Err(Error::MalformedPrediction(format!(
            "{field} has {} rows, expected 1",
            rows.len()
        ))),
    }
}

/// Encodes an email body and asks the configured endpoint for a verdict.
pub struct Classifier<I> {
    encoder: FeatureEncoder,
    endpoint: String,
    inference: I,
}

impl<I: InferenceClient> Classifier<I> {
    pub fn new(encoder: FeatureEncoder, endpoint: impl Into<String>, inference: I) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::Config("inference endpoint name is empty".to_string()));
        }
        Ok(Self {
            encoder,
            endpoint,
            inference,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn inference(&self) -> &I {
        &self.inference
    }

    /// Serialized request body for one message: a batch holding one vector.
    pub fn request_body(&self, email_body: &str) -> Result<String> {
        let vectors = self.encoder.feature_vectors(&[email_body])?;
        serde_json::to_string(&vectors)
            .map_err(|e| Error::Serialization(format!("failed to serialize features: {e}")))
    }

    pub async fn classify(&self, email_body: &str) -> Result<Verdict> {
        let body = self.request_body(email_body)?;
        debug!(
            "Invoking endpoint {} with {}-wide feature vector",
            self.endpoint,
            self.encoder.vocabulary_size()
        );

        let response = self
            .inference
            .invoke_endpoint(&self.endpoint, JSON_CONTENT_TYPE, body)
            .await?;
        info!("Received prediction: {}", response.trim());

        PredictionResponse::from_json(&response)?.into_verdict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingConfig;
    use std::sync::Mutex;

    /// Returns a canned response and records what it was sent.
    struct CannedEndpoint {
        response: Result<String>,
        requests: Mutex<Vec<(String, String, String)>>,
    }

    impl CannedEndpoint {
        fn replying(body: &str) -> Self {
            Self {
                response: Ok(body.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(Error::Inference("connection reset".to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl InferenceClient for CannedEndpoint {
        async fn invoke_endpoint(
            &self,
            endpoint: &str,
            content_type: &str,
            body: String,
        ) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((endpoint.to_string(), content_type.to_string(), body));
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(e) => Err(Error::Inference(e.to_string())),
            }
        }
    }

    fn classifier(endpoint: CannedEndpoint) -> Classifier<CannedEndpoint> {
        let encoder = FeatureEncoder::from_config(&EncodingConfig::default()).unwrap();
        Classifier::new(encoder, "sms-spam-classifier", endpoint).unwrap()
    }

    #[tokio::test]
    async fn test_spam_verdict() {
        let classifier = classifier(CannedEndpoint::replying(
            r#"{"predicted_label": [[1.0]], "predicted_probability": [[0.9876]]}"#,
        ));
        let verdict = classifier.classify("FREE money now!!!").await.unwrap();

        assert_eq!(verdict.label, Label::Spam);
        assert_eq!(verdict.confidence, 0.9876);
        assert_eq!(verdict.confidence_percent(), 98);

        let requests = classifier.inference.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (endpoint, content_type, body) = &requests[0];
        assert_eq!(endpoint, "sms-spam-classifier");
        assert_eq!(content_type, "application/json");

        let sent: Vec<Vec<f32>> = serde_json::from_str(body).unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 9013);
        assert_eq!(sent[0][1037], 1.0);
        assert_eq!(sent[0].iter().sum::<f32>(), 3.0);
    }

    #[tokio::test]
    async fn test_ham_verdict() {
        let classifier = classifier(CannedEndpoint::replying(
            r#"{"predicted_label": [[0.0]], "predicted_probability": [[0.12]]}"#,
        ));
        let verdict = classifier.classify("See you at lunch").await.unwrap();
        assert_eq!(verdict.label, Label::Ham);
        assert_eq!(verdict.confidence, 0.12);
    }

    #[tokio::test]
    async fn test_empty_body_still_classified() {
        let classifier = classifier(CannedEndpoint::replying(
            r#"{"predicted_label": [[0]], "predicted_probability": [[0.5]]}"#,
        ));
        let verdict = classifier.classify("").await.unwrap();
        assert_eq!(verdict.label, Label::Ham);

        let requests = classifier.inference.requests.lock().unwrap();
        let sent: Vec<Vec<f32>> = serde_json::from_str(&requests[0].2).unwrap();
        assert_eq!(sent[0].len(), 9013);
        assert!(sent[0].iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn test_inference_failure_propagates() {
        let classifier = classifier(CannedEndpoint::failing());
        let result = classifier.classify("hello").await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn test_label_codes() {
        assert_eq!(Label::from_code(0.0), Label::Ham);
        assert_eq!(Label::from_code(0.4), Label::Ham);
        assert_eq!(Label::from_code(1.0), Label::Spam);
        assert_eq!(Label::from_code(2.0), Label::Spam);
        assert_eq!(Label::Spam.to_string(), "SPAM");
        assert_eq!(Label::Ham.to_string(), "HAM");
    }

    #[test]
    fn test_batched_response_rejected() {
        let response = PredictionResponse::from_json(
            r#"{"predicted_label": [[1.0], [0.0]], "predicted_probability": [[0.9], [0.2]]}"#,
        )
        .unwrap();
        let err = response.into_verdict().unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction(_)));
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn test_wide_row_rejected() {
        let response = PredictionResponse::from_json(
            r#"{"predicted_label": [[1.0]], "predicted_probability": [[0.9, 0.1]]}"#,
        )
        .unwrap();
        assert!(matches!(
            response.into_verdict(),
            Err(Error::MalformedPrediction(_))
        ));
    }

    #[test]
    fn test_empty_and_missing_fields_rejected() {
        let response = PredictionResponse::from_json(
            r#"{"predicted_label": [], "predicted_probability": [[0.9]]}"#,
        )
        .unwrap();
        assert!(response.into_verdict().is_err());

        assert!(matches!(
            PredictionResponse::from_json(r#"{"predicted_label": [[1.0]]}"#),
            Err(Error::MalformedPrediction(_))
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let response = PredictionResponse::from_json(
            r#"{"predicted_label": [[1.0]], "predicted_probability": [[1.5]]}"#,
        )
        .unwrap();
        assert!(matches!(
            response.into_verdict(),
            Err(Error::MalformedPrediction(_))
        ));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let encoder = FeatureEncoder::from_config(&EncodingConfig::default()).unwrap();
        let result = Classifier::new(encoder, "  ", CannedEndpoint::replying("{}"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
