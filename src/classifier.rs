// WHY: Uniform call contract for the modality, DTR and TLink classifiers
// The models themselves are external; this module only defines the seam and an HTTP adapter

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::ClassifierError;

/// One classifier answer; the score is carried but not used by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score: 1.0,
        }
    }
}

/// Synchronous, blocking text classifier
pub trait Classifier {
    /// Classify a batch; one result per instance, in input order
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError>;

    /// Classify a single instance
    fn classify_one(&self, instance: &str) -> Result<Classification, ClassifierError> {
        let mut results = self.classify(&[instance.to_string()])?;
        match results.len() {
            1 => Ok(results.remove(0)),
            actual => Err(ClassifierError::CountMismatch { expected: 1, actual }),
        }
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        (**self).classify(instances)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        (**self).classify(instances)
    }
}

/// Classify and check that the classifier answered every instance
pub fn classify_all<C: Classifier + ?Sized>(
    classifier: &C,
    instances: &[String],
) -> Result<Vec<Classification>, ClassifierError> {
    if instances.is_empty() {
        return Ok(Vec::new());
    }
    let results = classifier.classify(instances)?;
    if results.len() != instances.len() {
        return Err(ClassifierError::CountMismatch {
            expected: instances.len(),
            actual: results.len(),
        });
    }
    Ok(results)
}

/// Request body for a classifier endpoint
#[derive(Serialize)]
struct ClassifyRequest<'a> {
    instances: &'a [String],
}

/// HTTP client for a text-classification endpoint
///
/// Posts `{"instances": [...]}` and expects a JSON array of `{"label", "score"}`.
pub struct RestClassifier {
    url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RestClassifier {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, ClassifierError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClassifierError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Classifier for RestClassifier {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        debug!(url = %self.url, count = instances.len(), "Sending classification batch");

        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { instances })
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassifierError::Connection(self.url.clone())
                } else if e.is_timeout() {
                    ClassifierError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ClassifierError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<Classification>>()
            .map_err(|e| ClassifierError::ResponseParsing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Classifier for Echo {
        fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
            Ok(instances.iter().map(|i| Classification::new(i.len().to_string())).collect())
        }
    }

    struct Short;

    impl Classifier for Short {
        fn classify(&self, _instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_classify_one_unwraps_single_result() {
        assert_eq!(Echo.classify_one("abc").unwrap().label, "3");
        assert!(matches!(
            Short.classify_one("abc"),
            Err(ClassifierError::CountMismatch { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_classify_all_checks_length() {
        let instances = vec!["a".to_string(), "bb".to_string()];
        assert_eq!(classify_all(&Echo, &instances).unwrap().len(), 2);
        assert!(classify_all(&Short, &instances).is_err());
        assert!(classify_all(&Short, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_boxed_classifier_delegates() {
        let boxed: Box<dyn Classifier> = Box::new(Echo);
        assert_eq!(boxed.classify_one("four").unwrap().label, "4");
    }

    #[test]
    fn test_response_score_is_optional() {
        let parsed: Vec<Classification> = serde_json::from_str(r#"[{"label": "BEFORE"}]"#).unwrap();
        assert_eq!(parsed[0].label, "BEFORE");
        assert_eq!(parsed[0].score, 0.0);
    }
}
