//! External keyphrase extraction client.

use std::time::Duration;

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct Phrase {
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct KeyphraseResponse {
    phrases: Vec<RawPhrase>,
}

#[derive(Debug, Deserialize)]
struct RawPhrase {
    text: String,
    score: f64,
}

/// `Ok(None)` means the caller hit the provider's rate limit and should stop
/// tagging for the rest of this run; any other failure is a hard error.
pub enum KeyphraseOutcome {
    Phrases(Vec<Phrase>),
    RateLimited,
}

pub struct KeyphraseClient {
    client: reqwest::Client,
    api_key: String,
}

impl KeyphraseClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is valid");
        Self { client, api_key }
    }

    pub async fn extract(&self, text: &str) -> Result<KeyphraseOutcome, ServiceError> {
        let response = self
            .client
            .post("https://api.example-keyphrase-provider.invalid/v1/extract")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(KeyphraseOutcome::RateLimited);
        }

        if !response.status().is_success() {
            return Err(ServiceError::DependencyUnavailable(format!(
                "keyphrase API returned {}",
                response.status()
            )));
        }

        let parsed: KeyphraseResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

        Ok(KeyphraseOutcome::Phrases(
            parsed.phrases.into_iter().map(|p| Phrase { text: p.text, score: p.score }).collect(),
        ))
    }
}

/// Normalize (NFC, trim, lowercase, collapse whitespace, drop empty) and
/// scale scores into `[0,1]` against the batch max.
pub fn normalize_and_scale(mut phrases: Vec<Phrase>, top_n: usize) -> Vec<(String, f64)> {
    phrases.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    phrases.truncate(top_n);

    let max_raw = phrases.iter().map(|p| p.score).fold(0.0_f64, f64::max);

    phrases
        .into_iter()
        .filter_map(|p| {
            let nfc: String = p.text.nfc().collect();
            let name = collapse_whitespace(&nfc.trim().to_lowercase());
            if name.is_empty() {
                return None;
            }
            let scaled = if max_raw > 0.0 { (p.score / max_raw).clamp(0.0, 1.0) } else { 0.0 };
            Some((name, scaled))
        })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_against_batch_max() {
        let phrases = vec![
            Phrase { text: "  Rust   Lang ".to_string(), score: 10.0 },
            Phrase { text: "Web".to_string(), score: 5.0 },
        ];
        let scaled = normalize_and_scale(phrases, 5);
        assert_eq!(scaled[0], ("rust lang".to_string(), 1.0));
        assert_eq!(scaled[1].1, 0.5);
    }

    #[test]
    fn drops_empty_names_after_normalization() {
        let phrases = vec![Phrase { text: "   ".to_string(), score: 1.0 }];
        assert!(normalize_and_scale(phrases, 5).is_empty());
    }

    #[test]
    fn truncates_to_top_n() {
        let phrases = (0..10).map(|i| Phrase { text: format!("p{i}"), score: i as f64 }).collect();
        assert_eq!(normalize_and_scale(phrases, 3).len(), 3);
    }
}
