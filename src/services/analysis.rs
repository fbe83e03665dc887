use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::core::CompatibilityReport;
use crate::models::{MatchAnalysis, MatchType, ReadingSnapshot};

/// Errors that can occur while generating a match analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Produces the narrative part of a match from its computed report
#[async_trait]
pub trait AnalysisGenerator: Send + Sync {
    async fn generate(
        &self,
        a: &ReadingSnapshot,
        b: &ReadingSnapshot,
        report: &CompatibilityReport,
        match_type: MatchType,
    ) -> Result<MatchAnalysis, AnalysisError>;
}

/// Sub-scores below this read as a challenge
const CHALLENGE_THRESHOLD: u8 = 60;

/// Deterministic analysis assembled from the report itself
#[derive(Debug, Clone, Default)]
pub struct TemplateAnalysisGenerator;

#[async_trait]
impl AnalysisGenerator for TemplateAnalysisGenerator {
    async fn generate(
        &self,
        a: &ReadingSnapshot,
        b: &ReadingSnapshot,
        report: &CompatibilityReport,
        match_type: MatchType,
    ) -> Result<MatchAnalysis, AnalysisError> {
        let astro = &report.astro;
        let palm = &report.palm;

        let challenges = [
            ("affinity", palm.affinity),
            ("communication", palm.communication),
            ("life direction", palm.life_direction),
            ("vitality", palm.vitality),
        ]
        .iter()
        .filter(|(_, score)| *score < CHALLENGE_THRESHOLD)
        .map(|(name, score)| format!("Work on {} together (score {})", name, score))
        .collect();

        let dynamics = format!(
            "{} ({}) and {} ({}) as a {} pairing: {} {}",
            a.display_name,
            astro.sign1,
            b.display_name,
            astro.sign2,
            match_type,
            astro.elemental_harmony.description,
            astro.modality_alignment.description
        );

        Ok(MatchAnalysis {
            highlights: report.correlation.correlation_tags.clone(),
            challenges,
            dynamics,
            extra: serde_json::Map::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct PartySummary<'a> {
    name: &'a str,
    sign: String,
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    #[serde(rename = "matchType")]
    match_type: MatchType,
    #[serde(rename = "partyA")]
    party_a: PartySummary<'a>,
    #[serde(rename = "partyB")]
    party_b: PartySummary<'a>,
    report: &'a CompatibilityReport,
}

/// Client for an external text-generation endpoint
///
/// POSTs the report as JSON and expects a [`MatchAnalysis`] body back.
pub struct HttpAnalysisGenerator {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HttpAnalysisGenerator {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl AnalysisGenerator for HttpAnalysisGenerator {
    async fn generate(
        &self,
        a: &ReadingSnapshot,
        b: &ReadingSnapshot,
        report: &CompatibilityReport,
        match_type: MatchType,
    ) -> Result<MatchAnalysis, AnalysisError> {
        let body = AnalysisRequest {
            match_type,
            party_a: PartySummary {
                name: &a.display_name,
                sign: report.astro.sign1.to_string(),
            },
            party_b: PartySummary {
                name: &b.display_name,
                sign: report.astro.sign2.to_string(),
            },
            report,
        };

        tracing::debug!("Requesting analysis from: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AnalysisError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Failed to generate analysis: {}",
                status
            )));
        }

        response
            .json::<MatchAnalysis>()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(format!("Failed to parse analysis: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Matcher;
    use crate::models::{BirthProfile, ReadingDocument};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn create_test_snapshot(name: &str, y: i32, m: u32, d: u32) -> ReadingSnapshot {
        ReadingSnapshot {
            display_name: name.to_string(),
            reading: ReadingDocument {
                lines: BTreeMap::new(),
                mounts: BTreeMap::new(),
            },
            profile: BirthProfile {
                name: name.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                time_of_birth: None,
                place_of_birth: None,
                relationship_status: None,
            },
        }
    }

    #[tokio::test]
    async fn test_template_analysis_mentions_both_signs() {
        let a = create_test_snapshot("Ana", 1990, 8, 5);
        let b = create_test_snapshot("Ben", 1991, 12, 1);
        let report = Matcher::with_default_weights().evaluate(&a, &b);

        let analysis = TemplateAnalysisGenerator
            .generate(&a, &b, &report, MatchType::Romantic)
            .await
            .unwrap();

        assert!(analysis.dynamics.contains("Ana (Leo)"));
        assert!(analysis.dynamics.contains("Ben (Sagittarius)"));
        assert_eq!(analysis.highlights, report.correlation.correlation_tags);
    }

    #[tokio::test]
    async fn test_http_analysis_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analysis")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"highlights":["warm"],"challenges":[],"dynamics":"easy","tone":"light"}"#)
            .create_async()
            .await;

        let generator = HttpAnalysisGenerator::new(
            format!("{}/analysis", server.url()),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let a = create_test_snapshot("Ana", 1990, 8, 5);
        let b = create_test_snapshot("Ben", 1991, 12, 1);
        let report = Matcher::with_default_weights().evaluate(&a, &b);

        let analysis = generator
            .generate(&a, &b, &report, MatchType::Friendship)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(analysis.highlights, vec!["warm".to_string()]);
        assert_eq!(analysis.dynamics, "easy");
        assert_eq!(analysis.extra.get("tone"), Some(&serde_json::json!("light")));
    }

    #[tokio::test]
    async fn test_http_analysis_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analysis")
            .with_status(401)
            .create_async()
            .await;

        let generator = HttpAnalysisGenerator::new(
            format!("{}/analysis", server.url()),
            "wrong".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let a = create_test_snapshot("Ana", 1990, 8, 5);
        let report = Matcher::with_default_weights().evaluate(&a, &a);

        let result = generator.generate(&a, &a, &report, MatchType::Platonic).await;
        assert!(matches!(result, Err(AnalysisError::Unauthorized)));
    }
}
