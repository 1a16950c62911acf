//! Survey definitions and submitted responses
//!
//! Definitions are loaded once at startup from a TOML file and never
//! mutated. Submitted responses are the only shared mutable state in the
//! process, held behind an async `RwLock`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read survey file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse survey file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown survey '{0}'")]
    UnknownSurvey(String),
    #[error("missing required answer for question '{0}'")]
    MissingAnswer(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Survey {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveyResponse {
    pub survey_id: String,
    pub answers: HashMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Default)]
struct SurveyFile {
    #[serde(default)]
    surveys: Vec<Survey>,
}

/// In-memory survey store.
#[derive(Debug)]
pub struct SurveyStore {
    surveys: Vec<Survey>,
    responses: RwLock<Vec<SurveyResponse>>,
}

impl SurveyStore {
    /// Load definitions from a TOML file.
    pub fn load(path: &str) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })?;
        let file: SurveyFile = toml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.to_string(),
            source,
        })?;
        Ok(Self::from_surveys(file.surveys))
    }

    #[must_use]
    pub fn from_surveys(surveys: Vec<Survey>) -> Self {
        Self {
            surveys,
            responses: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn all(&self) -> &[Survey] {
        &self.surveys
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Survey> {
        self.surveys.iter().find(|s| s.id == id)
    }

    /// Validate answers against the survey definition and store the
    /// response. Every required question must have a non-empty answer.
    pub async fn submit(
        &self,
        survey_id: &str,
        answers: HashMap<String, String>,
    ) -> Result<SurveyResponse, SubmitError> {
        let survey = self
            .get(survey_id)
            .ok_or_else(|| SubmitError::UnknownSurvey(survey_id.to_string()))?;

        for question in &survey.questions {
            if question.required
                && answers
                    .get(&question.id)
                    .is_none_or(|a| a.trim().is_empty())
            {
                return Err(SubmitError::MissingAnswer(question.id.clone()));
            }
        }

        let response = SurveyResponse {
            survey_id: survey_id.to_string(),
            answers,
            submitted_at: Utc::now(),
        };
        self.responses.write().await.push(response.clone());
        Ok(response)
    }

    pub async fn response_count(&self, survey_id: &str) -> usize {
        self.responses
            .read()
            .await
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .count()
    }
}
