//! Remote grading: the wire contract and the HTTP client that speaks it.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use exam_core::flatten::FlattenedItem;
use exam_core::model::{ChoiceLetter, ExamContext, ExamId, QuestionId, SessionResult, UserId};

use crate::error::GradingError;

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

/// One submitted answer in the grading request.
///
/// The marked option is encoded the way the backend stores it: subpart
/// answers keep their letter, whole-question answers are converted to the
/// digit `"1"`–`"4"`. `subQuestionNumber` is an explicit `null` for whole
/// questions, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingAnswer {
    question_id: QuestionId,
    sub_question_number: Option<u32>,
    marked_option: String,
}

impl GradingAnswer {
    /// Encodes a selection on one item into its wire form.
    #[must_use]
    pub fn from_selection(item: &FlattenedItem, letter: ChoiceLetter) -> Self {
        let marked_option = if item.is_subpart() {
            letter.as_str().to_owned()
        } else {
            letter.wire_digit().to_owned()
        };

        Self {
            question_id: item.question_id(),
            sub_question_number: item.subpart_number(),
            marked_option,
        }
    }

    // Accessors
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn sub_question_number(&self) -> Option<u32> {
        self.sub_question_number
    }

    #[must_use]
    pub fn marked_option(&self) -> &str {
        &self.marked_option
    }
}

/// The full grading submission: attempt identity plus every answered item.
///
/// Unanswered items are absent from the list; the backend grades them as
/// omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
    exam_id: ExamId,
    user_id: UserId,
    year: u16,
    answers: Vec<GradingAnswer>,
}

impl GradingRequest {
    #[must_use]
    pub fn new(context: ExamContext, answers: Vec<GradingAnswer>) -> Self {
        Self {
            exam_id: context.exam_id(),
            user_id: context.user_id(),
            year: context.year(),
            answers,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[GradingAnswer] {
        &self.answers
    }
}

//
// ─── SERVICE TRAIT ─────────────────────────────────────────────────────────────
//

/// The authority that scores a finished attempt.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Submits the answers and returns the authoritative result.
    ///
    /// # Errors
    ///
    /// Returns `GradingError` when the service is unconfigured, the request
    /// fails in transit, or the backend answers with a non-success status.
    async fn grade(&self, request: &GradingRequest) -> Result<SessionResult, GradingError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GradingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl GradingConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_GRADER_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("EXAM_GRADER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

#[derive(Clone)]
pub struct HttpGradingClient {
    client: Client,
    config: Option<GradingConfig>,
}

impl HttpGradingClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GradingConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GradingConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl GradingService for HttpGradingClient {
    async fn grade(&self, request: &GradingRequest) -> Result<SessionResult, GradingError> {
        let config = self.config.as_ref().ok_or(GradingError::Disabled)?;

        let url = format!("{}/grade", config.base_url.trim_end_matches('/'));
        debug!(answers = request.answers().len(), "submitting attempt for grading");

        let mut builder = self.client.post(url).json(request);
        if let Some(api_key) = &config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(GradingError::HttpStatus(response.status()));
        }

        let result: SessionResult = response.json().await?;
        debug!(
            global_score = result.global_score(),
            blocks = result.results().len(),
            "grading result received"
        );
        Ok(result)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
