use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use quiz_core::model::{LessonId, QuestionId, QuizQuestion, QuizType};
use quiz_core::session::SubmissionPayload;
use quiz_core::QuizResults;

use crate::backend::{BackendError, QuizBackend};
use crate::mapping::{question_from_dto, results_from_response, submit_request};
use crate::wire::{ErrorBody, FavoriteResponse, QuestionDto, SubmitResponse};

/// CSRF header the server checks on state-changing requests.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Default request timeout; expiry surfaces as a transport failure.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub timeout: Duration,
}

impl HttpConfig {
    /// Read configuration from the environment.
    ///
    /// `QUIZ_API_BASE_URL` overrides the server address;
    /// `QUIZ_API_CSRF_TOKEN` carries the token the page metadata would
    /// provide. A missing token is tolerated and warned about at request
    /// time, matching the browser client.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("QUIZ_API_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".into());
        let csrf_token = env::var("QUIZ_API_CSRF_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self {
            base_url,
            csrf_token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `QuizBackend` over the server's HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpConfig,
}

impl HttpBackend {
    /// Build a backend with a dedicated client honoring the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the client cannot be
    /// constructed.
    pub fn new(config: HttpConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.config.csrf_token {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => {
                tracing::warn!("no CSRF token configured; the server may reject this request");
                builder
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::Malformed(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// Fold a non-2xx response into a status error, salvaging the JSON
/// `{error}` body when the server sent one.
async fn status_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error);
    BackendError::Status { status, message }
}

fn lessons_param(lessons: &BTreeSet<LessonId>) -> String {
    lessons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl QuizBackend for HttpBackend {
    async fn fetch_questions(
        &self,
        lessons: &BTreeSet<LessonId>,
        count: u32,
        quiz_type: QuizType,
    ) -> Result<Vec<QuizQuestion>, BackendError> {
        let url = self.endpoint("/api/quiz");
        tracing::debug!(%url, count, quiz_type = %quiz_type, "fetching quiz questions");

        let response = self
            .client
            .get(url)
            .query(&[
                ("lessons", lessons_param(lessons)),
                ("count", count.to_string()),
                ("type", quiz_type.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let dtos: Vec<QuestionDto> = response.json().await.map_err(transport_error)?;
        dtos.into_iter()
            .map(|dto| question_from_dto(dto).map_err(BackendError::from))
            .collect()
    }

    async fn submit_answers(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<QuizResults, BackendError> {
        let url = self.endpoint("/api/submit_quiz");
        tracing::debug!(%url, answers = payload.answers.len(), "submitting quiz answers");

        let response = self
            .post(url)
            .json(&submit_request(payload))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: SubmitResponse = response.json().await.map_err(transport_error)?;
        Ok(results_from_response(body))
    }

    async fn toggle_favorite(&self, id: QuestionId) -> Result<bool, BackendError> {
        let url = self.endpoint(&format!("/api/vocabulary/{id}/toggle_favorite"));
        tracing::debug!(%url, "toggling favorite");

        let response = self.post(url).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: FavoriteResponse = response.json().await.map_err(transport_error)?;
        if !body.success {
            return Err(BackendError::Rejected(
                body.error
                    .unwrap_or_else(|| "favorite toggle refused".to_string()),
            ));
        }
        body.is_favorite
            .ok_or_else(|| BackendError::Malformed("favorite state missing from response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lessons_param_joins_sorted_ids() {
        let lessons: BTreeSet<_> = [LessonId::new(3), LessonId::new(1), LessonId::new(2)].into();
        assert_eq!(lessons_param(&lessons), "1,2,3");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let backend = HttpBackend::new(HttpConfig::new("http://localhost:5000/")).unwrap();
        assert_eq!(
            backend.endpoint("/api/quiz"),
            "http://localhost:5000/api/quiz"
        );
    }

    #[test]
    fn config_builder_sets_token_and_timeout() {
        let config = HttpConfig::new("http://example.test")
            .with_csrf_token("tok")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.csrf_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
