//! Judge API client (frontend → judge backend).
//!
//! Every request carries the caller's bearer token.  The client never
//! retries: a failed submit is reported and the user decides whether to
//! resubmit, since the endpoint has no idempotency key and a retry could
//! create a duplicate submission.

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::sse::SseTransport;
use super::ws::WebSocketTransport;
use super::{ClientError, parse_response};
use crate::auth::AuthToken;
use crate::objects::{
    ContestId, Language, ProblemId, RankingEntry, SourceCode, SubmissionHandle, SubmissionRecord,
    SubmitRequest, UserId,
};
use crate::transport::endpoint;

/// Typed HTTP client for the judge backend.
#[derive(Debug, Clone)]
pub struct JudgeClient {
    http: Client,
    base_url: Url,
}

impl JudgeClient {
    /// Create a new `JudgeClient`.
    ///
    /// * `base_url` – root URL of the judge backend (e.g. `https://oj.example.com`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Server-sent-events transport sharing this client's connection pool.
    pub fn sse_transport(&self) -> SseTransport {
        SseTransport::new(self.base_url.clone()).with_http_client(self.http.clone())
    }

    /// WebSocket transport against the same backend.
    pub fn websocket_transport(&self) -> WebSocketTransport {
        WebSocketTransport::new(self.base_url.clone())
    }

    /// `POST /api/submit/{user_id}/{problem_id}` – dispatch a submission.
    ///
    /// Returns as soon as the judge has accepted the request; the verdict is
    /// delivered later on the submission event stream.
    pub async fn submit(
        &self,
        problem_id: &ProblemId,
        user_id: &UserId,
        token: &AuthToken,
        source: &SourceCode,
        language: &Language,
    ) -> Result<SubmissionHandle, ClientError> {
        let url = endpoint(
            &self.base_url,
            &format!(
                "api/submit/{}/{}",
            user_id.path_segment(),
                problem_id.path_segment()
            ),
        )?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose())
            .json(&SubmitRequest::new(source, language))
            .send()
            .await?;

        let record: SubmissionRecord = parse_response(resp).await?;
        info!(
            submission_id = %record.id,
            %problem_id,
            %user_id,
            %language,
            "Submission dispatched"
        );

        Ok(SubmissionHandle::from_record(
            record,
            problem_id.clone(),
            user_id.clone(),
            language.clone(),
            source.clone(),
        ))
    }

    /// `GET /api/leaderboard/{contest_id}` – fetch the current ranking.
    pub async fn leaderboard(
        &self,
        contest_id: &ContestId,
        token: &AuthToken,
    ) -> Result<Vec<RankingEntry>, ClientError> {
        let url = endpoint(
            &self.base_url,
            &format!("api/leaderboard/{}", contest_id.path_segment()),
        )?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await?;

        // The backend answers `null` for a contest without submissions.
        let entries: Option<Vec<RankingEntry>> = parse_response(resp).await?;
        let entries = entries.unwrap_or_default();
        debug!(%contest_id, rows = entries.len(), "Fetched leaderboard");
        Ok(entries)
    }
}
