use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use tracing::debug;

use super::{AppraisalBackend, BackendError, RelayMethod, RelayRequest, RelayResponse};
use crate::config::BackendConfig;
use crate::session::SessionContext;
use crate::workflows::appraisal::domain::{FormStatus, PartLetter, RecordKey};

/// `reqwest`-backed client for the appraisal backend.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url.clone()));
        }

        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn part_url(&self, key: &RecordKey, tail: &str) -> Result<Url, BackendError> {
        self.record_url(key, [key.department.0.as_str(), key.user_id.0.as_str(), tail])
    }

    /// Record URLs are refused outright when a key segment would be dropped
    /// or collapsed by URL normalisation.
    fn record_url<'a>(
        &self,
        key: &RecordKey,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, BackendError> {
        key.validate()
            .map_err(|err| BackendError::InvalidUrl(err.to_string()))?;
        self.endpoint(segments)
    }

    fn authorized(&self, builder: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        builder.bearer_auth(session.token.as_str())
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        builder
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    async fn expect_success(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(BackendError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn read_json(response: Response) -> Result<Value, BackendError> {
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AppraisalBackend for HttpBackend {
    async fn fetch_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
    ) -> Result<Option<Value>, BackendError> {
        let url = self.part_url(key, part.as_str())?;
        let response = Self::send(self.authorized(self.client.get(url), session)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::read_json(Self::expect_success(response).await?).await?;
        Ok(match body {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn save_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
        body: Value,
    ) -> Result<(), BackendError> {
        let url = self.part_url(key, part.as_str())?;
        debug!(record = %key, %part, "posting part to backend");
        let response =
            Self::send(self.authorized(self.client.post(url).json(&body), session)).await?;
        Self::expect_success(response).await.map(|_| ())
    }

    async fn fetch_status(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<FormStatus, BackendError> {
        let url = self.part_url(key, "get-status")?;
        let response = Self::send(self.authorized(self.client.get(url), session)).await?;
        let body = Self::read_json(Self::expect_success(response).await?).await?;

        let raw = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Decode("status response has no 'status'".to_string()))?;
        raw.parse::<FormStatus>()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn save_interaction_marks(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        body: Value,
    ) -> Result<(), BackendError> {
        let url = self.record_url(
            key,
            [
                key.department.0.as_str(),
                "college_external_interaction_marks",
                key.user_id.0.as_str(),
            ],
        )?;
        let response =
            Self::send(self.authorized(self.client.post(url).json(&body), session)).await?;
        Self::expect_success(response).await.map(|_| ())
    }

    async fn mark_director_given(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<(), BackendError> {
        let url = self.part_url(key, "director-mark-given")?;
        let response = Self::send(self.authorized(self.client.post(url), session)).await?;
        Self::expect_success(response).await.map(|_| ())
    }

    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse, BackendError> {
        let url = self.endpoint(request.endpoint.path().iter().copied())?;
        let mut builder = match request.endpoint.method() {
            RelayMethod::Get => self.client.get(url),
            RelayMethod::Post => self.client.post(url),
            RelayMethod::Delete => self.client.delete(url),
        };
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = Self::send(builder).await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or_else(|_| {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "message": text })
            }
        });

        Ok(RelayResponse { status, body })
    }
}
