//! Upload API client over HTTP.
//!
//! Member API calls are form-encoded POSTs authenticated with the session
//! cookie; fragments go to the media cloud as raw octet streams.

use std::time::Duration;

use mediaup_protocol::constants::{ORIGIN, REFERER, USER_AGENT};
use mediaup_protocol::{
    ApiResult, CommitRequest, FinishRequest, FragmentQuery, FragmentReceipt, NegotiateRequest,
    NegotiateResponse,
};
use mediaup_transfer::{Fragment, RetryHints, UploadSession};
use reqwest::header::{self, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ApiFuture, UploadApi};
use crate::config::{Endpoints, UploaderConfig};
use crate::error::{FinalizeStage, UploadError};
use crate::types::{FragmentAck, Negotiated};

const ACCEPT_JSON: &str = "application/json, text/plain, */*";
const OCTET_STREAM: &str = "application/octet-stream";

/// Errors building the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credentials cannot be sent as a header")]
    InvalidCredentials,
}

/// Failure of a single request, before it is classified per operation.
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// [`UploadApi`] implementation talking to the real service.
pub struct HttpUploadApi {
    http: reqwest::Client,
    endpoints: Endpoints,
    cookie: HeaderValue,
}

impl HttpUploadApi {
    /// Creates a client from the uploader configuration.
    pub fn new(config: &UploaderConfig) -> Result<Self, ClientError> {
        let mut cookie = HeaderValue::from_str(&config.credentials.cookie())
            .map_err(|_| ClientError::InvalidCredentials)?;
        cookie.set_sensitive(true);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
            cookie,
        })
    }

    /// Performs an authenticated member API call and decodes the JSON reply.
    async fn member_post<F, T>(&self, url: &str, form: &F) -> Result<T, RequestError>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(endpoint = url, "member API request");
        let resp = self
            .http
            .post(url)
            .header(header::COOKIE, self.cookie.clone())
            .header(header::ACCEPT, ACCEPT_JSON)
            .header(header::ORIGIN, ORIGIN)
            .header(header::REFERER, REFERER)
            .header(header::USER_AGENT, USER_AGENT)
            .form(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn finalize_step<F>(
        &self,
        stage: FinalizeStage,
        url: &str,
        form: &F,
    ) -> Result<(), UploadError>
    where
        F: Serialize + ?Sized,
    {
        let finalize_err = |reason: String| UploadError::Finalize { stage, reason };

        let result: ApiResult = self
            .member_post(url, form)
            .await
            .map_err(|e| finalize_err(e.to_string()))?;
        if !result.is_success() {
            return Err(finalize_err(result.reason()));
        }
        Ok(())
    }

    async fn negotiate_impl(&self, file_name: &str, file_size: u64) -> Result<Negotiated, UploadError> {
        let req = NegotiateRequest::new(file_name, file_size);
        let resp: NegotiateResponse = self
            .member_post(&self.endpoints.negotiate, &req)
            .await
            .map_err(|e| UploadError::Negotiation(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UploadError::Negotiation(status.reason()));
        }

        debug!(host = %resp.host, task_id = %resp.task_id, "upload granted");
        let cfg = &resp.upload_config;
        Ok(Negotiated {
            fragment_size: usize::try_from(cfg.part_size).unwrap_or(0),
            parallelism: usize::try_from(cfg.parallel).unwrap_or(0),
            upload_token: resp.token,
            task_id: resp.task_id,
            hints: RetryHints {
                retry_count: u32::try_from(cfg.retry_count).unwrap_or(0),
                retry_window: Duration::from_secs(
                    u64::try_from(cfg.retry_duration_seconds).unwrap_or(0),
                ),
            },
        })
    }

    async fn upload_fragment_impl(
        &self,
        session: &UploadSession,
        fragment: &Fragment,
    ) -> Result<FragmentAck, UploadError> {
        let transient = |e: RequestError| UploadError::Transient {
            index: fragment.index,
            reason: e.to_string(),
        };

        // The service numbers fragments from 1.
        let query = FragmentQuery {
            fragment_id: fragment.index + 1,
            upload_token: session.upload_token.clone(),
        };
        let resp = self
            .http
            .post(&self.endpoints.fragment)
            .query(&query)
            .header(header::CONTENT_TYPE, OCTET_STREAM)
            .header(header::CONTENT_RANGE, fragment.content_range(session.file_size))
            .body(fragment.data.clone())
            .send()
            .await
            .map_err(|e| transient(e.into()))?;

        let receipt: FragmentReceipt = decode(resp).await.map_err(transient)?;
        if !receipt.acknowledges(fragment.len()) {
            return Err(transient(RequestError::Rejected(format!(
                "result {} stored {} of {} bytes",
                receipt.result,
                receipt.size,
                fragment.len()
            ))));
        }
        debug!(
            index = fragment.index,
            size = receipt.size,
            checksum = %receipt.checksum,
            "fragment stored"
        );

        Ok(FragmentAck {
            index: fragment.index,
            size: receipt.size,
        })
    }
}

/// Checks the status and decodes a JSON body.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RequestError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(RequestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    debug!(body = %body, "response");
    Ok(serde_json::from_str(&body)?)
}

impl UploadApi for HttpUploadApi {
    fn negotiate<'a>(&'a self, file_name: &'a str, file_size: u64) -> ApiFuture<'a, Negotiated> {
        Box::pin(self.negotiate_impl(file_name, file_size))
    }

    fn upload_fragment<'a>(
        &'a self,
        session: &'a UploadSession,
        fragment: &'a Fragment,
    ) -> ApiFuture<'a, FragmentAck> {
        Box::pin(self.upload_fragment_impl(session, fragment))
    }

    fn signal_ready<'a>(&'a self, session: &'a UploadSession) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let req = FinishRequest {
                task_id: session.task_id.clone(),
            };
            self.finalize_step(FinalizeStage::SignalReady, &self.endpoints.finish, &req)
                .await
        })
    }

    fn commit<'a>(&'a self, session: &'a UploadSession, file_name: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let req = CommitRequest::new(session.task_id.clone(), file_name);
            self.finalize_step(FinalizeStage::Commit, &self.endpoints.commit, &req)
                .await
        })
    }
}
