use bytes::Bytes;
use checker_core::{
    ActivityEvent, CreateSubmissionResponse, DashboardStats, NarrativeCounts, Payload,
    ResultPayload, SubmissionId, Threat, TopClaim, TransportError, TransportKind,
};
use checker_logging::checker_debug;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::ClientSettings;

/// Submission endpoints used by the lifecycle client.
#[async_trait::async_trait]
pub trait CheckApi: Send + Sync {
    /// `POST /check` with exactly one of `file`, `url` or `text`.
    async fn create_submission(&self, payload: &Payload) -> Result<SubmissionId, TransportError>;

    /// `GET /result/{id}`.
    async fn fetch_result(&self, id: &SubmissionId) -> Result<ResultPayload, TransportError>;
}

#[async_trait::async_trait]
pub trait ReportApi: Send + Sync {
    /// `GET /report/{id}`, refusing bodies larger than `max_bytes`.
    async fn fetch_report(&self, id: &SubmissionId, max_bytes: u64)
        -> Result<Bytes, TransportError>;
}

/// Read-only dashboard endpoints.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, TransportError>;
    async fn threats(&self) -> Result<Vec<Threat>, TransportError>;
    async fn top_claims(&self) -> Result<Vec<TopClaim>, TransportError>;
    async fn narratives(&self) -> Result<NarrativeCounts, TransportError>;
    async fn recent_events(&self, count: usize) -> Result<Vec<ActivityEvent>, TransportError>;
}

/// HTTP implementation of every backend API, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| TransportError::new(TransportKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::new(
                TransportKind::InvalidUrl,
                format!("{base_url} cannot be used as an API base"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(TransportKind::Network, err.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::new(TransportKind::InvalidUrl, "base url has no path segments")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        checker_debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

fn multipart_form(payload: &Payload) -> Result<Form, TransportError> {
    let field = payload.kind().field_name();
    let form = match payload {
        Payload::Text(text) => Form::new().text(field, text.clone()),
        Payload::Url(url) => Form::new().text(field, url.clone()),
        Payload::File(file) => {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|err| {
                    TransportError::new(TransportKind::InvalidRequest, err.to_string())
                })?;
            Form::new().part(field, part)
        }
    };
    Ok(form)
}

#[async_trait::async_trait]
impl CheckApi for ReqwestApi {
    async fn create_submission(&self, payload: &Payload) -> Result<SubmissionId, TransportError> {
        let url = self.endpoint(&["check"])?;
        checker_debug!("POST {} field={}", url, payload.kind());
        let form = multipart_form(payload)?;
        let response = self.send(self.client.post(url).multipart(form)).await?;
        let body: CreateSubmissionResponse =
            response.json().await.map_err(map_reqwest_error)?;
        Ok(body.submission_id)
    }

    async fn fetch_result(&self, id: &SubmissionId) -> Result<ResultPayload, TransportError> {
        let url = self.endpoint(&["result", id.as_str()])?;
        self.get_json(url).await
    }
}

#[async_trait::async_trait]
impl ReportApi for ReqwestApi {
    async fn fetch_report(
        &self,
        id: &SubmissionId,
        max_bytes: u64,
    ) -> Result<Bytes, TransportError> {
        let url = self.endpoint(&["report", id.as_str()])?;
        checker_debug!("GET {} (report)", url);
        let response = self.send(self.client.get(url)).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(bytes))
    }
}

#[async_trait::async_trait]
impl DashboardApi for ReqwestApi {
    async fn stats(&self) -> Result<DashboardStats, TransportError> {
        self.get_json(self.endpoint(&["dashboard", "stats"])?).await
    }

    async fn threats(&self) -> Result<Vec<Threat>, TransportError> {
        self.get_json(self.endpoint(&["dashboard", "threats"])?).await
    }

    async fn top_claims(&self) -> Result<Vec<TopClaim>, TransportError> {
        self.get_json(self.endpoint(&["dashboard", "top-claims"])?).await
    }

    async fn narratives(&self) -> Result<NarrativeCounts, TransportError> {
        self.get_json(self.endpoint(&["dashboard", "narratives"])?).await
    }

    async fn recent_events(&self, count: usize) -> Result<Vec<ActivityEvent>, TransportError> {
        let mut url = self.endpoint(&["dashboard", "recent-events"])?;
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        self.get_json(url).await
    }
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> TransportError {
    TransportError::new(
        TransportKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(TransportKind::Decode, err.to_string());
    }
    if let Some(status) = err.status() {
        return TransportError::http_status(status.as_u16());
    }
    TransportError::new(TransportKind::Network, err.to_string())
}
