// JSON-over-HTTP plumbing shared by the upstream and network clients.
//
// Both APIs speak plain JSON REST with a token header, so URL joining,
// response decoding, and error-body parsing live here once.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;

// ── Error response shapes ───────────────────────────────────────────

/// Load-balancing API errors: `{"faultstring": "...", "debuginfo": ...}`.
#[derive(serde::Deserialize)]
struct FaultResponse {
    faultstring: String,
}

/// Network API errors: `{"NeutronError": {"type": "...", "message": "..."}}`.
#[derive(serde::Deserialize)]
struct NetworkErrorResponse {
    #[serde(rename = "NeutronError")]
    inner: NetworkErrorInner,
}

#[derive(serde::Deserialize)]
struct NetworkErrorInner {
    message: String,
}

// ── Client ──────────────────────────────────────────────────────────

pub(crate) struct JsonClient {
    http: reqwest::Client,
    base_url: Url,
}

impl JsonClient {
    /// Normalizes `base_url` to end with a slash so relative joins append.
    pub(crate) fn new(http: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::InvalidToken;
    }

    let raw = resp.text().await.unwrap_or_default();

    let message = if let Ok(fault) = serde_json::from_str::<FaultResponse>(&raw) {
        fault.faultstring
    } else if let Ok(err) = serde_json::from_str::<NetworkErrorResponse>(&raw) {
        err.inner.message
    } else if raw.is_empty() {
        status.to_string()
    } else {
        raw
    };

    Error::Api {
        status: status.as_u16(),
        message,
    }
}
