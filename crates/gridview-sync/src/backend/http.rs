//! REST backend: `GET`/`PUT {base}/preferences/grid`.

use std::time::Duration;

use gridview_model::{GridPreference, SaveGridPreference};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode, Url};
use tracing::{debug, warn};

use super::PreferenceBackend;
use crate::config::HttpConfig;
use crate::error::{Result, SyncError};

/// Path of the preference endpoint relative to the API root.
const ENDPOINT_PATH: &str = "preferences/grid";

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("gridview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpPreferenceBackend {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpPreferenceBackend {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let endpoint = endpoint_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT_VALUE);
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            token: config.token.clone().filter(|token| !token.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl PreferenceBackend for HttpPreferenceBackend {
    async fn fetch(&self, resource: &str) -> Result<Option<GridPreference>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("resource", resource);
        debug!(resource, %url, "fetching grid preference");

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|source| SyncError::Request {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            debug!(resource, %status, "no stored grid preference");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|source| SyncError::Request {
            resource: resource.to_string(),
            source,
        })?;
        match GridPreference::from_json_str(&body) {
            Ok(document) => Ok(document),
            Err(error) => {
                warn!(resource, %error, "malformed grid preference ignored");
                Ok(None)
            }
        }
    }

    async fn save(&self, document: &SaveGridPreference) -> Result<()> {
        let resource = document.resource.as_str();
        debug!(resource, url = %self.endpoint, "writing grid preference");

        let response = self
            .authorized(self.client.put(self.endpoint.clone()))
            .json(document)
            .send()
            .await
            .map_err(|source| SyncError::Request {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Resolve the preference endpoint against an API root, with or without a
/// trailing slash.
fn endpoint_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let base = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&base)
        .and_then(|base| base.join(ENDPOINT_PATH))
        .map_err(|e| SyncError::InvalidEndpoint(format!("{base_url}: {e}")))
}
