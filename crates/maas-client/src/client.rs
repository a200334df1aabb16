//! Signed HTTP transport and response envelope.
//!
//! [`ApiClient`] performs one signed call per method and hands back the raw
//! [`Envelope`]; decoding is left to the resource controllers, which know
//! the shape they expect.

use std::borrow::Cow;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{multipart, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{self, HeaderRefresher, REFRESH_INTERVAL};
use crate::config::{ClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::{MaasError, Result};
use crate::params::Params;

const ACCEPT_JSON: &str = "application/json; charset=utf-8";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const OCTET_STREAM: &str = "application/octet-stream";

/// Status code and raw body of one MAAS response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    status: u16,
    body: Vec<u8>,
}

impl Envelope {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Statuses whose body is decoded.
    #[must_use]
    pub fn is_acceptable(status: u16) -> bool {
        matches!(status, 200..=202)
    }

    /// Decode the body as `T`.
    ///
    /// `204 No Content` yields `Ok(None)`. Any status other than 200, 201,
    /// 202 and 204 is an [`MaasError::Api`] carrying the raw body text.
    ///
    /// # Errors
    /// Returns [`MaasError::Api`] for unacceptable statuses and
    /// [`MaasError::Decode`] for malformed JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if self.status == StatusCode::NO_CONTENT.as_u16() {
            return Ok(None);
        }
        if !Self::is_acceptable(self.status) {
            return Err(self.api_error());
        }
        serde_json::from_slice(&self.body).map(Some).map_err(|e| {
            warn!(error = %e, body = %self.body_text(), "Failed to parse response");
            MaasError::Decode(e)
        })
    }

    /// Decode into an existing value, leaving it untouched on `204`.
    /// A `None` target only checks the status.
    ///
    /// # Errors
    /// Same as [`Envelope::decode`].
    pub fn decode_into<T: DeserializeOwned>(&self, target: Option<&mut T>) -> Result<()> {
        match target {
            Some(target) => {
                if let Some(value) = self.decode::<T>()? {
                    *target = value;
                }
                Ok(())
            }
            None => self.ensure_success(),
        }
    }

    /// Check the status without decoding the body.
    ///
    /// # Errors
    /// Returns [`MaasError::Api`] for unacceptable statuses.
    pub fn ensure_success(&self) -> Result<()> {
        if self.status == StatusCode::NO_CONTENT.as_u16() || Self::is_acceptable(self.status) {
            Ok(())
        } else {
            Err(self.api_error())
        }
    }

    /// Decode a body that must be present.
    ///
    /// # Errors
    /// Same as [`Envelope::decode`], plus [`MaasError::InvalidState`] when
    /// the response was `204 No Content`.
    pub fn into_value<T: DeserializeOwned>(self) -> Result<T> {
        self.decode()?.ok_or_else(|| {
            MaasError::InvalidState("expected a response body, got 204 No Content".to_string())
        })
    }

    fn api_error(&self) -> MaasError {
        MaasError::Api {
            status: self.status,
            body: self.body_text().into_owned(),
        }
    }
}

/// Signed transport shared by every resource controller.
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP client.
    http: Client,
    /// `<endpoint>/api/2.0`.
    base_url: String,
    /// Raw API key; parsed on every request.
    api_key: String,
    /// Total timeout for ordinary calls. Uploads are only bounded by the
    /// connect timeout.
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `endpoint` (e.g. `http://maas:5240/MAAS`).
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client from a [`ClientConfig`].
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_timeout(
            &config.endpoint,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a client around an existing `reqwest` client. Its own timeout
    /// settings apply to every call.
    #[must_use]
    pub fn with_http_client(endpoint: &str, api_key: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            base_url: ClientConfig::base_url_for(endpoint),
            api_key: api_key.into(),
            request_timeout: None,
        }
    }

    /// `timeout` bounds connecting for every call, and the whole exchange for
    /// every call except multipart creates and raw uploads.
    fn with_timeout(endpoint: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            request_timeout: Some(timeout),
            ..Self::with_http_client(endpoint, api_key, http)
        })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn bounded(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    fn sign(&self, request: RequestBuilder, method: &Method, url: &str, params: &Params) -> RequestBuilder {
        match auth::authorization_header(&self.api_key, method, url, params) {
            Some(header) => request.header(AUTHORIZATION, header),
            None => {
                warn!(url = %url, "API key is malformed, sending request unsigned");
                request
            }
        }
    }

    /// Signed GET with `params` as the query string.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn get(&self, path: &str, params: &Params) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, "GET request");

        let pairs: Vec<(&str, &str)> = params.pairs().collect();
        let request = self
            .http
            .get(&url)
            .query(&pairs)
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, FORM_URLENCODED);
        let request = self.sign(self.bounded(request), &Method::GET, &url, params);

        Self::dispatch(request).await
    }

    /// Signed POST with `params` as a url-encoded form body.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn post(&self, path: &str, params: &Params) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, op = ?params.get("op"), "POST request");

        let request = self
            .http
            .post(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .body(params.to_form());
        let request = self.sign(self.bounded(request), &Method::POST, &url, params);

        Self::dispatch(request).await
    }

    /// Signed multipart POST with one text field per parameter value.
    ///
    /// The header is kept fresh by a [`HeaderRefresher`] for the lifetime of
    /// the call, which may run far longer than the signature window. Not
    /// bounded by the request timeout.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn post_multipart(&self, path: &str, params: &Params) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, "POST multipart request");

        let form = params
            .pairs()
            .fold(multipart::Form::new(), |form, (key, value)| {
                form.text(key.to_string(), value.to_string())
            });

        let api_key = self.api_key.clone();
        let sign_url = url.clone();
        let sign_params = params.clone();
        let refresher = HeaderRefresher::spawn(REFRESH_INTERVAL, move || {
            auth::authorization_header(&api_key, &Method::POST, &sign_url, &sign_params)
        });

        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .multipart(form);
        match refresher.current().await {
            Some(header) => request = request.header(AUTHORIZATION, header),
            None => warn!(url = %url, "API key is malformed, sending request unsigned"),
        }

        let result = Self::dispatch(request).await;
        refresher.stop();
        result
    }

    /// Signed PUT of raw bytes with an explicit `Content-Length`. Not bounded
    /// by the request timeout.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn put(&self, path: &str, body: Vec<u8>) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, bytes = body.len(), "PUT request");

        let request = self
            .http
            .put(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, body.len())
            .body(body);
        let request = self.sign(request, &Method::PUT, &url, &Params::new());

        Self::dispatch(request).await
    }

    /// Signed PUT with `params` as a url-encoded form body.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn put_params(&self, path: &str, params: &Params) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, "PUT request");

        let request = self
            .http
            .put(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .body(params.to_form());
        let request = self.sign(self.bounded(request), &Method::PUT, &url, params);

        Self::dispatch(request).await
    }

    /// Signed DELETE; non-empty `params` travel as a url-encoded body.
    ///
    /// # Errors
    /// Returns [`MaasError::Http`] on transport failure.
    pub async fn delete(&self, path: &str, params: &Params) -> Result<Envelope> {
        let url = self.url(path);
        debug!(url = %url, "DELETE request");

        let mut request = self.http.delete(&url).header(ACCEPT, ACCEPT_JSON);
        if !params.is_empty() {
            request = request
                .header(CONTENT_TYPE, FORM_URLENCODED)
                .body(params.to_form());
        }
        let request = self.sign(self.bounded(request), &Method::DELETE, &url, params);

        Self::dispatch(request).await
    }

    /// Send the request and capture status and full body. No retries.
    async fn dispatch(request: RequestBuilder) -> Result<Envelope> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(Envelope::new(status, body.to_vec()))
    }
}
