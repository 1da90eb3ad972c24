//! Authenticated transport for the Disk REST API
//!
//! Every endpoint funnels through [`DiskClient::dispatch`], which owns header
//! injection, body encoding and the classification of non-2xx responses.

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, Result};
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// OAuth authorize endpoint for the implicit-grant flow
const AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";

/// Query string parameters.
///
/// Setting a key twice keeps the last value. Keys are encoded in sorted
/// order, so the same parameters always produce the same URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    /// Set the key only when a value is present
    pub fn set_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Set `key=true` only when the flag is on
    pub fn set_flag(self, key: impl Into<String>, flag: bool) -> Self {
        if flag {
            self.set(key, true)
        } else {
            self
        }
    }

    /// Merge caller-supplied extras; existing keys are overwritten
    pub fn extend<K, V>(mut self, extra: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in extra {
            self.0.insert(key.into(), value.to_string());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A single API call described as data.
///
/// Built per call and consumed by [`DiskClient::dispatch`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: QueryParams,
    body: Option<Vec<u8>>,
    authorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            authorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body).map_err(Error::Encode)?);
        Ok(self)
    }

    /// Send without the owner's token (public-resource endpoints)
    pub fn anonymous(mut self) -> Self {
        self.authorized = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Client for the Disk REST API.
///
/// Cheap to clone: clones share the underlying connection pool. Holds no
/// mutable state, so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct DiskClient {
    token: String,
    http_client: Client,
    base_url: String,
}

impl fmt::Debug for DiskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DiskClient {
    /// Create a client against the public API with default settings
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_config(token, &ClientConfig::default())
    }

    /// Create a client with explicit settings
    pub fn with_config(token: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidInput(format!(
                "base URL must start with http:// or https:// (got '{}')",
                config.base_url
            )));
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for this client");
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            token: token.into(),
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request and return the raw body of a 2xx response.
    ///
    /// Decoding is left to the caller. Non-2xx answers become
    /// [`Error::Api`] when the body is a structured error with a message,
    /// and [`Error::UnexpectedStatus`] otherwise.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<Bytes> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, query = ?request.query, "Dispatching API request");

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query.0);
        }
        if request.authorized {
            builder = self.authorize(builder);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(status = status.as_u16(), bytes = body.len(), "API response received");

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_failure(status.as_u16(), &body))
        }
    }

    /// Dispatch and decode the JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.dispatch(request).await?;
        serde_json::from_slice(&body).map_err(Error::Decode)
    }

    /// Attach the owner's token
    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("OAuth {}", self.token))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }
}

/// Turn a non-2xx response into the matching error variant
fn classify_failure(status: u16, body: &[u8]) -> Error {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(mut api_error) if !api_error.message.is_empty() => {
            api_error.status = status;
            Error::Api(api_error)
        }
        _ => Error::UnexpectedStatus {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// URL a user opens to grant a token to the application `client_id`
pub fn authorization_url(client_id: &str) -> String {
    // The base is a constant, well-formed URL
    match Url::parse_with_params(
        AUTHORIZE_URL,
        &[("response_type", "token"), ("client_id", client_id)],
    ) {
        Ok(url) => url.into(),
        Err(_) => AUTHORIZE_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url() {
        let url = authorization_url("test-client-id");
        assert!(url.starts_with("https://oauth.yandex.ru/authorize?"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("client_id=test-client-id"));
    }

    #[test]
    fn test_authorization_url_encodes_id() {
        let url = authorization_url("a b&c");
        assert!(url.contains("client_id=a+b%26c"));
    }

    #[test]
    fn test_client_creation() {
        let client = DiskClient::new("test-token").unwrap();
        assert_eq!(client.token, "test-token");
        assert_eq!(client.base_url(), "https://cloud-api.yandex.net/v1/disk");
    }

    #[test]
    fn test_client_debug_hides_token() {
        let client = DiskClient::new("secret-token").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let config = ClientConfig::default().with_base_url("http://localhost:8080/v1/disk/");
        let client = DiskClient::with_config("t", &config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1/disk");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ClientConfig::default().with_base_url("cloud-api.yandex.net");
        assert!(matches!(
            DiskClient::with_config("t", &config),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_query_params_last_write_wins() {
        let query = QueryParams::new()
            .set("path", "/a")
            .set("limit", 10)
            .set("path", "/b")
            .set_opt("name", None::<&str>)
            .set_flag("overwrite", false)
            .set_flag("permanently", true);

        assert_eq!(query.get("path"), Some("/b"));
        assert_eq!(query.get("limit"), Some("10"));
        assert_eq!(query.get("name"), None);
        assert_eq!(query.get("overwrite"), None);
        assert_eq!(query.get("permanently"), Some("true"));

        let keys: Vec<_> = query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["limit", "path", "permanently"]);
    }

    #[test]
    fn test_query_params_extend() {
        let query = QueryParams::new()
            .set("path", "/a")
            .extend([("fields", "name"), ("path", "/override")]);
        assert_eq!(query.get("fields"), Some("name"));
        assert_eq!(query.get("path"), Some("/override"));
    }

    #[test]
    fn test_api_request_builder() {
        let request = ApiRequest::patch("/resources")
            .query(QueryParams::new().set("path", "/x"))
            .json(&serde_json::json!({"custom_properties": {"a": 1}}))
            .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.path(), "/resources");
        assert_eq!(request.query_params().get("path"), Some("/x"));
        assert!(request.has_body());
        assert!(request.authorized);
        assert!(!request.anonymous().authorized);
    }

    #[test]
    fn test_classify_structured_error() {
        let err = classify_failure(
            404,
            br#"{"message":"Not found","description":"Resource not found","error":"DiskNotFoundError"}"#,
        );
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 404);
                assert_eq!(api.to_string(), "Resource not found");
                assert_eq!(api.error, "DiskNotFoundError");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_empty_message_is_unstructured() {
        let body = br#"{"message":"","description":"only description","error":"X"}"#;
        match classify_failure(400, body) {
            Error::UnexpectedStatus { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("only description"));
            }
            other => panic!("Expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_non_json() {
        match classify_failure(502, b"Bad Gateway") {
            Error::UnexpectedStatus { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("Expected UnexpectedStatus, got {other:?}"),
        }
    }
}
