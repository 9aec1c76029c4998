//! Shared HTTP plumbing for protocol clients.
//!
//! A [`Transport`] owns one `reqwest::Client` configured with the request
//! timeout from [`Config`]. It sends JSON requests, classifies every failure
//! into an [`ErrorKind`] and retries transient failures up to
//! [`Config::retries`] times. Adapters never retry on their own.

use reqwest::{
    RequestBuilder,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::{Config, Error, ErrorKind, Result};

/// Longest upstream text body echoed into an error message.
const MAX_MESSAGE_LEN: usize = 256;

/// How a client authenticates against its upstream.
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// No credentials.
    None,
    /// A raw key in a custom header, e.g. `x-api-key`.
    Header(&'static str, &'a str),
    /// `Authorization: Bearer <key>`.
    Bearer(&'a str),
}

/// JSON-over-HTTP transport with failure classification.
#[derive(Debug, Clone)]
pub struct Transport {
    http_client: reqwest::Client,
    retries: u32,
}

impl Transport {
    /// Creates a transport without credentials.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_auth(config, Auth::None)
    }

    /// Creates a transport that sends the given credentials with every request.
    pub fn with_auth(config: &Config, auth: Auth<'_>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        match auth {
            Auth::None => {}
            Auth::Header(name, key) => {
                headers.insert(HeaderName::from_static(name), sensitive(key)?);
            }
            Auth::Bearer(key) => {
                headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {key}"))?);
            }
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(|err| Error::from_reqwest("transport.build", &err))?;

        Ok(Self {
            http_client,
            retries: config.retries,
        })
    }

    /// GETs `url` and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, operation: &'static str, url: Url) -> Result<T> {
        self.execute(operation, || self.http_client.get(url.clone()))
            .await
    }

    /// POSTs `body` as JSON to `url` and decodes the JSON response.
    pub async fn post_json<B, T>(&self, operation: &'static str, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(operation, || self.http_client.post(url.clone()).json(body))
            .await
    }

    /// Performs a JSON-RPC 2.0 call and returns its `result`.
    ///
    /// An error object in the response is classified by its code.
    pub async fn rpc<P, T>(&self, operation: &'static str, url: Url, method: &str, params: P) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response: RpcResponse<T> = self.post_json(operation, url, &request).await?;
        match response {
            RpcResponse {
                error: Some(error), ..
            } => Err(Error::new(
                ErrorKind::from_rpc_code(error.code),
                operation,
                error.message,
            )),
            RpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            _ => Err(Error::malformed(
                operation,
                format!("{method}: response has neither result nor error"),
            )),
        }
    }

    async fn execute<T, F>(&self, operation: &'static str, request: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match send(operation, request()).await {
                Err(err) if err.kind().is_transient() && attempt < self.retries => {
                    attempt += 1;
                    log::debug!("{operation}: retry {attempt}/{} after {err}", self.retries);
                }
                result => return result,
            }
        }
    }
}

async fn send<T: DeserializeOwned>(operation: &'static str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|err| Error::from_reqwest(operation, &err))?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| Error::from_reqwest(operation, &err))?;

    if !status.is_success() {
        let message = upstream_message(&body).unwrap_or_else(|| status.to_string());
        return Err(Error::new(
            ErrorKind::from_status(status.as_u16()),
            operation,
            message,
        ));
    }

    serde_json::from_slice(&body).map_err(|err| Error::malformed(operation, err.to_string()))
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|err| Error::invalid_argument("transport.auth", err.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Extracts the upstream's own error message from a failed response body.
///
/// Looks at `error`, `message` and `msg` in that order; `error` may itself be an
/// object with a `message`. Falls back to the raw text, truncated.
pub(crate) fn upstream_message(body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        let found = ["error", "message", "msg"].iter().find_map(|key| {
            match value.get(key)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(obj) => obj
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned),
                _ => None,
            }
        });
        if found.is_some() {
            return found;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_MESSAGE_LEN).collect())
}

/// Appends path segments to `base`, keeping any path prefix it already has.
pub(crate) fn join(base: &Url, path: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::invalid_argument("transport.url", format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct RpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}
