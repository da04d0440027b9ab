//! HTTP client for BaSyx registry and repository endpoints.
//!
//! Identifiers and idShort paths are encoded per AAS Part 2 before they are
//! placed into request paths. Pagination cursors are opaque and passed back
//! exactly as the server returned them.

use super::encoding::{encode_id_base64url, encode_idshort_path};
use basyx_core::{IdShortPath, PagedResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct BasyxClientConfig {
    /// Base URL of the registry or repository (e.g., <http://localhost:8084/api/v3.0>)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Optional bearer token for authentication
    pub bearer_token: Option<String>,
}

impl Default for BasyxClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8084/api/v3.0".to_string(),
            timeout: Duration::from_secs(30),
            bearer_token: None,
        }
    }
}

/// HTTP client for BaSyx registry and repository operations.
pub struct BasyxClient {
    client: Client,
    config: BasyxClientConfig,
}

impl BasyxClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: BasyxClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch one shell descriptor from the registry.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors; an unknown id yields
    /// [`ClientError::ApiError`] with status 404.
    pub async fn get_shell_descriptor<T: DeserializeOwned>(
        &self,
        aas_id: &str,
    ) -> Result<T, ClientError> {
        let url = self.shell_descriptor_url(aas_id);
        tracing::debug!(aas_id, url, "GET shell descriptor");
        self.send_json(self.client.get(&url)).await
    }

    /// Fetch one page of shell descriptors.
    ///
    /// `limit = None` lets the server apply its default; `Some(0)` asks for
    /// everything.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn list_shell_descriptors<T: DeserializeOwned>(
        &self,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<T>, ClientError> {
        let url = format!("{}/shell-descriptors", self.config.base_url);
        tracing::debug!(url, ?limit, cursor, "GET shell descriptors page");

        let mut request = self.client.get(&url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let body: Value = self.send_json(request).await?;
        paged_from_body(body)
    }

    /// Fetch every shell descriptor by following cursors until the last page.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn list_all_shell_descriptors<T: DeserializeOwned>(
        &self,
        page_size: u32,
    ) -> Result<Vec<T>, ClientError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: PagedResult<T> = self
                .list_shell_descriptors(Some(page_size), cursor.as_deref())
                .await?;
            all.extend(page.result);
            match page.paging_metadata.cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(all)
    }

    /// Fetch a submodel element by idShort path.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn get_submodel_element(
        &self,
        submodel_id: &str,
        path: &IdShortPath,
    ) -> Result<Value, ClientError> {
        let url = self.submodel_element_url(submodel_id, path);
        tracing::debug!(submodel_id, %path, url, "GET submodel element");
        self.send_json(self.client.get(&url)).await
    }

    fn shell_descriptor_url(&self, aas_id: &str) -> String {
        format!(
            "{}/shell-descriptors/{}",
            self.config.base_url,
            encode_id_base64url(aas_id)
        )
    }

    fn submodel_element_url(&self, submodel_id: &str, path: &IdShortPath) -> String {
        format!(
            "{}/submodels/{}/submodel-elements/{}",
            self.config.base_url,
            encode_id_base64url(submodel_id),
            encode_idshort_path(path)
        )
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
    ) -> Result<T, ClientError> {
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Accept both the paged envelope and a bare array.
fn paged_from_body<T: DeserializeOwned>(body: Value) -> Result<PagedResult<T>, ClientError> {
    let body = if body.is_array() {
        serde_json::json!({ "result": body })
    } else {
        body
    };
    serde_json::from_value(body).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Errors that can occur with the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// API returned an error status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Whether the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::ApiError { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve `responses` in order, one per connection, and return the
    /// request heads that were received.
    async fn stub_server(responses: Vec<(u16, Value)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut heads = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();

                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                heads.push(String::from_utf8_lossy(&buf).into_owned());

                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            heads
        });

        (base_url, handle)
    }

    fn client(base_url: &str) -> BasyxClient {
        BasyxClient::new(BasyxClientConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(2),
            bearer_token: Some("secret".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn config_default() {
        let config = BasyxClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8084/api/v3.0");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn descriptor_url_encodes_identifier() {
        let client = client("http://registry:8080");
        assert_eq!(
            client.shell_descriptor_url("urn:basyx:shell:1"),
            format!(
                "http://registry:8080/shell-descriptors/{}",
                encode_id_base64url("urn:basyx:shell:1")
            )
        );
    }

    #[test]
    fn element_url_keeps_list_indices() {
        let client = client("http://repo:8081");
        let path = IdShortPath::parse("Ports[2].Speed").unwrap();
        let url = client.submodel_element_url("urn:sm:1", &path);
        assert!(url.ends_with("/submodel-elements/Ports[2].Speed"), "{url}");
    }

    #[test]
    fn paged_body_shapes() {
        let page: PagedResult<Value> = paged_from_body(serde_json::json!({
            "result": [{"id": "a"}],
            "paging_metadata": {"cursor": "a"}
        }))
        .unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.next_cursor(), Some("a"));

        let bare: PagedResult<Value> =
            paged_from_body(serde_json::json!([{"id": "a"}, {"id": "b"}])).unwrap();
        assert_eq!(bare.result.len(), 2);
        assert!(!bare.has_more());

        let err = paged_from_body::<Value>(serde_json::json!("nope")).unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[test]
    fn not_found_classification() {
        let err = ClientError::ApiError {
            status: 404,
            message: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!ClientError::Request("refused".into()).is_not_found());
    }

    #[tokio::test]
    async fn list_all_follows_cursors_until_last_page() {
        let (base_url, server) = stub_server(vec![
            (
                200,
                serde_json::json!({
                    "result": [{"id": "urn:a"}, {"id": "urn:b"}],
                    "paging_metadata": {"cursor": "urn:b"}
                }),
            ),
            (
                200,
                serde_json::json!({"result": [{"id": "urn:c"}], "paging_metadata": {}}),
            ),
        ])
        .await;
        let client = client(&base_url);
        assert_eq!(client.base_url(), base_url);

        let all: Vec<Value> = client.list_all_shell_descriptors(2).await.unwrap();
        let ids: Vec<&str> = all.iter().filter_map(|d| d["id"].as_str()).collect();
        assert_eq!(ids, vec!["urn:a", "urn:b", "urn:c"]);

        let heads = server.await.unwrap();
        assert_eq!(heads.len(), 2);
        assert!(heads[0].starts_with("GET /api/shell-descriptors?limit=2 "), "{}", heads[0]);
        assert!(
            heads[1].starts_with("GET /api/shell-descriptors?limit=2&cursor=urn%3Ab "),
            "{}",
            heads[1]
        );
        for head in &heads {
            assert!(head.to_ascii_lowercase().contains("authorization: bearer secret"), "{head}");
        }
    }

    #[tokio::test]
    async fn list_all_stops_when_cursor_repeats() {
        let page = serde_json::json!({
            "result": [{"id": "urn:a"}],
            "paging_metadata": {"cursor": "urn:a"}
        });
        let (base_url, server) = stub_server(vec![(200, page.clone()), (200, page)]).await;

        let all: Vec<Value> = client(&base_url).list_all_shell_descriptors(1).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_page_without_limit_sends_no_query() {
        let (base_url, server) =
            stub_server(vec![(200, serde_json::json!([{"id": "urn:a"}]))]).await;

        let page: PagedResult<Value> = client(&base_url)
            .list_shell_descriptors(None, None)
            .await
            .unwrap();
        assert_eq!(page.result.len(), 1);
        assert!(!page.has_more());

        let heads = server.await.unwrap();
        assert!(heads[0].starts_with("GET /api/shell-descriptors HTTP/1.1"), "{}", heads[0]);
    }

    #[tokio::test]
    async fn submodel_element_request() {
        let (base_url, server) = stub_server(vec![
            (200, serde_json::json!({"modelType": "Property", "idShort": "Speed", "value": "42"})),
            (404, serde_json::json!({"messages": [{"text": "not found"}]})),
        ])
        .await;
        let client = client(&base_url);
        let path = IdShortPath::parse("Ports[2].Speed").unwrap();

        let element = client.get_submodel_element("urn:sm:1", &path).await.unwrap();
        assert_eq!(element["value"], "42");

        let err = client.get_submodel_element("urn:sm:1", &path).await.unwrap_err();
        assert!(err.is_not_found(), "{err}");

        let heads = server.await.unwrap();
        let expected = format!(
            "GET /api/submodels/{}/submodel-elements/",
            encode_id_base64url("urn:sm:1")
        );
        assert!(heads[0].starts_with(&expected), "{}", heads[0]);
        assert!(heads[0].contains("Speed HTTP/1.1"), "{}", heads[0]);
    }

    #[test]
    fn unreachable_server_is_request_error() {
        let client = client("http://127.0.0.1:1");
        let result: Result<Value, _> =
            tokio_test::block_on(client.get_shell_descriptor("urn:basyx:shell:1"));
        assert!(matches!(result, Err(ClientError::Request(_))));
    }
}
