//! HTTP implementation of [`ImageTransport`] for the MedScan REST API.
//!
//! Endpoints (relative to the configured base URL):
//!
//! - `GET    /images/`       list (bare array or paginated `results` envelope)
//! - `POST   /images/`       multipart upload (`image`, `title`, `description`)
//! - `GET    /images/{id}/`  single record
//! - `DELETE /images/{id}/`  removal

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use medscan_core::error::{MedscanError, Result};
use medscan_core::image::{
    Image, ImageId, ImageTransport, ProgressCallback, UploadRequest, progress_percent,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;

/// Size of the body chunks progress is reported for.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Transport talking to the MedScan API over HTTP.
///
/// `P` is the payload type records are decoded into; it defaults to an
/// untyped `serde_json::Value`.
pub struct HttpImageTransport<P = Value> {
    client: Client,
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for HttpImageTransport<P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
            _payload: PhantomData,
        }
    }
}

impl<P> HttpImageTransport<P> {
    /// Creates a transport from a validated configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| MedscanError::config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            MedscanError::config(format!("Invalid base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MedscanError::config(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            timeout: config.timeout(),
            _payload: PhantomData,
        })
    }

    fn collection_url(&self) -> Url {
        self.endpoint(&["images"])
    }

    /// The id is percent-encoded as a single path segment.
    fn item_url(&self, id: &ImageId) -> Url {
        let id = id.to_string();
        self.endpoint(&["images", id.as_str()])
    }

    /// Appends `segments` to the base path, keeping the API's trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot-be-a-base URLs are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and turns error statuses into [`MedscanError::Rejected`].
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| MedscanError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        tracing::debug!(status = status.as_u16(), ?message, "MedScan API rejected request");
        Err(MedscanError::rejected(status.as_u16(), message))
    }
}

async fn read_json(response: Response) -> Result<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| MedscanError::invalid_payload(format!("Response is not valid JSON: {e}")))
}

#[async_trait]
impl<P> ImageTransport for HttpImageTransport<P>
where
    P: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Payload = P;

    async fn list(&self) -> Result<Vec<Image<P>>> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        let body = read_json(response).await?;
        parse_list(body)
    }

    async fn create(&self, upload: UploadRequest, on_progress: ProgressCallback) -> Result<Image<P>> {
        upload.validate()?;

        let total = upload.bytes.len() as u64;
        let content_type = upload.content_type();
        let UploadRequest {
            file_name,
            bytes,
            title,
            description,
        } = upload;

        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(progress_percent(sent, total));
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| MedscanError::invalid_upload(e.to_string()))?;
        let form = Form::new()
            .text("title", title)
            .text("description", description)
            .part("image", part);

        let response = self
            .send(self.client.post(self.collection_url()).multipart(form))
            .await?;
        Image::from_value(read_json(response).await?)
    }

    async fn get(&self, id: &ImageId) -> Result<Image<P>> {
        let response = self.send(self.client.get(self.item_url(id))).await?;
        Image::from_value(read_json(response).await?)
    }

    async fn remove(&self, id: &ImageId) -> Result<()> {
        self.send(self.client.delete(self.item_url(id))).await?;
        Ok(())
    }
}

/// Decodes a list response.
///
/// Accepts a bare JSON array or a paginated envelope, of which only the
/// `results` of the returned page are used.
pub fn parse_list<P: DeserializeOwned>(body: Value) -> Result<Vec<Image<P>>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(MedscanError::invalid_payload(
                    "list response has no results array",
                ));
            }
        },
        other => {
            return Err(MedscanError::invalid_payload(format!(
                "unexpected list response: {other}"
            )));
        }
    };

    items.into_iter().map(Image::from_value).collect()
}

/// Pulls a human-readable message out of an error body.
///
/// Looks at `message` first, then the framework's `detail` and the
/// service's own `error` field.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned response and hands back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });

        (format!("http://{addr}/api"), handle)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let body_len = buf.len() - (header_end + 4);

        if headers.contains("transfer-encoding: chunked") {
            return buf.ends_with(b"0\r\n\r\n");
        }
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body_len >= content_length
    }

    fn transport(base_url: &str, token: Option<&str>) -> HttpImageTransport {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
            timeout_secs: 5,
        };
        HttpImageTransport::new(&config).unwrap()
    }

    #[test]
    fn test_parse_list_accepts_array_and_envelope() {
        let bare: Vec<Image> = parse_list(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(bare.len(), 2);

        let paged: Vec<Image> = parse_list(json!({
            "count": 3,
            "next": "http://localhost:8000/api/images/?page=2",
            "previous": null,
            "results": [{"id": 3, "title": "a"}]
        }))
        .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, ImageId::from(3u64));
    }

    #[test]
    fn test_parse_list_rejects_records_without_id() {
        let err = parse_list::<Value>(json!([{"id": 1}, {"title": "orphan"}])).unwrap_err();
        assert!(matches!(err, MedscanError::InvalidPayload(_)));
    }

    #[test]
    fn test_parse_list_rejects_unexpected_shapes() {
        assert!(parse_list::<Value>(json!({"count": 0})).is_err());
        assert!(parse_list::<Value>(json!("nope")).is_err());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"message": "Upload quota exceeded"}"#).as_deref(),
            Some("Upload quota exceeded")
        );
        assert_eq!(
            extract_error_message(r#"{"detail": "Not found."}"#).as_deref(),
            Some("Not found.")
        );
        assert_eq!(
            extract_error_message(r#"{"error": "Image has already been analyzed"}"#).as_deref(),
            Some("Image has already been analyzed")
        );
        assert_eq!(
            extract_error_message(r#"{"message": "", "detail": "fallback"}"#).as_deref(),
            Some("fallback")
        );
        assert_eq!(extract_error_message(r#"{"image": ["required"]}"#), None);
        assert_eq!(extract_error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let transport = transport("http://localhost:8000/api/", None);
        assert_eq!(
            transport.collection_url().as_str(),
            "http://localhost:8000/api/images/"
        );
        assert_eq!(
            transport.item_url(&ImageId::from(12u64)).as_str(),
            "http://localhost:8000/api/images/12/"
        );
    }

    #[test]
    fn test_item_url_escapes_text_ids() {
        let transport = transport("http://localhost:8000/api", None);
        let url = transport.item_url(&ImageId::from("1/../2"));
        assert_eq!(url.as_str(), "http://localhost:8000/api/images/1%2F..%2F2/");
        assert_eq!(url.path_segments().map(|s| s.count()), Some(4));

        let spaced = transport.item_url(&ImageId::from("scan 7?x=1"));
        assert_eq!(spaced.path(), "/api/images/scan%207%3Fx=1/");
        assert_eq!(spaced.query(), None);
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        let err = HttpImageTransport::<Value>::new(&config).err().unwrap();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_list_sends_bearer_token() {
        let (base_url, server) = serve_once("200 OK", r#"{"count": 2, "results": [{"id": 1}, {"id": 2}]}"#).await;
        let transport = transport(&base_url, Some("secret-token"));

        let images = transport.list().await.unwrap();
        assert_eq!(images.len(), 2);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/images/ http/1.1"));
        assert!(request.contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_get_maps_error_status_to_rejected() {
        let (base_url, server) = serve_once("404 Not Found", r#"{"detail": "Not found."}"#).await;
        let transport = transport(&base_url, None);

        let err = transport.get(&ImageId::from(7u64)).await.unwrap_err();
        assert_eq!(err, MedscanError::rejected(404, Some("Not found.".into())));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/images/7/ HTTP/1.1"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_remove_accepts_no_content() {
        let (base_url, server) = serve_once("204 No Content", "").await;
        let transport = transport(&base_url, None);

        transport.remove(&ImageId::from("abc")).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/images/abc/ HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_remove_targets_the_escaped_id() {
        let (base_url, server) = serve_once("204 No Content", "").await;
        let transport = transport(&base_url, None);

        transport.remove(&ImageId::from("1/../2")).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/images/1%2F..%2F2/ HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_create_streams_multipart_and_reports_progress() {
        let (base_url, server) = serve_once(
            "201 Created",
            r#"{"id": 41, "title": "Brain MRI", "analyzed": false}"#,
        )
        .await;
        let transport = transport(&base_url, Some("tok"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let on_progress: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        let upload = UploadRequest::new("brain.png", vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10])
            .with_title("Brain MRI")
            .with_description("Axial slice");
        let image = transport.create(upload, on_progress).await.unwrap();
        assert_eq!(image.id, ImageId::from(41u64));
        assert_eq!(image.payload["title"], "Brain MRI");

        let reports = seen.lock().unwrap().clone();
        assert_eq!(reports.len(), 3);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last(), Some(&100));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/images/ HTTP/1.1"));
        assert!(request.contains("name=\"title\""));
        assert!(request.contains("Axial slice"));
        assert!(request.contains("filename=\"brain.png\""));
        assert!(request.contains("image/png"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_upload_without_sending() {
        let transport = transport("http://127.0.0.1:9/api", None);
        let err = transport
            .create(UploadRequest::new("notes.txt", vec![1]), medscan_core::image::ignore_progress())
            .await
            .unwrap_err();
        assert!(matches!(err, MedscanError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = transport(&format!("http://{addr}/api"), None);
        let err = transport.list().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.server_message(), None);
    }
}
