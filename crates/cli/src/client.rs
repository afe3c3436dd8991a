use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use segview_insight::{FetchStep, InsightError, SegmentationSource};
use segview_protocol::{InsightMap, Record};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::config::ClientConfig;

pub const DEFAULT_EXPORT_FILE: &str = "segmented_customers.csv";

/// Segmentation service reached over HTTP.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: cfg.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response
            .json()
            .await
            .with_context(|| format!("Invalid response body from {url}"))
    }

    /// Sends a dataset as `multipart/form-data` (part name `file`).
    pub async fn upload(&self, path: &Path) -> Result<Value> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let url = self.url("/upload");
        log::info!("Uploading {} to {url}", path.display());
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        let body = response.bytes().await.context("Failed to read upload reply")?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }

    /// Fetches the segmented dataset export.
    pub async fn download(&self) -> Result<Vec<u8>> {
        let url = self.url("/download");
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let bytes = response.bytes().await.context("Failed to read export")?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SegmentationSource for HttpSource {
    async fn fetch_records(&self) -> segview_insight::Result<Vec<Record>> {
        self.get_json("/clusters")
            .await
            .map_err(|err| InsightError::fetch(FetchStep::Records, err))
    }

    async fn fetch_insights(&self) -> segview_insight::Result<InsightMap> {
        self.get_json("/insights")
            .await
            .map_err(|err| InsightError::fetch(FetchStep::Insights, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use segview_insight::{Dashboard, RefreshOutcome};
    use serde_json::json;
    use std::time::Duration;

    async fn serve(app: Router) -> ClientConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ClientConfig {
            api_url: format!("http://{addr}"),
            timeout: Duration::from_secs(5),
        }
    }

    fn service() -> Router {
        Router::new()
            .route(
                "/clusters",
                get(|| async {
                    Json(json!([
                        {"CustomerID": 1, "Annual Income (k$)": 15, "Spending Score (1-100)": 39, "Cluster": 2},
                        {"CustomerID": 2, "Annual Income (k$)": 16, "Spending Score (1-100)": 81, "Cluster": 10}
                    ]))
                }),
            )
            .route(
                "/insights",
                get(|| async {
                    Json(json!({
                        "2": {"label": "Careful Saver", "description": "Cluster 2 contains savers.", "stats": {"Income": 15}},
                        "10": {"label": "High Value", "description": "", "stats": {}}
                    }))
                }),
            )
            .route(
                "/download",
                get(|| async { "CustomerID,Cluster\n1,2\n2,10\n" }),
            )
            .route(
                "/upload",
                post(|headers: HeaderMap, body: Bytes| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let text = String::from_utf8_lossy(&body).into_owned();
                    Json(json!({
                        "multipart": content_type.starts_with("multipart/form-data"),
                        "has_file_part": text.contains("name=\"file\""),
                        "has_name": text.contains("filename=\"customers.csv\""),
                    }))
                }),
            )
    }

    #[tokio::test]
    async fn refresh_over_http_builds_view() {
        let cfg = serve(service()).await;
        let dashboard = Dashboard::new(HttpSource::new(&cfg).unwrap());

        let outcome = dashboard.refresh().await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Updated {
                records: 2,
                segments: 2
            }
        );
        let view = dashboard.view().unwrap();
        assert_eq!(view.scatter[0].name, "Cluster 2");
        assert_eq!(view.distribution[0].name, "Cluster 10");
        assert_eq!(view.cards[0].description, "Contains savers.");
        assert_eq!(view.cards[0].stats.income, 15);
    }

    #[tokio::test]
    async fn insights_failure_leaves_dashboard_empty() {
        let app = Router::new()
            .route("/clusters", get(|| async { Json(json!([{"Cluster": 0}])) }))
            .route(
                "/insights",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let cfg = serve(app).await;
        let dashboard = Dashboard::new(HttpSource::new(&cfg).unwrap());

        let err = dashboard.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            InsightError::Fetch {
                step: FetchStep::Insights,
                ..
            }
        ));
        assert!(!dashboard.is_ready());
    }

    #[tokio::test]
    async fn unreachable_service_is_a_records_failure() {
        let cfg = ClientConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        };
        let source = HttpSource::new(&cfg).unwrap();
        let err = source.fetch_records().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch records"));
    }

    #[tokio::test]
    async fn upload_and_download_round_trip() {
        let cfg = serve(service()).await;
        let source = HttpSource::new(&cfg).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("customers.csv");
        std::fs::write(&csv, "CustomerID,Age\n1,20\n").unwrap();
        let reply = source.upload(&csv).await.unwrap();
        assert_eq!(
            reply,
            json!({"multipart": true, "has_file_part": true, "has_name": true})
        );

        let export = source.download().await.unwrap();
        assert_eq!(export, b"CustomerID,Cluster\n1,2\n2,10\n");
    }
}
