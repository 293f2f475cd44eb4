use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use summio_common::{Error, Result};
use summio_config::AppConfig;
use summio_gateway::GatewayServer;
use summio_summarizer::{DocumentSummarizer, Summary};
use tempfile::TempDir;

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";

/// Pick a random available port.
fn random_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
    listener.local_addr().unwrap().port()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    FailSummary,
    /// Summarize fine, but leave the database unable to store the result.
    BreakStore,
}

/// Stands in for the LLM chain; checks the upload really reached disk.
struct FakeSummarizer {
    outcome: Outcome,
    db_path: PathBuf,
}

#[async_trait]
impl DocumentSummarizer for FakeSummarizer {
    async fn summarize_pdf(&self, path: &Path) -> Result<Summary> {
        let bytes = tokio::fs::read(path).await?;
        assert!(bytes.starts_with(b"%PDF-"));
        match self.outcome {
            Outcome::FailSummary => {
                return Err(Error::Llm("upstream exploded with secret details".into()));
            }
            Outcome::BreakStore => {
                summio_db::open_connection(&self.db_path)?
                    .execute_batch("DROP TABLE pdf_summary;")
                    .map_err(|e| Error::Database(e.to_string()))?;
            }
            Outcome::Succeed => {}
        }
        Ok(Summary {
            summary: "# Summary\n\n- a \"quoted\" point".to_string(),
            title: "Test Document".to_string(),
            intermediate_summary: vec![
                "First chunk, with commas.".to_string(),
                "Second chunk\nacross lines.".to_string(),
                "Third ✓".to_string(),
            ],
        })
    }
}

struct TestGateway {
    base: String,
    files_dir: PathBuf,
    _dir: TempDir,
}

impl TestGateway {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(&self.files_dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Build a config rooted in a temp dir, with a tiny frontend bundle.
fn test_config(port: u16, dir: &Path) -> AppConfig {
    let frontend = dir.join("frontend");
    std::fs::create_dir_all(&frontend).unwrap();
    std::fs::write(frontend.join("index.html"), "<html>summio</html>").unwrap();

    let mut config = AppConfig::default();
    config.server.address = format!("127.0.0.1:{port}");
    config.storage.db_path = dir.join("summio.sqlite3");
    config.storage.files_dir = dir.join("files");
    config.storage.frontend_dir = frontend;
    config
}

/// Start the gateway in the background and return a handle to it.
async fn start_test_gateway(outcome: Outcome) -> TestGateway {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let config = test_config(port, dir.path());
    let files_dir = config.storage.files_dir.clone();
    let summarizer = Arc::new(FakeSummarizer {
        outcome,
        db_path: config.storage.db_path.clone(),
    });

    tokio::spawn(async move {
        let server = GatewayServer::new(config).with_summarizer(summarizer);
        let _ = server.run().await;
    });

    // Wait for the server to be ready
    for _ in 0..50 {
        if TcpListener::bind(format!("127.0.0.1:{port}")).is_err() {
            break; // port is in use = server is up
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    TestGateway {
        base: format!("http://127.0.0.1:{port}"),
        files_dir,
        _dir: dir,
    }
}

fn upload_form(bytes: &[u8], name: &str, mime: &str) -> Form {
    let part = Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap();
    Form::new().part("file", part)
}

async fn upload(gw: &TestGateway, form: Form) -> (StatusCode, Value) {
    let resp = reqwest::Client::new()
        .post(gw.url("/api/pdf"))
        .multipart(form)
        .send()
        .await
        .expect("upload request failed");
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let resp = reqwest::get(gw.url("/health"))
        .await
        .expect("health request failed");
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn list_starts_empty_in_envelope() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let body: Value = reqwest::get(gw.url("/api/pdf"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], Value::Array(vec![]));
}

#[tokio::test]
async fn pdf_upload_is_summarized_and_persisted() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let (status, body) = upload(&gw, upload_form(PDF_BYTES, "paper.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");

    let data = &body["data"];
    let id = data["id"].as_i64().unwrap();
    assert_eq!(data["title"], "Test Document");
    let expected = serde_json::json!([
        "First chunk, with commas.",
        "Second chunk\nacross lines.",
        "Third ✓"
    ]);
    assert_eq!(data["intermediate_summary"], expected);

    // The file landed on disk under a generated name.
    let file = data["file"].as_str().unwrap().to_string();
    assert_eq!(gw.stored_files(), vec![file.clone()]);
    let (stem, ext) = file.rsplit_once('.').unwrap();
    assert_eq!(ext, "pdf");
    let (letters, ts) = stem.split_once('-').unwrap();
    assert_eq!(letters.len(), 10);
    assert!(letters.chars().all(|c| c.is_ascii_lowercase()));
    assert!(ts.parse::<i64>().is_ok());

    // Fetching it back returns the same ordered list.
    let fetched: Value = reqwest::get(gw.url(&format!("/api/pdf/{id}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["intermediate_summary"], expected);
    assert_eq!(fetched["data"]["file"], file.as_str());

    // And it shows up in the list and in search.
    let listed: Value = reqwest::get(gw.url("/api/pdf?limit=10"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let found: Value = reqwest::get(gw.url("/api/pdf?q=test%20doc"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found["data"][0]["id"], id);

    // The raw upload is served back.
    let raw = reqwest::get(gw.url(&format!("/api/static/docs/{file}")))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(raw.as_ref(), PDF_BYTES);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_without_touching_disk() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    // Claiming a PDF content type does not help; the bytes are sniffed.
    let (status, body) = upload(
        &gw,
        upload_form(b"just some plain text", "notes.pdf", "application/pdf"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"]["message"], "Invalid mime type");
    assert!(gw.stored_files().is_empty());

    let listed: Value = reqwest::get(gw.url("/api/pdf"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"], Value::Array(vec![]));
}

#[tokio::test]
async fn missing_file_field_is_a_client_error() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let form = Form::new().text("other", "value");
    let (status, body) = upload(&gw, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["message"], "Could not get form file");
}

#[tokio::test]
async fn summarizer_failure_is_generic_500_and_cleans_up() {
    let gw = start_test_gateway(Outcome::FailSummary).await;

    let (status, body) = upload(&gw, upload_form(PDF_BYTES, "paper.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["data"]["message"], "Could not summarize docs");
    assert!(!body.to_string().contains("secret"));
    assert!(gw.stored_files().is_empty());
}

#[tokio::test]
async fn store_failure_after_summary_cleans_up() {
    let gw = start_test_gateway(Outcome::BreakStore).await;

    let (status, body) = upload(&gw, upload_form(PDF_BYTES, "paper.pdf", "application/pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"]["message"], "Could not insert pdf summary");
    assert!(gw.stored_files().is_empty());
}

#[tokio::test]
async fn non_multipart_upload_is_an_enveloped_client_error() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let resp = reqwest::Client::new()
        .post(gw.url("/api/pdf"))
        .header("content-type", "application/json")
        .body(r#"{"file": "not really"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"]["message"], "Could not get form file");
    assert!(gw.stored_files().is_empty());
}

#[tokio::test]
async fn fetch_by_id_distinguishes_bad_and_unknown_ids() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let resp = reqwest::get(gw.url("/api/pdf/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = reqwest::get(gw.url("/api/pdf/999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn invalid_list_params_are_rejected() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let resp = reqwest::get(gw.url("/api/pdf?limit=many")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[cfg(not(feature = "embed-frontend"))]
#[tokio::test]
async fn unknown_paths_serve_the_frontend() {
    let gw = start_test_gateway(Outcome::Succeed).await;

    let resp = reqwest::get(gw.url("/summaries/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("summio"));
}
