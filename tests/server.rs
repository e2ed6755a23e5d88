//! Web routes driven through the real router with stub components.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use justifi::config::Config;
use justifi::llm::{LanguageModel, ModelReply};
use justifi::models::Article;
use justifi::news::NewsFetcher;
use justifi::server::{router, AppState};
use justifi::store::{ArticleStore, SqliteArticleStore};

struct StubFetcher;

#[async_trait]
impl NewsFetcher for StubFetcher {
    async fn fetch(&self, keywords: &str, category: Option<&str>) -> Vec<Article> {
        if keywords.contains("nothing") {
            return Vec::new();
        }
        vec![Article {
            title: format!("Live: {}", keywords),
            description: None,
            url: "https://news.test/live".to_string(),
            category: category.map(str::to_string),
            published_at: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        }]
    }
}

struct StubModel {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, prompt: &str) -> ModelReply {
        self.prompts.lock().unwrap().push(prompt.to_string());
        ModelReply::ok("Consult the statute <s. 12>.")
    }
}

struct TestServer {
    tmp: TempDir,
    base: String,
    model: Arc<StubModel>,
    http: reqwest::Client,
}

async fn start() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal(tmp.path().join("news.sqlite"));
    config.documents.dir = tmp.path().join("legal_documents");
    config.query_log.path = tmp.path().join("unanswered_queries.log");

    let store = SqliteArticleStore::new(&config).unwrap();
    store.ensure_schema().await.unwrap();
    store
        .upsert(
            &[Article {
                title: "Constitutional Court Rules on Speech".to_string(),
                description: Some("A landmark free speech ruling.".to_string()),
                url: "https://news.test/speech".to_string(),
                category: None,
                published_at: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            }],
            "constitutional_law",
        )
        .await;

    let model = Arc::new(StubModel {
        prompts: Mutex::new(Vec::new()),
    });
    let state = AppState::new(
        Arc::new(config),
        Arc::new(store),
        Arc::new(StubFetcher),
        model.clone(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        tmp,
        base: format!("http://{}", addr),
        model,
        http: reqwest::Client::new(),
    }
}

const BOUNDARY: &str = "justifi-test-boundary";

fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

async fn post_form(server: &TestServer, body: String) -> (u16, String) {
    let response = server
        .http
        .post(format!("{}/", server.base))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let server = start().await;
    let body: Value = server
        .http
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_index_renders_form() {
    let server = start().await;
    let html = server
        .http
        .get(format!("{}/", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("<form"));
    assert!(html.contains("name=\"query\""));
    assert!(html.contains("Environmental Law"));
    assert!(html.contains("type=\"file\""));
}

#[tokio::test]
async fn test_api_lookup_from_store() {
    let server = start().await;
    let body: Value = server
        .http
        .post(format!("{}/api/lookup", server.base))
        .json(&json!({"query": "speech"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "store");
    assert_eq!(body["articles"][0]["title"], "Constitutional Court Rules on Speech");
    assert_eq!(body["articles"][0]["category"], "constitutional_law");
}

#[tokio::test]
async fn test_api_lookup_live_with_category() {
    let server = start().await;
    let body: Value = server
        .http
        .post(format!("{}/api/lookup", server.base))
        .json(&json!({"query": "asylum", "category": "Human Rights"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "live");
    assert_eq!(body["articles"][0]["category"], "Human Rights");
}

#[tokio::test]
async fn test_api_lookup_rejects_empty_query() {
    let server = start().await;
    let response = server
        .http
        .post(format!("{}/api/lookup", server.base))
        .json(&json!({"query": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_api_lookup_unknown_category_is_bad_request() {
    let server = start().await;
    let response = server
        .http
        .post(format!("{}/api/lookup", server.base))
        .json(&json!({"query": "tax", "category": "Maritime Law"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "unknown category: Maritime Law");
}

#[tokio::test]
async fn test_api_lookup_category_is_case_insensitive() {
    let server = start().await;
    let body: Value = server
        .http
        .post(format!("{}/api/lookup", server.base))
        .json(&json!({"query": "asylum", "category": "human rights"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["source"], "live");
    assert_eq!(body["articles"][0]["category"], "Human Rights");
}

#[tokio::test]
async fn test_api_ask_with_empty_library() {
    let server = start().await;
    let body: Value = server
        .http
        .post(format!("{}/api/ask", server.base))
        .json(&json!({"query": "What is habeas corpus?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["response"], "Consult the statute <s. 12>.");
    assert_eq!(
        *server.model.prompts.lock().unwrap(),
        vec!["Context: \n\nQuery: What is habeas corpus?\n\nResponse:".to_string()]
    );
}

#[tokio::test]
async fn test_form_lookup_renders_results() {
    let server = start().await;
    let (status, html) = post_form(
        &server,
        multipart_body(&[("query", "speech"), ("category", "All")]),
    )
    .await;
    assert_eq!(status, 200);
    assert!(html.contains("Constitutional Court Rules on Speech"));
    assert!(html.contains("https://news.test/speech"));
}

#[tokio::test]
async fn test_form_no_results_suggests_topics() {
    let server = start().await;
    let (status, html) = post_form(&server, multipart_body(&[("query", "nothing here")])).await;
    assert_eq!(status, 200);
    assert!(html.contains("Try one of these topics"));
    assert!(html.contains("Corporate Law"));
}

#[tokio::test]
async fn test_form_empty_query_prompts_user() {
    let server = start().await;
    let (status, html) = post_form(&server, multipart_body(&[("query", "")])).await;
    assert_eq!(status, 200);
    assert!(html.contains("Please enter a question."));
    assert!(server.model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_form_rejects_non_pdf_upload() {
    let server = start().await;
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"query\"\r\n\r\nIs this valid?\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"notes.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\nplain text, not a pdf\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let (status, html) = post_form(&server, body).await;
    assert_eq!(status, 400);
    assert!(html.contains("<form"));
    assert!(server.model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_form_rejected_batch_saves_nothing() {
    let server = start().await;
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"query\"\r\n\r\nIs this valid?\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"good.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n%PDF-1.4\n%%EOF\n\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"bad.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\nnot a pdf\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let (status, _html) = post_form(&server, body).await;
    assert_eq!(status, 400);

    let docs = server.tmp.path().join("legal_documents");
    assert!(!docs.join("good.pdf").exists());
    assert!(!docs.join("bad.pdf").exists());
    assert!(server.model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_form_escapes_model_reply() {
    let server = start().await;
    // A minimal PDF header is enough to pass the upload check; text
    // extraction may yield nothing and the question is still answered.
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"query\"\r\n\r\nWhat applies?\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"brief.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n%PDF-1.4\n%%EOF\n\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let (status, html) = post_form(&server, body).await;
    assert_eq!(status, 200, "{}", html);
    assert!(html.contains("Chatbot Response:"));
    assert!(html.contains("Consult the statute &lt;s. 12&gt;."));
    assert_eq!(server.model.prompts.lock().unwrap().len(), 1);
}
