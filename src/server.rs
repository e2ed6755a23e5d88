//! Web front end and JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Query form (question, category, PDF upload) |
//! | `POST` | `/` | Multipart form submit; renders results as HTML |
//! | `POST` | `/api/lookup` | `{query, category?}` → news lookup result |
//! | `POST` | `/api/ask` | `{query}` → model reply over the document library |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! A form submission that carries PDF files is answered by the language
//! model using the document library; one without files is a news lookup.
//!
//! # Error Contract
//!
//! JSON endpoints report errors as
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! with codes `bad_request` (400) and `internal` (500). The HTML form
//! renders the same messages inline.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ask::DocumentQa;
use crate::config::Config;
use crate::extract::MIME_PDF;
use crate::library::{DocumentLibrary, LoadedDocument};
use crate::llm::{GenerateClient, LanguageModel, ModelReply};
use crate::lookup::{suggested_topics, Lookup, LookupResult, ResultSource};
use crate::models::NewsCategory;
use crate::news::{NewsApiClient, NewsFetcher};
use crate::query_log::QueryLog;
use crate::store::{self, ArticleStore};

/// Upper bound on a whole multipart request.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn NewsFetcher>,
    model: Arc<dyn LanguageModel>,
    log: QueryLog,
    library: DocumentLibrary,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn NewsFetcher>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let log = QueryLog::new(&config.query_log.path);
        let library = DocumentLibrary::new(&config.documents.dir);
        Self {
            config,
            store,
            fetcher,
            model,
            log,
            library,
        }
    }

    /// Wire the production components from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ArticleStore> = Arc::from(store::open_store(config)?);
        let fetcher: Arc<dyn NewsFetcher> = Arc::new(NewsApiClient::new(config)?);
        let model: Arc<dyn LanguageModel> = Arc::new(GenerateClient::new(&config.model)?);
        Ok(Self::new(Arc::new(config.clone()), store, fetcher, model))
    }

    async fn lookup(&self, query: &str, category: NewsCategory) -> LookupResult {
        Lookup::new(self.store.as_ref(), self.fetcher.as_ref(), &self.log)
            .lookup(query, category.as_filter())
            .await
    }

    async fn answer(
        &self,
        documents: &[LoadedDocument],
        query: &str,
    ) -> Result<ModelReply, AppError> {
        Ok(DocumentQa::new(self.model.as_ref(), &self.config.chunking)
            .answer(documents, query)
            .await?)
    }

    /// Save `uploads` into the library, then load the whole library.
    async fn store_and_load(
        &self,
        uploads: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<LoadedDocument>, AppError> {
        let library = self.library.clone();
        let documents = tokio::task::spawn_blocking(move || {
            library.save_all(&uploads)?;
            library.load_all()
        })
        .await
        .map_err(|e| internal(e.to_string()))??;
        Ok(documents)
    }
}

/// Builds the router. Exposed so tests can drive it with stub components.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index).post(handle_form))
        .route("/api/lookup", post(handle_lookup))
        .route("/api/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    state.store.ensure_schema().await?;

    let app = router(state);

    tracing::info!(bind = %config.server.bind, "server listening");
    println!("JustiFi listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<crate::error::Error> for AppError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Validation(msg) => bad_request(msg),
            other => {
                tracing::error!(error = %other, "request failed");
                internal(other.to_string())
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/lookup ============

#[derive(Deserialize)]
struct LookupRequest {
    query: String,
    #[serde(default)]
    category: Option<String>,
}

async fn handle_lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<LookupResult>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let category = match req.category.as_deref() {
        Some(raw) => NewsCategory::parse(raw)
            .ok_or_else(|| bad_request(format!("unknown category: {}", raw)))?,
        None => NewsCategory::All,
    };
    let result = state.lookup(query, category).await;
    Ok(Json(result))
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    query: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<ModelReply>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let documents = state.store_and_load(Vec::new()).await?;
    let reply = state.answer(&documents, &req.query).await?;
    Ok(Json(reply))
}

// ============ GET / and POST / ============

async fn handle_index() -> Html<String> {
    Html(render_page("", NewsCategory::All, ""))
}

/// Fields of the query form.
#[derive(Default)]
struct FormInput {
    query: String,
    category: NewsCategory,
    uploads: Vec<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> Result<FormInput, AppError> {
    let mut input = FormInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "query" => {
                input.query = field.text().await.map_err(|e| bad_request(e.body_text()))?;
            }
            "category" => {
                let raw = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                input.category = NewsCategory::parse(&raw)
                    .ok_or_else(|| bad_request(format!("unknown category: {}", raw)))?;
            }
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
                // Browsers send an empty part when no file was picked.
                if !file_name.is_empty() && !bytes.is_empty() {
                    input.uploads.push((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

async fn handle_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let input = match read_form(multipart).await {
        Ok(input) => input,
        Err(e) => return render_error("", NewsCategory::All, e),
    };
    let query = input.query.trim().to_string();
    if query.is_empty() {
        let body = notice("Please enter a question.");
        return Html(render_page("", input.category, &body)).into_response();
    }

    let body = if input.uploads.is_empty() {
        let result = state.lookup(&query, input.category).await;
        render_articles(&result)
    } else {
        match answer_uploads(&state, input.uploads, &query).await {
            Ok(reply) => render_reply(&reply),
            Err(e) => return render_error(&query, input.category, e),
        }
    };

    Html(render_page(&query, input.category, &body)).into_response()
}

async fn answer_uploads(
    state: &AppState,
    uploads: Vec<(String, Vec<u8>)>,
    query: &str,
) -> Result<ModelReply, AppError> {
    let documents = state.store_and_load(uploads).await?;
    state.answer(&documents, query).await
}

// ============ HTML rendering ============

fn esc(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

fn attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

fn notice(message: &str) -> String {
    format!("<p class=\"notice\">{}</p>", esc(message))
}

fn render_error(query: &str, category: NewsCategory, err: AppError) -> Response {
    let page = render_page(query, category, &notice(&err.message));
    (err.status, Html(page)).into_response()
}

fn render_page(query: &str, selected: NewsCategory, body: &str) -> String {
    let options: String = NewsCategory::ALL
        .iter()
        .map(|c| {
            let sel = if *c == selected { " selected" } else { "" };
            format!(
                "<option value=\"{v}\"{sel}>{label}</option>",
                v = attr(c.label()),
                sel = sel,
                label = esc(c.label())
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>JustiFi</title>
</head>
<body>
<h1>JustiFi</h1>
<form method="post" action="/" enctype="multipart/form-data">
  <label>Ask your legal question:
    <input type="text" name="query" value="{query}" size="60">
  </label>
  <label>Category:
    <select name="category">{options}</select>
  </label>
  <label>Upload Legal PDFs:
    <input type="file" name="files" accept="{mime},.pdf" multiple>
  </label>
  <button type="submit">Ask</button>
</form>
<section id="results">
{body}
</section>
</body>
</html>
"#,
        query = attr(query),
        mime = MIME_PDF,
        options = options,
        body = body
    )
}

fn render_articles(result: &LookupResult) -> String {
    if result.articles.is_empty() {
        let topics: String = suggested_topics()
            .into_iter()
            .map(|t| format!("<li>{}</li>", esc(t)))
            .collect();
        return format!(
            "<p>No articles found. Try one of these topics:</p>\n<ul>{}</ul>",
            topics
        );
    }

    let heading = match result.source {
        ResultSource::Store => "Saved articles",
        _ => "Latest news",
    };
    let mut html = format!("<h2>{}</h2>\n<ul class=\"articles\">\n", heading);
    for article in &result.articles {
        let title = if is_web_url(&article.url) {
            format!(
                "<a href=\"{}\">{}</a>",
                attr(&article.url),
                esc(&article.title)
            )
        } else {
            format!("{} <code>{}</code>", esc(&article.title), esc(&article.url))
        };
        html.push_str(&format!(
            "<li>{title} <small>{date}</small>",
            title = title,
            date = article.published_at.format("%Y-%m-%d")
        ));
        if let Some(ref category) = article.category {
            html.push_str(&format!(" <em>{}</em>", esc(category)));
        }
        if let Some(ref description) = article.description {
            html.push_str(&format!("<p>{}</p>", esc(description)));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>");
    html
}

/// Only http(s) links are rendered as anchors.
fn is_web_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn render_reply(reply: &ModelReply) -> String {
    format!(
        "<h2>Chatbot Response:</h2>\n<p class=\"response\">{}</p>",
        esc(reply.display_text())
    )
}
