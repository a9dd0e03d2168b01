//! Documentation-search hint provider.
//!
//! Sends a topic query built from the scenario id and category to a search
//! endpoint and turns the top result into a hint. Only the scenario id and
//! category shape the query; selected controls and any player text stay
//! local.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Hint, HintContext, HintProvider};
use crate::config::HintConfig;
use crate::content::{ContentStore, ControlCategory};
use crate::error::{EscapeRoomError, ProviderErrorKind, Result};

const PROVIDER_NAME: &str = "remote";

/// Maximum hint length in characters before truncation.
const MAX_HINT_CHARS: usize = 500;

/// Results requested per search.
const SEARCH_TOP: u32 = 3;

const DEFAULT_QUERY: &str = "Microsoft 365 Copilot governance";

const NO_RESULTS_HINT: &str = "Consider reviewing Microsoft Learn documentation on governance best practices for this scenario type.";

const NO_RESULTS_URL: &str = "https://learn.microsoft.com/microsoft-365-copilot/";

const TOPIC_QUERIES: &[(&str, &str)] = &[
    (
        "scenario-1-leaky-sharepoint",
        "SharePoint permissions governance Copilot oversharing",
    ),
    (
        "scenario-2-label-lockdown",
        "sensitivity labels encryption Microsoft 365 Copilot",
    ),
    (
        "scenario-3-dlp-tripwires",
        "DLP data loss prevention Power Platform connectors",
    ),
    (
        "scenario-4-prompt-injection",
        "prompt injection AI safety Copilot Studio",
    ),
    (
        "scenario-5-shadow-connector",
        "connector governance Power Platform shadow IT",
    ),
];

static TAG_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]*>").ok());

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    url: Option<String>,
}

/// Hint provider backed by a remote documentation search.
pub struct RemoteHintProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    enable_logging: bool,
    content: Arc<ContentStore>,
}

impl RemoteHintProvider {
    /// Creates a provider from the hint configuration.
    ///
    /// The configured timeout bounds every request.
    pub fn new(config: &HintConfig, content: Arc<ContentStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                EscapeRoomError::hint_provider(PROVIDER_NAME, ProviderErrorKind::Network, e.to_string())
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            enable_logging: config.enable_logging,
            content,
        })
    }

    /// Builds the search query for a context.
    fn build_query(&self, scenario_id: &str, category: Option<ControlCategory>) -> String {
        let topic = TOPIC_QUERIES
            .iter()
            .find(|(id, _)| *id == scenario_id)
            .map(|(_, q)| (*q).to_string())
            .or_else(|| self.content.scenario(scenario_id).map(|s| s.topic.clone()))
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        match category {
            Some(category) => format!("{topic} {}", category.label()),
            None => topic,
        }
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        if self.enable_logging {
            info!(endpoint = %self.endpoint, query, "Hint search request");
        }

        let mut request = self.client.post(&self.endpoint).json(&SearchRequest {
            query,
            top: SEARCH_TOP,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(EscapeRoomError::hint_provider(
                PROVIDER_NAME,
                ProviderErrorKind::Status,
                format!("search request failed: {status}"),
            ));
        }

        let body: SearchResponse = response.json().await.map_err(classify)?;

        if self.enable_logging {
            info!(result_count = body.results.len(), "Hint search response");
        }
        Ok(body)
    }

    async fn fetch(&self, context: &HintContext) -> Result<Hint> {
        let query = self.build_query(&context.scenario_id, context.category);
        let response = self.search(&query).await?;

        if let Some(error) = response.error.filter(|_| response.results.is_empty()) {
            debug!(%error, "Hint search returned an error with no results");
        }

        let Some(top) = response.results.into_iter().next() else {
            return Ok(Hint {
                text: NO_RESULTS_HINT.to_string(),
                learn_more_url: Some(NO_RESULTS_URL.to_string()),
                category: context.category,
            });
        };

        debug!(title = %top.title, "Using top search result as hint");
        Ok(Hint {
            text: format_snippet(&top.snippet),
            learn_more_url: top.url.filter(|u| !u.is_empty()),
            category: context.category,
        })
    }
}

impl HintProvider for RemoteHintProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn get_hint<'a>(&'a self, context: &'a HintContext) -> BoxFuture<'a, Result<Hint>> {
        self.fetch(context).boxed()
    }
}

fn classify(e: reqwest::Error) -> EscapeRoomError {
    let kind = if e.is_timeout() {
        ProviderErrorKind::Timeout
    } else if e.is_decode() {
        ProviderErrorKind::Decode
    } else if e.is_status() {
        ProviderErrorKind::Status
    } else {
        ProviderErrorKind::Network
    };
    EscapeRoomError::hint_provider(PROVIDER_NAME, kind, e.to_string())
}

/// Strips markup and truncates a snippet for display.
fn format_snippet(snippet: &str) -> String {
    let cleaned = match TAG_RE.as_ref() {
        Some(re) => re.replace_all(snippet, "").into_owned(),
        None => snippet.to_string(),
    };

    if cleaned.chars().count() > MAX_HINT_CHARS {
        let truncated: String = cleaned.chars().take(MAX_HINT_CHARS).collect();
        format!("{}...", truncated.trim())
    } else {
        cleaned.trim().to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    async fn spawn_search(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/search")
    }

    fn provider(endpoint: String, timeout_ms: u64) -> RemoteHintProvider {
        let config = HintConfig {
            endpoint,
            timeout_ms,
            ..HintConfig::default()
        };
        RemoteHintProvider::new(&config, ContentStore::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_build_query_uses_topic_map_and_category() {
        let p = provider("http://127.0.0.1:9/search".into(), 100);
        assert_eq!(
            p.build_query("scenario-4-prompt-injection", None),
            "prompt injection AI safety Copilot Studio"
        );
        let q = p.build_query("scenario-1-leaky-sharepoint", Some(ControlCategory::DataAccess));
        assert!(q.starts_with("SharePoint permissions"));
        assert!(q.ends_with(ControlCategory::DataAccess.label()));
        assert_eq!(p.build_query("nope", None), DEFAULT_QUERY);
    }

    #[test]
    fn test_format_snippet_strips_tags() {
        assert_eq!(
            format_snippet("  Use <b>sensitivity labels</b> to <a href=\"x\">classify</a>. "),
            "Use sensitivity labels to classify."
        );
    }

    #[test]
    fn test_format_snippet_truncates_on_char_boundary() {
        let long = "é".repeat(MAX_HINT_CHARS + 20);
        let out = format_snippet(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), MAX_HINT_CHARS + 3);
    }

    #[tokio::test]
    async fn test_top_result_becomes_hint() {
        let app = Router::new().route(
            "/search",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["top"], 3);
                assert!(body.get("selectedControlIds").is_none());
                Json(json!({
                    "results": [
                        {"title": "Labels", "snippet": "<p>Apply labels</p>", "url": "https://learn.example/labels"},
                        {"title": "Other", "snippet": "ignored", "url": "https://learn.example/other"}
                    ]
                }))
            }),
        );
        let endpoint = spawn_search(app).await;
        let p = provider(endpoint, 2000);

        let ctx = HintContext::new("scenario-2-label-lockdown")
            .with_category(ControlCategory::InformationProtection);
        let hint = p.get_hint(&ctx).await.unwrap();
        assert_eq!(hint.text, "Apply labels");
        assert_eq!(hint.learn_more_url.as_deref(), Some("https://learn.example/labels"));
        assert_eq!(hint.category, Some(ControlCategory::InformationProtection));
    }

    #[tokio::test]
    async fn test_empty_results_give_generic_hint() {
        let app = Router::new().route("/search", post(|| async { Json(json!({"results": []})) }));
        let p = provider(spawn_search(app).await, 2000);

        let hint = p.get_hint(&HintContext::new("scenario-3-dlp-tripwires")).await.unwrap();
        assert_eq!(hint.text, NO_RESULTS_HINT);
        assert_eq!(hint.learn_more_url.as_deref(), Some(NO_RESULTS_URL));
    }

    #[tokio::test]
    async fn test_error_status_is_classified() {
        let app = Router::new().route(
            "/search",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let p = provider(spawn_search(app).await, 2000);

        let err = p.get_hint(&HintContext::new("scenario-1-leaky-sharepoint")).await.unwrap_err();
        assert!(matches!(
            err,
            EscapeRoomError::HintProviderError { kind: ProviderErrorKind::Status, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let app = Router::new().route("/search", post(|| async { "not json" }));
        let p = provider(spawn_search(app).await, 2000);

        let err = p.get_hint(&HintContext::new("scenario-1-leaky-sharepoint")).await.unwrap_err();
        assert!(matches!(
            err,
            EscapeRoomError::HintProviderError { kind: ProviderErrorKind::Decode, .. }
        ));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let app = Router::new().route(
            "/search",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({"results": []}))
            }),
        );
        let p = provider(spawn_search(app).await, 50);

        let err = p.get_hint(&HintContext::new("scenario-1-leaky-sharepoint")).await.unwrap_err();
        assert!(matches!(
            err,
            EscapeRoomError::HintProviderError { kind: ProviderErrorKind::Timeout, .. }
        ));
        assert!(err.is_transient());
    }
}
