//! Remote access to a running service.
//!
//! Page scripts fire a request on every keystroke or form change, so an older
//! response can arrive after a newer one. Each request takes a ticket from a
//! [`RequestSequencer`]; when the answer comes back, it is only used if no
//! newer ticket was issued in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::composer::Composer;
use crate::error::ClientError;
use crate::html::result_message;
use crate::search::MIN_SUGGESTION_CHARS;

/// Fragment shown when a request fails
pub const ERROR_MESSAGE: &str = "エラーが発生しました。";

/// Issues increasing tickets; only the latest one is current.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request and get its ticket.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Make every in-flight ticket stale.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Something that can run an action against the service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, action: &str, params: &[(&str, &str)]) -> Result<Value, ClientError>;
}

/// [`Transport`] over HTTP GET to the `/exec` endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, action: &str, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let mut query = vec![("action", action)];
        query.extend_from_slice(params);

        let response = self.client.get(&self.endpoint).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Body(e.to_string()))
    }
}

fn scene_action(composer: Composer) -> Option<&'static str> {
    match composer {
        Composer::Strauss => Some("searchRichardStraussByScene"),
        Composer::Wagner => Some("searchRichardWagnerByScene"),
        Composer::Mahler => None,
    }
}

fn page_action(composer: Composer) -> Option<&'static str> {
    match composer {
        Composer::Strauss => Some("searchRichardStraussByPage"),
        Composer::Wagner => Some("searchRichardWagnerByPage"),
        Composer::Mahler => None,
    }
}

fn terms_action(composer: Composer) -> &'static str {
    match composer {
        Composer::Strauss => "searchRSTerms",
        Composer::Wagner => "searchRWTerms",
        Composer::Mahler => "searchByTerm",
    }
}

fn partial_action(composer: Composer) -> &'static str {
    match composer {
        Composer::Strauss => "searchRSTermsPartially",
        Composer::Wagner => "searchRWTermsPartially",
        Composer::Mahler => "searchGMTermsPartially",
    }
}

/// One page's worth of requests
///
/// Searches and autocomplete suggestions are sequenced separately, so typing
/// in the suggestion box never drops a search result. Every method returns
/// `None` when its answer was overtaken by a newer request of the same kind
/// and should be thrown away.
pub struct SearchSession<T: Transport> {
    transport: T,
    searches: RequestSequencer,
    suggestions: RequestSequencer,
}

impl<T: Transport> SearchSession<T> {
    pub fn new(transport: T) -> Self {
        SearchSession {
            transport,
            searches: RequestSequencer::new(),
            suggestions: RequestSequencer::new(),
        }
    }

    pub fn search_sequencer(&self) -> &RequestSequencer {
        &self.searches
    }

    pub fn suggestion_sequencer(&self) -> &RequestSequencer {
        &self.suggestions
    }

    async fn sequenced(
        &self,
        sequencer: &RequestSequencer,
        action: &str,
        params: &[(&str, &str)],
    ) -> Option<Result<Value, ClientError>> {
        let ticket = sequencer.begin();
        let result = self.transport.call(action, params).await;
        if sequencer.is_current(ticket) {
            Some(result)
        } else {
            debug!("Discarding stale response #{} for {}", ticket, action);
            None
        }
    }

    /// Run an action under a fresh search ticket.
    pub async fn request(&self, action: &str, params: &[(&str, &str)]) -> Option<Result<Value, ClientError>> {
        self.sequenced(&self.searches, action, params).await
    }

    /// Run an action whose answer is an HTML fragment
    ///
    /// Failures become [`ERROR_MESSAGE`] as a result message.
    pub async fn html(&self, action: &str, params: &[(&str, &str)]) -> Option<String> {
        let result = self.request(action, params).await?;
        Some(match result {
            Ok(Value::String(html)) => html,
            Ok(other) => other.to_string(),
            Err(e) => {
                log::warn!("{} failed: {}", action, e);
                result_message(ERROR_MESSAGE)
            }
        })
    }

    /// Scene search; Mahler has no scene search and answers with a message.
    pub async fn search_by_scene(&self, composer: Composer, opera: &str, scenes: &[String]) -> Option<String> {
        let Some(action) = scene_action(composer) else {
            self.searches.cancel();
            return Some(result_message(ERROR_MESSAGE));
        };
        let scenes = scenes.join(",");
        self.html(action, &[("opera", opera), ("scenes", &scenes)]).await
    }

    /// Page search; Mahler has no page search and answers with a message.
    pub async fn search_by_page(&self, composer: Composer, opera: &str, page_input: &str) -> Option<String> {
        let Some(action) = page_action(composer) else {
            self.searches.cancel();
            return Some(result_message(ERROR_MESSAGE));
        };
        self.html(action, &[("opera", opera), ("pageInput", page_input)]).await
    }

    pub async fn search_terms(&self, composer: Composer, query: &str) -> Option<String> {
        self.html(terms_action(composer), &[("query", query)]).await
    }

    /// Autocomplete suggestions for a partial term
    ///
    /// Input too short to search clears the list without a request and makes
    /// any in-flight suggestion request stale. Failures yield an empty list.
    pub async fn suggestions(&self, composer: Composer, input: &str) -> Option<Vec<String>> {
        if input.trim().chars().count() < MIN_SUGGESTION_CHARS {
            self.suggestions.cancel();
            return Some(Vec::new());
        }

        let action = partial_action(composer);
        match self.sequenced(&self.suggestions, action, &[("input", input)]).await? {
            Ok(value) => Some(serde_json::from_value(value).unwrap_or_default()),
            Err(e) => {
                log::warn!("Suggestions for {:?} failed: {}", input, e);
                Some(Vec::new())
            }
        }
    }
}
