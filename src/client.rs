use crate::config::Config;
use crate::errors::{RequestError, TransportError, extract_error_message};
use crate::ledger::ShownIdLedger;
use crate::models::{
    DEFAULT_RECOMMEND_COUNT, FeedbackEvent, FeedbackRequest, PingStatus, PopularityMode,
    RecommendRequest, RecommendResponse, SearchResponse, SearchResult, SeedSong,
};
use anyhow::Result;
use ureq::{Agent, AgentBuilder};
use urlencoding::encode;

pub const DISTINCT_ID_HEADER: &str = "X-Posthog-Distinct-Id";
pub const DEFAULT_SEARCH_LIMIT: usize = 8;
/// Queries shorter than this (after trimming) never reach the network
pub const MIN_QUERY_CHARS: usize = 2;

/// Status and body of any HTTP response, success or not
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP seam. Non-2xx statuses come back as `Ok`; `Err` means no response at all.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError>;

    fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport on a shared `ureq` agent
pub struct UreqTransport {
    agent: Agent,
    origin: String,
}

impl UreqTransport {
    pub fn new(config: &Config) -> Self {
        let agent = AgentBuilder::new().timeout(config.timeout).build();
        UreqTransport {
            agent,
            origin: config.origin.trim_end_matches('/').to_string(),
        }
    }

    /// Relative paths resolve against the origin, absolute URLs pass through
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }

    fn finish(
        result: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<HttpResponse, TransportError> {
        match result {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| TransportError(format!("could not read body: {e}")))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(TransportError(e.to_string())),
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.agent.get(&self.resolve(url));
        for (name, value) in headers {
            request = request.set(name, value);
        }
        Self::finish(request.call())
    }

    fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.agent.post(&self.resolve(url));
        for (name, value) in headers {
            request = request.set(name, value);
        }
        Self::finish(request.send_json(body))
    }
}

/// Parameters for one recommend call
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendParams {
    pub seeds: Vec<SeedSong>,
    pub count: u32,
    pub mode: PopularityMode,
    /// Replaces the ledger contents in the request when set
    pub already_shown_override: Option<Vec<String>>,
}

impl RecommendParams {
    pub fn new(seeds: Vec<SeedSong>) -> Self {
        RecommendParams {
            seeds,
            count: DEFAULT_RECOMMEND_COUNT,
            mode: PopularityMode::All,
            already_shown_override: None,
        }
    }
}

/// Client for the Offtrack `/api/*` endpoints
pub struct ApiClient<T: Transport> {
    transport: T,
    api_base: Option<String>,
    distinct_id: Option<String>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, api_base: Option<String>, distinct_id: Option<String>) -> Self {
        ApiClient {
            transport,
            api_base: api_base
                .map(|base| base.trim().trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
            distinct_id: distinct_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn distinct_id(&self) -> Option<&str> {
        self.distinct_id.as_deref()
    }

    /// `/api/...` as a same-origin path, or under the configured base
    fn endpoint(&self, path: &str) -> String {
        match &self.api_base {
            Some(base) => format!("{base}{path}"),
            None => path.to_string(),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.distinct_id {
            Some(id) => vec![(DISTINCT_ID_HEADER.to_string(), id.clone())],
            None => Vec::new(),
        }
    }

    /// Backend health and recommender readiness
    pub fn ping(&self) -> Result<PingStatus> {
        let response = self
            .transport
            .get(&self.endpoint("/api/ping"), &self.headers())
            .map_err(|e| anyhow::anyhow!("Ping failed: {}", e))?;

        if !response.is_success() {
            return Err(anyhow::anyhow!(
                "Ping returned status {}: {}",
                response.status,
                extract_error_message(response.status, &response.body)
            ));
        }

        let status: PingStatus = serde_json::from_str(&response.body)
            .map_err(|e| anyhow::anyhow!("Failed to parse ping response: {}", e))?;
        Ok(status)
    }

    /// Song lookup for seed suggestions, in server relevance order.
    ///
    /// Any failure yields an empty list so typing stays responsive.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let url = self.endpoint(&format!("/api/search?q={}&limit={}", encode(query), limit));
        let response = match self.transport.get(&url, &self.headers()) {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Search for '{query}' failed: {e}");
                return Vec::new();
            }
        };

        if !response.is_success() {
            log::debug!("Search for '{query}' returned status {}", response.status);
            return Vec::new();
        }

        match serde_json::from_str::<SearchResponse>(&response.body) {
            Ok(parsed) => parsed.results,
            Err(e) => {
                log::debug!("Search for '{query}' returned a malformed body: {e}");
                Vec::new()
            }
        }
    }

    /// Ask for recommendations.
    ///
    /// `already_shown_ids` comes from the ledger unless the params override it. The
    /// ledger is only read here; merging the returned ids is up to the caller.
    pub fn recommend(
        &self,
        params: &RecommendParams,
        ledger: &ShownIdLedger,
    ) -> Result<RecommendResponse, RequestError> {
        let already_shown_ids = match &params.already_shown_override {
            Some(ids) => ids.clone(),
            None => ledger.read(),
        };

        let request = RecommendRequest {
            seeds: params.seeds.clone(),
            n: params.count,
            mode: params.mode,
            already_shown_ids,
            distinct_id: self.distinct_id.clone(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| RequestError::Decode(format!("could not encode request: {e}")))?;

        log::debug!(
            "Requesting {} recommendations ({} seeds, mode {}, {} already shown)",
            request.n,
            request.seeds.len(),
            request.mode,
            request.already_shown_ids.len()
        );

        let response = self
            .transport
            .post_json(&self.endpoint("/api/recommend"), &self.headers(), &body)?;

        if !response.is_success() {
            return Err(RequestError::Status {
                status: response.status,
                message: extract_error_message(response.status, &response.body),
            });
        }

        serde_json::from_str(&response.body).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Best-effort interaction event; failures are logged and dropped
    pub fn send_feedback(&self, track_id: &str, event: FeedbackEvent) {
        let request = FeedbackRequest {
            track_id,
            event,
            distinct_id: self.distinct_id.as_deref(),
        };
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                log::debug!("Could not encode feedback: {e}");
                return;
            }
        };

        match self
            .transport
            .post_json(&self.endpoint("/api/feedback"), &self.headers(), &body)
        {
            Ok(response) if !response.is_success() => {
                log::debug!("Feedback for {track_id} returned status {}", response.status);
            }
            Ok(_) => {}
            Err(e) => log::debug!("Feedback for {track_id} failed: {e}"),
        }
    }
}
