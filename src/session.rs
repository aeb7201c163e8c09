use crate::client::RecommendParams;
use crate::errors::RequestError;
use crate::ledger::ShownIdLedger;
use crate::models::{
    DEFAULT_RECOMMEND_COUNT, PopularityMode, RecommendResponse, RecommendationItem, SeedSong,
};

pub const NO_SEED_MESSAGE: &str = "Add at least one seed song.";

/// Recommendation screen state: the request gate, the inline error area and the
/// current results
#[derive(Debug)]
pub struct RecommendSession {
    pub mode: PopularityMode,
    pub count: u32,
    /// Replaces the ledger contents in the next requests when set
    pub already_shown_override: Option<Vec<String>>,
    loading: bool,
    error: Option<String>,
    recommendations: Vec<RecommendationItem>,
}

impl Default for RecommendSession {
    fn default() -> Self {
        RecommendSession {
            mode: PopularityMode::All,
            count: DEFAULT_RECOMMEND_COUNT,
            already_shown_override: None,
            loading: false,
            error: None,
            recommendations: Vec::new(),
        }
    }
}

impl RecommendSession {
    pub fn new(mode: PopularityMode, count: u32) -> Self {
        RecommendSession {
            mode,
            count,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn recommendations(&self) -> &[RecommendationItem] {
        &self.recommendations
    }

    /// Start a request if the screen allows one.
    ///
    /// Returns `None` while a request is in flight, or with the inline error set when
    /// there is no seed at all.
    pub fn begin(&mut self, seeds: Vec<SeedSong>) -> Option<RecommendParams> {
        if self.loading {
            return None;
        }
        if seeds.is_empty() {
            self.error = Some(NO_SEED_MESSAGE.to_string());
            return None;
        }

        self.loading = true;
        self.error = None;
        Some(RecommendParams {
            count: self.count,
            mode: self.mode,
            already_shown_override: self.already_shown_override.clone(),
            ..RecommendParams::new(seeds)
        })
    }

    /// Finish the in-flight request. Successful results replace the list and their
    /// ids are merged into the ledger; failures only fill the error area.
    pub fn complete(
        &mut self,
        outcome: Result<RecommendResponse, RequestError>,
        ledger: &ShownIdLedger,
    ) {
        self.loading = false;
        match outcome {
            Ok(response) => {
                ledger.add(&response.ids());
                self.recommendations = response.recommendations;
                self.error = None;
            }
            Err(e) => {
                match e.status() {
                    Some(status) => log::warn!("Recommendation request failed ({status}): {e}"),
                    None => log::warn!("Recommendation request failed: {e}"),
                }
                self.error = Some(e.to_string());
            }
        }
    }
}
