use super::timer::TimerHandle;
use crate::models::{SearchResult, SeedSong};

/// State of one seed slot: the text box, its suggestion list and committed seed
#[derive(Debug, Default)]
pub struct SearchLane {
    pub(super) text: String,
    pub(super) results: Vec<SearchResult>,
    pub(super) loading: bool,
    pub(super) committed: Option<SeedSong>,
    pub(super) pending: Option<TimerHandle>,
    /// Sequence number of the only response this lane will still accept
    pub(super) latest_seq: u64,
}

impl SearchLane {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The seed picked from a suggestion, if the text was not edited since
    pub fn committed(&self) -> Option<&SeedSong> {
        self.committed.as_ref()
    }

    /// The committed selection, or the raw text as a free-typed seed
    pub fn seed(&self) -> Option<SeedSong> {
        self.committed
            .clone()
            .or_else(|| SeedSong::from_text(&self.text))
    }
}
