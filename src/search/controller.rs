use super::lane::SearchLane;
use super::timer::TimerQueue;
use crate::client::{DEFAULT_SEARCH_LIMIT, MIN_QUERY_CHARS};
use crate::models::{MAX_SEEDS, SearchResult, SeedSong};
use std::time::{Duration, Instant};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct PendingQuery {
    lane: usize,
    query: String,
}

/// A search the event loop should run now. Hand the results back with
/// [`SeedSearchController::apply_results`] along with the same `seq`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDispatch {
    pub lane: usize,
    pub seq: u64,
    pub query: String,
    pub limit: usize,
}

/// Owns the seed lanes of the recommend screen.
///
/// Input goes in through [`on_input`](Self::on_input) and [`select`](Self::select);
/// debounced searches come out of [`poll`](Self::poll). Only the most recently
/// dispatched search of a lane may update it, so a slow early response can never
/// overwrite a later one.
#[derive(Debug)]
pub struct SeedSearchController {
    lanes: Vec<SearchLane>,
    timers: TimerQueue<PendingQuery>,
    debounce: Duration,
    limit: usize,
    next_seq: u64,
}

impl Default for SeedSearchController {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE, DEFAULT_SEARCH_LIMIT)
    }
}

impl SeedSearchController {
    pub fn new(debounce: Duration, limit: usize) -> Self {
        SeedSearchController {
            lanes: (0..MAX_SEEDS).map(|_| SearchLane::default()).collect(),
            timers: TimerQueue::new(),
            debounce,
            limit,
            next_seq: 0,
        }
    }

    pub fn lane(&self, lane: usize) -> Option<&SearchLane> {
        self.lanes.get(lane)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// When the event loop should next call [`poll`](Self::poll)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Bump the lane's accepted sequence to a value no dispatch carries
    fn invalidate(&mut self, lane: usize) {
        self.next_seq += 1;
        if let Some(state) = self.lanes.get_mut(lane) {
            state.latest_seq = self.next_seq;
            state.loading = false;
        }
    }

    fn cancel_pending(&mut self, lane: usize) {
        if let Some(handle) = self.lanes.get_mut(lane).and_then(|state| state.pending.take()) {
            self.timers.cancel(handle);
        }
    }

    /// The lane's text changed. Returns false for an unknown lane.
    ///
    /// Any committed seed is dropped. Short queries clear the suggestions right away;
    /// anything else replaces the lane's pending search with one due after the
    /// debounce window.
    pub fn on_input(&mut self, lane: usize, text: &str, now: Instant) -> bool {
        if lane >= self.lanes.len() {
            return false;
        }
        self.cancel_pending(lane);

        let state = &mut self.lanes[lane];
        state.text = text.to_string();
        state.committed = None;

        let query = text.trim().to_string();
        if query.chars().count() < MIN_QUERY_CHARS {
            state.results.clear();
            self.invalidate(lane);
            return true;
        }

        let handle = self
            .timers
            .schedule(now, self.debounce, PendingQuery { lane, query });
        self.lanes[lane].pending = Some(handle);
        true
    }

    /// Fire due debounce timers and return the searches to run
    pub fn poll(&mut self, now: Instant) -> Vec<SearchDispatch> {
        let mut dispatches = Vec::new();
        for (handle, pending) in self.timers.take_due(now) {
            let Some(state) = self.lanes.get_mut(pending.lane) else {
                continue;
            };
            if state.pending == Some(handle) {
                state.pending = None;
            }
            self.next_seq += 1;
            state.latest_seq = self.next_seq;
            state.loading = true;
            log::debug!("Lane {} searching for '{}'", pending.lane + 1, pending.query);
            dispatches.push(SearchDispatch {
                lane: pending.lane,
                seq: self.next_seq,
                query: pending.query,
                limit: self.limit,
            });
        }
        dispatches
    }

    /// Deliver search results. Returns false (and changes nothing) when a newer
    /// search was dispatched for the lane, or the lane was cleared, since `seq`.
    pub fn apply_results(&mut self, lane: usize, seq: u64, results: Vec<SearchResult>) -> bool {
        let Some(state) = self.lanes.get_mut(lane) else {
            return false;
        };
        if state.latest_seq != seq {
            log::debug!("Dropping stale results for lane {} (seq {seq})", lane + 1);
            return false;
        }
        state.results = results;
        state.loading = false;
        true
    }

    /// Commit suggestion `index` of `lane` as that lane's seed and close the list
    pub fn select(&mut self, lane: usize, index: usize) -> Option<SeedSong> {
        let result = self.lanes.get(lane)?.results.get(index)?.clone();
        self.cancel_pending(lane);

        let seed = SeedSong::from_result(&result);
        let state = &mut self.lanes[lane];
        state.text = result.display_label();
        state.committed = Some(seed.clone());
        state.results.clear();
        self.invalidate(lane);
        Some(seed)
    }

    /// Seeds for a request: committed selections, else non-blank free text
    pub fn seeds(&self) -> Vec<SeedSong> {
        self.lanes.iter().filter_map(SearchLane::seed).collect()
    }

    pub fn has_seed(&self) -> bool {
        self.lanes.iter().any(|lane| lane.seed().is_some())
    }

    /// Cancel every timer and ignore anything still in flight
    pub fn teardown(&mut self) {
        if !self.timers.is_empty() {
            log::debug!("Cancelling pending searches");
        }
        self.timers.cancel_all();
        for lane in 0..self.lanes.len() {
            self.lanes[lane].pending = None;
            self.invalidate(lane);
        }
    }
}
