use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most seeds a single recommendation request may carry
pub const MAX_SEEDS: usize = 3;
pub const DEFAULT_RECOMMEND_COUNT: u32 = 9;

/// A song the user picked (or typed) to steer recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSong {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Only set when the seed came from a search match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SeedSong {
    /// A free-typed seed. Returns `None` when the title is blank.
    pub fn from_text(text: &str) -> Option<SeedSong> {
        let title = text.trim();
        if title.is_empty() {
            return None;
        }
        Some(SeedSong {
            title: title.to_string(),
            artist: None,
            year: None,
            id: None,
        })
    }

    /// Commit a search match as a seed
    pub fn from_result(result: &SearchResult) -> SeedSong {
        SeedSong {
            title: result.title.clone(),
            artist: result.artist.clone().filter(|a| !a.trim().is_empty()),
            year: result.year,
            id: result.id.clone().filter(|id| !id.trim().is_empty()),
        }
    }
}

/// Where the backend found a search match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Db,
    Spotify,
    #[serde(other)]
    Other,
}

/// One candidate returned by `/api/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source: Option<SearchSource>,
}

impl SearchResult {
    /// "Title — Artist (Year)", leaving out whatever is missing
    pub fn display_label(&self) -> String {
        let mut label = self.title.clone();
        if let Some(artist) = self.artist.as_deref().filter(|a| !a.trim().is_empty()) {
            label.push_str(" — ");
            label.push_str(artist);
        }
        if let Some(year) = self.year {
            label.push_str(&format!(" ({year})"));
        }
        label
    }
}

/// Response structure for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Popularity filter forwarded to the recommender. Thresholds live server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityMode {
    #[default]
    All,
    Indie,
    Mainstream,
}

impl PopularityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopularityMode::All => "all",
            PopularityMode::Indie => "indie",
            PopularityMode::Mainstream => "mainstream",
        }
    }
}

impl fmt::Display for PopularityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopularityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(PopularityMode::All),
            "indie" => Ok(PopularityMode::Indie),
            "mainstream" => Ok(PopularityMode::Mainstream),
            other => Err(format!(
                "unknown mode '{other}' (expected all, indie or mainstream)"
            )),
        }
    }
}

/// Request body for `/api/recommend`
#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest {
    pub seeds: Vec<SeedSong>,
    pub n: u32,
    pub mode: PopularityMode,
    pub already_shown_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<String>,
}

/// One recommended track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Model similarity to the seeds
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub spotify_uri: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub reasons: Option<Vec<String>>,
}

/// Response structure for `/api/recommend`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<RecommendationItem>,
}

impl RecommendResponse {
    pub fn ids(&self) -> Vec<String> {
        self.recommendations.iter().map(|r| r.id.clone()).collect()
    }
}

/// Interaction events accepted by `/api/feedback`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackEvent {
    Like,
    Dislike,
    Play,
    OpenSpotify,
    ClickRecommendation,
}

impl FromStr for FeedbackEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "like" => Ok(FeedbackEvent::Like),
            "dislike" => Ok(FeedbackEvent::Dislike),
            "play" => Ok(FeedbackEvent::Play),
            "open_spotify" | "open" => Ok(FeedbackEvent::OpenSpotify),
            "click_recommendation" | "click" => Ok(FeedbackEvent::ClickRecommendation),
            other => Err(format!("unknown feedback event '{other}'")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackRequest<'a> {
    pub track_id: &'a str,
    pub event: FeedbackEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<&'a str>,
}

/// Response structure for `/api/ping`
#[derive(Debug, Clone, Deserialize)]
pub struct PingStatus {
    pub ok: bool,
    #[serde(default)]
    pub recommender_ready: bool,
    #[serde(default)]
    pub recommender_error: String,
}
