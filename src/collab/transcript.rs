//! YouTube caption fetching.
//!
//! The watch page embeds a `captionTracks` JSON array in its player
//! response; each track has a `baseUrl` serving timedtext XML with one
//! `<text start=".." dur="..">` element per caption line.

use crate::collab::{TranscriptSegment, TranscriptSource};
use crate::error::WorkflowError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
}

/// [`TranscriptSource`] that scrapes captions from youtube.com.
#[derive(Debug, Clone)]
pub struct YouTubeTranscripts {
    client: reqwest::Client,
    /// Preferred caption language, e.g. "en".
    language: String,
}

impl YouTubeTranscripts {
    pub fn new(timeout_secs: u64) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WorkflowError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            language: "en".to_string(),
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    async fn get_text(&self, url: &str, video_id: &str) -> Result<String, WorkflowError> {
        let failed = |detail: String| WorkflowError::Transcript {
            video_id: video_id.to_string(),
            detail,
        };
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        response.text().await.map_err(|e| failed(e.to_string()))
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, WorkflowError> {
        let watch_url = format!("{WATCH_URL}?v={video_id}");
        let page = self.get_text(&watch_url, video_id).await?;

        let tracks = caption_tracks(&page).ok_or_else(|| WorkflowError::Transcript {
            video_id: video_id.to_string(),
            detail: "transcripts are disabled or unavailable for this video".into(),
        })?;
        let track = tracks
            .iter()
            .find(|t| t.language_code.starts_with(&self.language))
            .or_else(|| tracks.first())
            .ok_or_else(|| WorkflowError::Transcript {
                video_id: video_id.to_string(),
                detail: "no caption tracks listed".into(),
            })?;
        debug!(
            "Using {} caption track of {} for {}",
            track.language_code,
            tracks.len(),
            video_id
        );

        let xml = self.get_text(&track.base_url, video_id).await?;
        Ok(parse_timedtext(&xml))
    }
}

/// Read the JSON array that follows the `captionTracks` key. The player
/// response is embedded in script text, so only the array itself is parsed
/// and whatever comes after it is ignored.
fn caption_tracks(watch_page: &str) -> Option<Vec<CaptionTrack>> {
    let at = watch_page.find(CAPTION_TRACKS_KEY)? + CAPTION_TRACKS_KEY.len();
    serde_json::Deserializer::from_str(&watch_page[at..])
        .into_iter::<Vec<CaptionTrack>>()
        .next()?
        .ok()
}

/// Parse timedtext XML into segments.
///
/// Caption text arrives double-escaped: the XML layer is decoded by the
/// parser and the remaining HTML entities by an HTML fragment pass.
pub(crate) fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    let doc = match roxmltree::Document::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Unreadable timedtext XML: {}", e);
            return Vec::new();
        }
    };

    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "text")
        .map(|n| TranscriptSegment {
            start: seconds(n.attribute("start")),
            duration: seconds(n.attribute("dur")),
            text: decode_caption(n.text().unwrap_or_default()),
        })
        .collect()
}

fn seconds(attr: Option<&str>) -> f64 {
    attr.and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

fn decode_caption(raw: &str) -> String {
    let fragment = scraper::Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
