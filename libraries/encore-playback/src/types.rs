//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Video record a track is sourced from
///
/// Mirrors the catalog service's video entry. Only `id` and `url` matter to
/// playback; the rest is carried through for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Catalog identifier of the video
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Watch or embed URL the widget id is parsed from
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub thumbnail_path: String,

    /// Publicly viewable
    #[serde(default)]
    pub is_open: bool,

    #[serde(default)]
    pub is_member_only: bool,

    /// Archived live stream rather than an uploaded video
    #[serde(default)]
    pub is_stream: bool,

    #[serde(default)]
    pub unplayable: bool,

    #[serde(default)]
    pub published_at: Option<String>,
}

/// A playable song entry: a window inside a video
///
/// `id` is the catalog song id. It is not unique inside a queue, and the same
/// song can be sourced from more than one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub video: Video,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub is_original: bool,

    /// Window start in seconds (`None` = from the beginning)
    #[serde(default)]
    pub start_at: Option<u32>,

    /// Window end in seconds (`None` = to the end of the video)
    #[serde(default)]
    pub end_at: Option<u32>,
}

impl Track {
    /// Whether `other` is the same song from the same video
    pub fn is_same_song(&self, other: &Track) -> bool {
        same_song(self, other)
    }

    /// Window start in seconds, `0` when unbounded
    pub fn start_seconds(&self) -> f64 {
        f64::from(self.start_at.unwrap_or(0))
    }

    /// Widget media id for this track, if the video URL yields one
    pub fn embed_id(&self) -> Option<String> {
        crate::media::embed_id(&self.video)
    }
}

/// Song identity used for adjacency decisions
///
/// Both the song id and the video id must match.
pub fn same_song(a: &Track, b: &Track) -> bool {
    a.id == b.id && a.video.id == b.video.id
}

/// Where a queued item came from (UI and analytics only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOrigin {
    Search,
    Playlist,
    History,
    Stream,
}

/// Track as placed in the playback queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    #[serde(flatten)]
    pub track: Track,

    #[serde(default, rename = "addedFrom", skip_serializing_if = "Option::is_none")]
    pub added_from: Option<QueueOrigin>,

    /// Local playlist the item was queued from
    #[serde(default, rename = "playlistId", skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<PlaylistId>,
}

/// Local playlist id
///
/// Stored queues carry numeric ids; newer entries may use strings. Both
/// are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaylistId {
    Number(i64),
    Text(String),
}

impl From<i64> for PlaylistId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<String> for PlaylistId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<&str> for PlaylistId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl QueueItem {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            added_from: None,
            playlist_id: None,
        }
    }

    /// Tag the item with its origin
    pub fn from_origin(track: Track, origin: QueueOrigin) -> Self {
        Self {
            track,
            added_from: Some(origin),
            playlist_id: None,
        }
    }

    /// Tag the item as queued from a local playlist
    pub fn from_playlist(track: Track, playlist_id: impl Into<PlaylistId>) -> Self {
        Self {
            track,
            added_from: Some(QueueOrigin::Playlist),
            playlist_id: Some(playlist_id.into()),
        }
    }

    pub fn is_same_song(&self, other: &QueueItem) -> bool {
        same_song(&self.track, &other.track)
    }
}

impl From<Track> for QueueItem {
    fn from(track: Track) -> Self {
        Self::new(track)
    }
}

/// Playback status as reported by the widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Nothing loaded yet
    #[default]
    Unstarted,

    /// Loaded but not playing
    Cued,

    Playing,

    Paused,

    Buffering,

    /// Reached the end of the video
    Ended,

    /// Gave up after exhausting retries
    Error,
}

impl PlayerState {
    /// Map the widget's numeric state code
    ///
    /// Unknown codes yield `None`.
    pub fn from_widget_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    #[serde(rename = "none", alias = "off")]
    Off,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

/// Why the current track last changed
///
/// Read by the UI to decide whether to explain a track change and by
/// analytics to avoid counting the same play twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionReason {
    /// User picked a track or removed the current one
    Manual,

    /// Moved within the same song (restart, or adjacent duplicate)
    QueueNavigation,

    /// Widget reported the end of the track
    #[serde(rename = "auto-end", alias = "auto-advance")]
    AutoAdvance,

    /// Playback passed the end of the track's window
    AutoJump,

    /// Retries exhausted
    Error,
}

impl TransitionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::QueueNavigation => "queue-navigation",
            Self::AutoAdvance => "auto-end",
            Self::AutoJump => "auto-jump",
            Self::Error => "error",
        }
    }
}
