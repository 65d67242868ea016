//! Widget media id resolution
//!
//! The widget is cued by an 11-character embed id. Catalog videos carry a
//! watch URL, so the id is parsed out of it.

use crate::types::Video;
use url::Url;

const EMBED_ID_LEN: usize = 11;

/// Resolve the embed id for a video
///
/// Tries the URL first (`watch?v=`, `youtu.be/`, `/embed/`, `/v/`,
/// `/shorts/`, `/live/`), then falls back to the catalog id when it is
/// itself a well-formed embed id.
pub fn embed_id(video: &Video) -> Option<String> {
    extract_embed_id(&video.url).or_else(|| {
        is_embed_id(&video.id).then(|| video.id.clone())
    })
}

/// Parse an embed id out of a video URL
pub fn extract_embed_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com"
        || host == "music.youtube.com"
        || host == "youtube-nocookie.com"
    {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "v" | "shorts" | "live") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_embed_id(id))
}

fn is_embed_id(id: &str) -> bool {
    id.len() == EMBED_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_urls() {
        assert_eq!(
            extract_embed_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_embed_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn short_and_embed_urls() {
        assert_eq!(
            extract_embed_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_embed_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_embed_id("https://www.youtube.com/live/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(extract_embed_id(""), None);
        assert_eq!(extract_embed_id("not a url"), None);
        assert_eq!(extract_embed_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_embed_id("https://vimeo.com/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn falls_back_to_catalog_id() {
        let video = Video {
            id: "dQw4w9WgXcQ".to_string(),
            url: String::new(),
            ..Default::default()
        };
        assert_eq!(embed_id(&video).as_deref(), Some("dQw4w9WgXcQ"));

        let video = Video {
            id: "42".to_string(),
            url: String::new(),
            ..Default::default()
        };
        assert_eq!(embed_id(&video), None);
    }
}
