//! Catalog query interface
//!
//! The playback core never builds catalog queries itself; the UI does and
//! hands the resulting tracks over. [`InMemoryCatalog`] serves offline
//! use and tests.

use crate::error::{PlaybackError, Result};
use crate::types::Track;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default number of tracks per catalog page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Filter, sort and page for a track listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Free-text filter (title or artist)
    pub filter: Option<String>,

    /// Sort key (`title`, `artist`, `-published_at`, ...)
    pub sort: Option<String>,

    /// Page number, starting at 1 (0 is treated as 1)
    pub page: u32,
}

impl CatalogQuery {
    pub fn search(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            sort: None,
            page: 1,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Source of tracks
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch one page of tracks
    async fn fetch_tracks(&self, query: &CatalogQuery) -> Result<Vec<Track>>;

    /// Fetch a single track
    async fn fetch_track_by_id(&self, id: i64) -> Result<Track>;
}

/// Catalog over a fixed list of tracks
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    tracks: Vec<Track>,
    page_size: usize,
}

impl InMemoryCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn matches(track: &Track, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        track.title.to_lowercase().contains(&needle)
            || track.artist.to_lowercase().contains(&needle)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn fetch_tracks(&self, query: &CatalogQuery) -> Result<Vec<Track>> {
        let mut tracks: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| query.filter.as_deref().map_or(true, |f| Self::matches(t, f)))
            .cloned()
            .collect();

        if let Some(sort) = query.sort.as_deref() {
            let (key, descending) = match sort.strip_prefix('-') {
                Some(key) => (key, true),
                None => (sort, false),
            };
            match key {
                "title" => tracks.sort_by(|a, b| a.title.cmp(&b.title)),
                "artist" => tracks.sort_by(|a, b| a.artist.cmp(&b.artist)),
                "id" => tracks.sort_by_key(|t| t.id),
                "published_at" => {
                    tracks.sort_by(|a, b| a.video.published_at.cmp(&b.video.published_at));
                }
                other => {
                    return Err(PlaybackError::Catalog(format!("unknown sort key: {}", other)));
                }
            }
            if descending {
                tracks.reverse();
            }
        }

        let page = query.page.max(1) as usize;
        Ok(tracks
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .collect())
    }

    async fn fetch_track_by_id(&self, id: i64) -> Result<Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| PlaybackError::Catalog(format!("track not found: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Video;

    fn track(id: i64, title: &str, artist: &str) -> Track {
        Track {
            id,
            video: Video {
                id: format!("v{}", id),
                ..Default::default()
            },
            title: title.to_string(),
            artist: artist.to_string(),
            is_original: false,
            start_at: None,
            end_at: None,
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![
            track(1, "Starlight", "Aoi"),
            track(2, "Blue Bird", "Mika"),
            track(3, "Stardust", "Mika"),
            track(4, "Moon", "Aoi"),
        ])
    }

    #[tokio::test]
    async fn filter_matches_title_or_artist() {
        let catalog = catalog();

        let result = catalog.fetch_tracks(&CatalogQuery::search("star")).await.unwrap();
        assert_eq!(result.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

        let result = catalog.fetch_tracks(&CatalogQuery::search("mika")).await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn sort_and_page() {
        let catalog = catalog().with_page_size(3);
        let query = CatalogQuery::default().with_sort("-title");

        let first = catalog.fetch_tracks(&query).await.unwrap();
        let second = catalog.fetch_tracks(&query.clone().with_page(2)).await.unwrap();

        assert_eq!(first.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(second.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn unknown_sort_is_an_error() {
        let result = catalog()
            .fetch_tracks(&CatalogQuery::default().with_sort("rating"))
            .await;
        assert!(matches!(result, Err(PlaybackError::Catalog(_))));
    }

    #[tokio::test]
    async fn fetch_by_id() {
        let catalog = catalog();
        assert_eq!(catalog.fetch_track_by_id(4).await.unwrap().title, "Moon");
        assert!(catalog.fetch_track_by_id(9).await.is_err());
    }
}
