//! Catalog HTTP client
//!
//! [`CatalogApi`] is the seam the orchestrator talks to; [`CatalogClient`] is the
//! `reqwest` implementation against the public catalog API.

use super::models::{
    ArtistItem, ArtistRef, ArtistRelationship, CatalogEntity, EntityKind, MusicVideoInfo,
    RawDocument, RawResource, SongInfo,
};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Error, Result};
use crate::types::LyricsType;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Page size for artist relationship listings
const ARTIST_PAGE_SIZE: usize = 100;

/// Catalog metadata lookups plus plain HTTP fetches (manifests, artwork)
///
/// Every method is awaited to completion by the caller; implementations do not
/// need to be reentrant beyond `Send + Sync`.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch an album or playlist with every page of its track list flattened
    async fn entity(&self, storefront: &str, id: &str) -> Result<CatalogEntity>;

    /// Fetch a song's catalog entry, including its enhanced manifest URL
    async fn song(&self, storefront: &str, id: &str) -> Result<SongInfo>;

    /// Fetch a music video's catalog entry
    async fn music_video(&self, storefront: &str, id: &str) -> Result<MusicVideoInfo>;

    /// Fetch an artist's name and picture
    async fn artist(&self, storefront: &str, id: &str) -> Result<ArtistRef>;

    /// List an artist's albums or videos, all pages, sorted by release date ascending
    async fn artist_items(
        &self,
        storefront: &str,
        id: &str,
        relationship: ArtistRelationship,
    ) -> Result<Vec<ArtistItem>>;

    /// Fetch the TTML lyrics document for a song
    async fn lyrics(&self, storefront: &str, id: &str, kind: LyricsType) -> Result<String>;

    /// GET a URL as text (manifests)
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// GET a URL as bytes (artwork)
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed catalog client
pub struct CatalogClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    media_user_token: String,
    language: String,
}

impl CatalogClient {
    /// Create a client from catalog configuration
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let base = Url::parse(&config.api_base)
            .map_err(|e| Error::config("api_base", format!("invalid API base URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token: config.bearer_token().to_string(),
            media_user_token: config.media_user_token.clone(),
            language: config.language.clone(),
        })
    }

    fn catalog_url(&self, storefront: &str, path: &str) -> Result<Url> {
        self.base
            .join(&format!("/v1/catalog/{storefront}/{path}"))
            .map_err(|e| Error::Other(format!("invalid catalog path {path}: {e}")))
    }

    /// GET a catalog URL with auth headers and decode the JSON document
    async fn get_document(&self, resource: &str, url: Url) -> Result<RawDocument> {
        debug!(%url, "catalog request");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Origin", "https://music.apple.com")
            .header("media-user-token", &self.media_user_token)
            .send()
            .await
            .map_err(|e| CatalogError::Transport {
                resource: resource.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| CatalogError::Transport {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| {
            CatalogError::Decode {
                resource: resource.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Take the resource with `id` out of a document (or the first one when `id` is None)
    fn take_resource(resource: &str, doc: RawDocument, id: Option<&str>) -> Result<RawResource> {
        let found = match id {
            Some(id) => doc.data.into_iter().find(|r| r.id == id),
            None => doc.data.into_iter().next(),
        };
        found.ok_or_else(|| {
            CatalogError::Missing {
                resource: resource.to_string(),
            }
            .into()
        })
    }

    /// Follow `next` links relative to the API base until exhausted
    async fn follow_pages(&self, resource: &str, mut next: Option<String>) -> Result<Vec<RawResource>> {
        let mut collected = Vec::new();
        while let Some(path) = next.take().filter(|p| !p.is_empty()) {
            let mut url = self
                .base
                .join(&path)
                .map_err(|e| Error::Other(format!("invalid next link {path}: {e}")))?;
            url.query_pairs_mut()
                .append_pair("l", &self.language)
                .append_pair("include", "albums,artists");
            let page = self.get_document(resource, url).await?;
            collected.extend(page.data);
            next = page.next;
        }
        Ok(collected)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Other(format!(
                "GET {} returned HTTP {}",
                url,
                status.as_u16()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn entity(&self, storefront: &str, id: &str) -> Result<CatalogEntity> {
        let kind = EntityKind::from_id(id);
        let resource = format!("{}/{}", kind.collection(), id);
        let mut url = self.catalog_url(storefront, &resource)?;
        url.query_pairs_mut()
            .append_pair("omit[resource]", "autos")
            .append_pair("include", "tracks,artists,record-labels")
            .append_pair("include[songs]", "artists,albums")
            .append_pair("fields[artists]", "name,artwork")
            .append_pair("fields[albums:albums]", "artistName,artwork,name,releaseDate,url")
            .append_pair("fields[record-labels]", "name")
            .append_pair("extend", "editorialVideo")
            .append_pair("l", &self.language);

        let doc = self.get_document(&resource, url).await?;
        let raw = Self::take_resource(&resource, doc, None)?;
        let next = raw
            .relationships
            .tracks
            .as_ref()
            .and_then(|t| t.next.clone());
        let extra = self.follow_pages(&resource, next).await?;
        if !extra.is_empty() {
            debug!(entity_id = %id, extra = extra.len(), "fetched additional track pages");
        }
        Ok(raw.into_entity(storefront, extra))
    }

    async fn song(&self, storefront: &str, id: &str) -> Result<SongInfo> {
        let resource = format!("songs/{id}");
        let mut url = self.catalog_url(storefront, &resource)?;
        url.query_pairs_mut()
            .append_pair("extend", "extendedAssetUrls")
            .append_pair("include", "albums")
            .append_pair("l", &self.language);
        let doc = self.get_document(&resource, url).await?;
        Ok(Self::take_resource(&resource, doc, Some(id))?.into_song_info())
    }

    async fn music_video(&self, storefront: &str, id: &str) -> Result<MusicVideoInfo> {
        let resource = format!("music-videos/{id}");
        let mut url = self.catalog_url(storefront, &resource)?;
        url.query_pairs_mut().append_pair("l", &self.language);
        let doc = self.get_document(&resource, url).await?;
        Ok(Self::take_resource(&resource, doc, None)?.into_music_video())
    }

    async fn artist(&self, storefront: &str, id: &str) -> Result<ArtistRef> {
        let resource = format!("artists/{id}");
        let mut url = self.catalog_url(storefront, &resource)?;
        url.query_pairs_mut()
            .append_pair("l", &self.language)
            .append_pair("fields[artists]", "name,artwork");
        let doc = self.get_document(&resource, url).await?;
        Ok(Self::take_resource(&resource, doc, None)?.into_artist_ref())
    }

    async fn artist_items(
        &self,
        storefront: &str,
        id: &str,
        relationship: ArtistRelationship,
    ) -> Result<Vec<ArtistItem>> {
        let resource = format!("artists/{}/{}", id, relationship.path_segment());
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let mut url = self.catalog_url(storefront, &resource)?;
            url.query_pairs_mut()
                .append_pair("limit", &ARTIST_PAGE_SIZE.to_string())
                .append_pair("offset", &offset.to_string())
                .append_pair("l", &self.language);
            let page = self.get_document(&resource, url).await?;
            items.extend(page.data.into_iter().map(RawResource::into_artist_item));
            offset += ARTIST_PAGE_SIZE;
            if page.next.as_deref().is_none_or(str::is_empty) {
                break;
            }
        }
        // Unparseable dates sort first, as a missing date would
        items.sort_by_key(|item| NaiveDate::parse_from_str(&item.release_date, "%Y-%m-%d").ok());
        Ok(items)
    }

    async fn lyrics(&self, storefront: &str, id: &str, kind: LyricsType) -> Result<String> {
        let resource = format!("songs/{}/{}", id, kind.path_segment());
        let mut url = self.catalog_url(storefront, &resource)?;
        url.query_pairs_mut().append_pair("l", &self.language);
        let doc = self.get_document(&resource, url).await?;
        Self::take_resource(&resource, doc, None)?
            .attributes
            .ttml
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CatalogError::Missing { resource }.into())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url).await?;
        String::from_utf8(bytes).map_err(|e| Error::Other(format!("{url} is not UTF-8: {e}")))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes(url).await
    }
}
