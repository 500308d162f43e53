//! Gazelle JSON API client.
//!
//! Gazelle instances require:
//! - an API key in the Authorization header
//! - rate limiting (most instances allow 10 requests per 10 seconds; we
//!   stay well under with one request per second)

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use async_trait::async_trait;

use super::error::TrackerError;
use super::traits::{OwnedRelease, SubmitRequest, Tracker};
use super::types::{Release, ReleaseGroup};
use crate::config::TrackerConfig;

/// Gazelle client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazelleConfig {
    pub base_url: String,
    pub api_key: String,
    /// Rate limit delay in milliseconds.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
    /// Page size for owned-release listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_rate_limit() -> u64 {
    1000
}

fn default_page_size() -> u32 {
    500
}

impl From<&TrackerConfig> for GazelleConfig {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            rate_limit_ms: default_rate_limit(),
            page_size: config.page_size,
        }
    }
}

/// Gazelle JSON API client.
pub struct GazelleClient {
    client: Client,
    config: GazelleConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
    rate_limit: Duration,
    user_id: Mutex<Option<u64>>,
}

impl GazelleClient {
    /// Create a new Gazelle client.
    pub fn new(config: GazelleConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .user_agent(format!("flacforge/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;

        let rate_limit = Duration::from_millis(config.rate_limit_ms);
        Ok(Self {
            client,
            config,
            last_request: Arc::new(Mutex::new(None)),
            rate_limit,
            user_id: Mutex::new(None),
        })
    }

    fn ajax_url(&self) -> String {
        format!("{}/ajax.php", self.config.base_url.trim_end_matches('/'))
    }

    /// Wait for rate limit if needed.
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.rate_limit {
                let wait_time = self.rate_limit - elapsed;
                debug!("Gazelle rate limit: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, String)],
    ) -> Result<T, TrackerError> {
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(self.ajax_url())
            .header("Authorization", &self.config.api_key)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let envelope: ApiEnvelope<T> = response.json().await?;
        if envelope.status != "success" {
            return Err(TrackerError::api(
                envelope
                    .error
                    .unwrap_or_else(|| "unknown API failure".to_string()),
            ));
        }
        envelope
            .response
            .ok_or_else(|| TrackerError::parse("success status with empty response body"))
    }

    /// The authenticated user's id, fetched once from `action=index`.
    async fn user_id(&self) -> Result<u64, TrackerError> {
        let mut cached = self.user_id.lock().await;
        if let Some(id) = *cached {
            return Ok(id);
        }

        let index: IndexPayload = self
            .get_json(&[("action", "index".to_string())])
            .await?;
        *cached = Some(index.id);
        Ok(index.id)
    }
}

#[async_trait]
impl Tracker for GazelleClient {
    fn name(&self) -> &str {
        "gazelle"
    }

    async fn list_owned(
        &self,
        media_types: &[String],
    ) -> Result<Vec<OwnedRelease>, TrackerError> {
        let user_id = self.user_id().await?;
        let mut owned = Vec::new();
        let mut offset = 0u32;

        loop {
            let mut query = vec![
                ("action", "user_torrents".to_string()),
                ("id", user_id.to_string()),
                ("type", "seeding".to_string()),
                ("limit", self.config.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            for media in media_types {
                query.push(("media[]", media.clone()));
            }

            let page: UserTorrentsPayload = self.get_json(&query).await?;
            let count = page.seeding.len() as u32;
            debug!("Fetched {} owned releases at offset {}", count, offset);

            owned.extend(page.seeding.into_iter().map(|t| OwnedRelease {
                group_id: t.group_id,
                release_id: t.torrent_id,
            }));

            if count < self.config.page_size {
                break;
            }
            offset += count;
        }

        Ok(owned)
    }

    async fn release_group(&self, group_id: u64) -> Result<ReleaseGroup, TrackerError> {
        let result: Result<TorrentGroupPayload, TrackerError> = self
            .get_json(&[
                ("action", "torrentgroup".to_string()),
                ("id", group_id.to_string()),
            ])
            .await;

        match result {
            Ok(payload) => Ok(payload.into_group()),
            Err(TrackerError::Api { message }) if message.contains("bad id") => {
                Err(TrackerError::GroupNotFound(group_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_format(&self, request: SubmitRequest) -> Result<(), TrackerError> {
        self.wait_for_rate_limit().await;

        let torrent_bytes = tokio::fs::read(&request.torrent_path).await?;
        let file_name = request
            .torrent_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.torrent".to_string());

        let (container, encoding) = request.format.produces();
        let mut form = multipart::Form::new()
            .part(
                "file_input",
                multipart::Part::bytes(torrent_bytes)
                    .file_name(file_name)
                    .mime_str("application/x-bittorrent")
                    .map_err(TrackerError::Http)?,
            )
            .text("groupid", request.group_id.to_string())
            .text("format", container.to_string())
            .text("bitrate", encoding.to_string())
            .text("media", request.media.clone())
            .text("release_desc", request.description.clone());

        if request.remaster_year != 0 {
            form = form
                .text("remaster", "on")
                .text("remaster_year", request.remaster_year.to_string())
                .text("remaster_title", request.remaster_title.clone())
                .text("remaster_record_label", request.remaster_label.clone())
                .text(
                    "remaster_catalogue_number",
                    request.remaster_catalogue_number.clone(),
                );
        }

        let response = self
            .client
            .post(self.ajax_url())
            .header("Authorization", &self.config.api_key)
            .query(&[("action", "upload")])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        if envelope.status != "success" {
            return Err(TrackerError::api(
                envelope
                    .error
                    .unwrap_or_else(|| "upload rejected".to_string()),
            ));
        }

        Ok(())
    }
}

// --- wire payloads ---

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct ApiEnvelope<T> {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct IndexPayload {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct UserTorrentsPayload {
    #[serde(default)]
    seeding: Vec<UserTorrentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserTorrentEntry {
    group_id: u64,
    torrent_id: u64,
}

#[derive(Debug, Deserialize)]
struct TorrentGroupPayload {
    group: GroupPayload,
    torrents: Vec<TorrentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupPayload {
    id: u64,
    name: String,
    #[serde(default)]
    year: u16,
    #[serde(default)]
    music_info: Option<MusicInfoPayload>,
}

#[derive(Debug, Deserialize)]
struct MusicInfoPayload {
    #[serde(default)]
    artists: Vec<ArtistPayload>,
}

#[derive(Debug, Deserialize)]
struct ArtistPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentPayload {
    id: u64,
    #[serde(default)]
    media: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    remastered: bool,
    #[serde(default)]
    remaster_year: u16,
    #[serde(default)]
    remaster_title: String,
    #[serde(default)]
    remaster_record_label: String,
    #[serde(default)]
    remaster_catalogue_number: String,
    #[serde(default)]
    scene: bool,
    #[serde(default)]
    reported: bool,
    #[serde(default)]
    lossy_web_approved: bool,
    #[serde(default)]
    lossy_master_approved: bool,
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    file_list: String,
}

impl TorrentGroupPayload {
    fn into_group(self) -> ReleaseGroup {
        let group_id = self.group.id;
        let artist = self
            .group
            .music_info
            .and_then(|mi| mi.artists.into_iter().next())
            .map(|a| a.name)
            .unwrap_or_else(|| "Various Artists".to_string());

        let releases = self
            .torrents
            .into_iter()
            .map(|t| {
                // fileList entries look like "01 - Track.flac{{{12345678}}}"
                // joined by "|||".
                let file_list = t
                    .file_list
                    .split("|||")
                    .filter(|s| !s.is_empty())
                    .map(|entry| {
                        entry
                            .split("{{{")
                            .next()
                            .unwrap_or(entry)
                            .to_string()
                    })
                    .collect();

                Release {
                    id: t.id,
                    group_id,
                    media: t.media,
                    format: t.format,
                    encoding: t.encoding,
                    remastered: t.remastered,
                    remaster_year: t.remaster_year,
                    remaster_title: t.remaster_title,
                    remaster_label: t.remaster_record_label,
                    remaster_catalogue_number: t.remaster_catalogue_number,
                    scene: t.scene,
                    reported: t.reported,
                    lossy_web_approved: t.lossy_web_approved,
                    lossy_master_approved: t.lossy_master_approved,
                    file_path: t.file_path,
                    file_list,
                }
            })
            .collect();

        ReleaseGroup {
            id: group_id,
            artist,
            name: self.group.name,
            year: self.group.year,
            releases,
        }
    }
}
