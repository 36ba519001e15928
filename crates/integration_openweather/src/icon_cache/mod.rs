//! Weather icon cache
//!
//! Resolves an icon identifier to a decoded image. The local cache directory is
//! consulted first; on a miss the icon is fetched from the provider and the
//! fetched bytes are written back by a background task.
//!
//! `get_icon` never fails. Transport and decode problems yield a placeholder
//! image, and persistence outcomes are reported separately through `tracing`
//! and the optional [`PersistEvent`] channel.
//!
//! Concurrent requests for the same uncached identifier are not coalesced:
//! each one fetches and each one writes the file, last writer wins.

mod store;

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use reqwest::Url;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, warn};

pub use store::IconStore;

use crate::config::OpenWeatherConfig;
use crate::error::WeatherError;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Path of the icon endpoint below the icon base URL
const ICON_PATH: &str = "img/w";

/// Where a resolved icon came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    /// Read from the local cache directory
    Cache,
    /// Fetched from the provider
    Network,
    /// Substituted after a failed lookup and fetch
    Placeholder,
}

impl std::fmt::Display for IconSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// A decoded weather icon
#[derive(Debug, Clone)]
pub struct Icon {
    image: DynamicImage,
    source: IconSource,
}

impl Icon {
    /// The empty image handed out when no real icon could be produced
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            image: DynamicImage::new_rgba8(0, 0),
            source: IconSource::Placeholder,
        }
    }

    /// Decoded image
    #[must_use]
    pub const fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the icon, returning the decoded image
    #[must_use]
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Where the icon came from
    #[must_use]
    pub const fn source(&self) -> IconSource {
        self.source
    }

    /// Whether this is the placeholder image
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.source == IconSource::Placeholder
    }

    /// Width and height in pixels
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Outcome of one background write to the cache directory
#[derive(Debug)]
pub struct PersistEvent {
    /// Icon identifier that was written
    pub icon_id: String,
    /// Path of the written file, or the write error
    pub outcome: Result<PathBuf, WeatherError>,
}

/// Check that an icon identifier can serve as a URL path segment and file stem
///
/// # Errors
///
/// Returns `WeatherError::InvalidUrl` for empty identifiers or identifiers with
/// characters other than ASCII alphanumerics, `-` and `_`.
pub fn validate_icon_id(icon_id: &str) -> Result<(), WeatherError> {
    let valid = !icon_id.is_empty()
        && icon_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(WeatherError::InvalidUrl(format!(
            "icon identifier {icon_id:?} is not a valid path segment"
        )))
    }
}

/// Decode image bytes on the blocking pool
async fn decode_image(data: Bytes) -> Result<DynamicImage, WeatherError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&data))
        .await
        .map_err(|e| WeatherError::Decode(format!("decode task failed: {e}")))?
        .map_err(|e| WeatherError::Decode(e.to_string()))
}

/// Two-tier icon cache: local directory first, provider second
pub struct IconCache {
    store: IconStore,
    transport: Arc<dyn HttpTransport>,
    icon_base: Url,
    persist_events: Option<UnboundedSender<PersistEvent>>,
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("store", &self.store)
            .field("icon_base", &self.icon_base.as_str())
            .field("persist_events", &self.persist_events.is_some())
            .finish_non_exhaustive()
    }
}

impl IconCache {
    /// Create an icon cache backed by `reqwest`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &OpenWeatherConfig) -> Result<Self, WeatherError> {
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create an icon cache over an existing transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(
        config: &OpenWeatherConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, WeatherError> {
        config.validate()?;

        Ok(Self {
            store: IconStore::new(config.resolve_cache_dir()),
            transport,
            icon_base: config.icon_base()?,
            persist_events: None,
        })
    }

    /// Report every background write to `sender`
    #[must_use]
    pub fn with_persist_events(mut self, sender: UnboundedSender<PersistEvent>) -> Self {
        self.persist_events = Some(sender);
        self
    }

    /// The filesystem tier
    #[must_use]
    pub const fn store(&self) -> &IconStore {
        &self.store
    }

    /// Remote URL of an icon
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::InvalidUrl` if the identifier cannot form a URL.
    pub fn icon_url(&self, icon_id: &str) -> Result<Url, WeatherError> {
        validate_icon_id(icon_id)?;
        let raw = format!(
            "{}/{ICON_PATH}/{icon_id}.png",
            self.icon_base.as_str().trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|e| WeatherError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Resolve an icon, preferring the cache directory over the network
    ///
    /// Always yields an image; see the module docs for the failure policy.
    #[instrument(skip(self))]
    pub async fn get_icon(&self, icon_id: &str) -> Icon {
        if let Err(e) = validate_icon_id(icon_id) {
            warn!(error = %e, "Rejected icon identifier, using placeholder");
            return Icon::placeholder();
        }

        match self.lookup(icon_id).await {
            Ok(image) => {
                debug!("Icon cache hit");
                return Icon {
                    image,
                    source: IconSource::Cache,
                };
            },
            Err(e) => debug!(reason = %e, "Icon cache miss"),
        }

        self.fetch_from_network(icon_id).await
    }

    /// Read and decode a cached icon; any failure counts as a miss
    async fn lookup(&self, icon_id: &str) -> Result<DynamicImage, WeatherError> {
        let data = self.store.load(icon_id).await?;
        decode_image(data)
            .await
            .map_err(|e| WeatherError::CacheMiss(format!("{icon_id}: {e}")))
    }

    async fn fetch_from_network(&self, icon_id: &str) -> Icon {
        let url = match self.icon_url(icon_id) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build icon URL, using placeholder");
                return Icon::placeholder();
            },
        };

        debug!(%url, "Fetching icon from network");

        let response = match self.transport.get(&url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(status = response.status, "Icon request rejected, using placeholder");
                return Icon::placeholder();
            },
            Err(e) => {
                warn!(error = %e, "Icon request failed, using placeholder");
                return Icon::placeholder();
            },
        };

        match decode_image(response.body.clone()).await {
            Ok(image) => {
                self.spawn_persist(icon_id, response.body);
                Icon {
                    image,
                    source: IconSource::Network,
                }
            },
            Err(e) => {
                warn!(error = %e, "Fetched icon is not a valid image, using placeholder");
                Icon::placeholder()
            },
        }
    }

    /// Write fetched bytes in the background; the caller does not wait on it
    fn spawn_persist(&self, icon_id: &str, data: Bytes) {
        let store = self.store.clone();
        let events = self.persist_events.clone();
        let icon_id = icon_id.to_string();

        tokio::spawn(async move {
            let outcome = store.save(&icon_id, &data).await;

            match &outcome {
                Ok(path) => info!(icon_id = %icon_id, path = %path.display(), "Saved icon to cache"),
                Err(e) => error!(icon_id = %icon_id, error = %e, "Failed to persist icon"),
            }

            if let Some(events) = events {
                // The observer may have gone away; the write result is already logged
                let _ = events.send(PersistEvent { icon_id, outcome });
            }
        });
    }
}
