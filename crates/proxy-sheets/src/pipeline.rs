//! Image acquisition pipeline
//!
//! Resolves a (card, face) pair to a cached image, fetching it only on a
//! cache miss. Fetches are paced by the shared [`RateLimiter`] and run on a
//! bounded number of concurrent workers.

use crate::cache::{CacheKey, CacheStore};
use crate::constants::PROGRESS_EVERY;
use crate::fetch::{STATUS_TOO_MANY_REQUESTS, STATUS_UNPROCESSABLE, ImageFetcher, image_url};
use crate::options::FetchOptions;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::rate_limiter::RateLimiter;
use crate::types::{Card, Face, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Result of resolving one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The image is in the cache under this key
    Available(CacheKey),
    /// The source says this face does not exist
    PermanentlyUnavailable,
    /// Timeout, transport error or unexpected status; the card has no image
    /// for this run
    TransientFailure,
}

impl FetchOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Available(_))
    }
}

/// Counts for one `ensure_all` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Distinct cache keys checked
    pub requested: usize,
    pub available: usize,
    pub unavailable: usize,
    pub failed: usize,
}

pub struct ImagePipeline {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn ImageFetcher>,
    limiter: Arc<RateLimiter>,
    options: FetchOptions,
    progress: ProgressSink,
    /// Images written during this run, for optional cleanup
    downloaded: Mutex<HashSet<CacheKey>>,
}

impl ImagePipeline {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn ImageFetcher>,
        limiter: Arc<RateLimiter>,
        options: FetchOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            limiter,
            options,
            progress: ProgressSink::silent(),
            downloaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.progress
    }

    /// Make sure the image for `face` of `card` is cached.
    ///
    /// Only a card without an identifier is an error; every network outcome
    /// is reported through [`FetchOutcome`].
    pub async fn ensure(&self, card: &Card, face: Face) -> Result<FetchOutcome> {
        let key = CacheKey::for_card(card, face);
        if self.store.exists(&key).await {
            return Ok(FetchOutcome::Available(key));
        }

        let url = image_url(card, face, &self.options)?;

        for attempt in 1..=self.options.max_attempts {
            self.limiter.wait().await;

            let response = match self.fetcher.fetch(&url).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("Error downloading image {}: {}", url, e);
                    return Ok(FetchOutcome::TransientFailure);
                }
            };

            if response.is_success() {
                if let Err(e) = self.store.put(&key, &response.body).await {
                    log::warn!("Failed to cache {}: {}", key, e);
                    return Ok(FetchOutcome::TransientFailure);
                }
                self.downloaded
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.clone());
                return Ok(FetchOutcome::Available(key));
            }

            match response.status {
                STATUS_UNPROCESSABLE => {
                    log::debug!("No {} image for {}", face, card.name);
                    return Ok(FetchOutcome::PermanentlyUnavailable);
                }
                STATUS_TOO_MANY_REQUESTS if attempt < self.options.max_attempts => {
                    log::warn!(
                        "Rate limited (429). Backing off for {:?}...",
                        self.options.rate_limit_cooldown
                    );
                    tokio::time::sleep(self.options.rate_limit_cooldown).await;
                }
                STATUS_TOO_MANY_REQUESTS => {}
                status => {
                    log::warn!("Failed to download {} (Status {})", url, status);
                    return Ok(FetchOutcome::TransientFailure);
                }
            }
        }

        log::warn!(
            "Giving up on {} after {} rate-limited attempts",
            url,
            self.options.max_attempts
        );
        Ok(FetchOutcome::TransientFailure)
    }

    /// Ensure `face` for every card, fetching each distinct cache key at
    /// most once. Completion order is unspecified.
    pub async fn ensure_all(&self, cards: &[Card], face: Face) -> Result<BatchSummary> {
        let mut seen = HashSet::new();
        let unique: Vec<&Card> = cards
            .iter()
            .filter(|card| seen.insert(CacheKey::for_card(card, face)))
            .collect();

        let total = unique.len();
        let mut summary = BatchSummary {
            requested: total,
            ..Default::default()
        };
        self.progress
            .send(ProgressUpdate::FetchStarted { face, total });
        if total == 0 {
            return Ok(summary);
        }

        let mut outcomes = stream::iter(unique)
            .map(|card| self.ensure(card, face))
            .buffer_unordered(self.options.concurrency.max(1));

        let mut completed = 0;
        while let Some(outcome) = outcomes.next().await {
            match outcome? {
                FetchOutcome::Available(_) => summary.available += 1,
                FetchOutcome::PermanentlyUnavailable => summary.unavailable += 1,
                FetchOutcome::TransientFailure => summary.failed += 1,
            }
            completed += 1;
            if completed % PROGRESS_EVERY == 0 || completed == total {
                self.progress.send(ProgressUpdate::Fetch {
                    face,
                    completed,
                    total,
                });
            }
        }

        Ok(summary)
    }

    /// Keys of images written during this run
    pub fn downloaded_this_run(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .downloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Delete every image written during this run. Returns how many were removed.
    pub async fn purge_downloaded(&self) -> Result<usize> {
        let keys: Vec<CacheKey> = self
            .downloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for key in &keys {
            if let Err(e) = self.store.remove(key).await {
                log::warn!("Failed to remove {}: {}", key, e);
            }
        }
        Ok(keys.len())
    }
}
