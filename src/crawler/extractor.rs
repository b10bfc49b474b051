//! Item page resolution
//!
//! The extractor turns a list of candidate links into a lazy, pull-based
//! stream of records. Each pull visits links until one yields a record, so
//! nothing is buffered and every record can be written before the next
//! request is made. A link that fails for any reason is skipped.

use crate::crawler::fetcher::RetryingHttpClient;
use crate::crawler::types::{CandidateLink, ExtractedRecord};
use crate::url::CatalogTarget;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Creates record streams over item links
pub struct ItemExtractor<'a> {
    client: &'a RetryingHttpClient,
    target: &'a CatalogTarget,
    delay: Duration,
}

impl<'a> ItemExtractor<'a> {
    /// # Arguments
    ///
    /// * `client` - Client used for every item request
    /// * `target` - Catalog origin and identifier pattern
    /// * `delay` - Pause before each item request, including the first
    pub fn new(client: &'a RetryingHttpClient, target: &'a CatalogTarget, delay: Duration) -> Self {
        Self {
            client,
            target,
            delay,
        }
    }

    /// Starts a fresh stream over `links`, consumed in order
    pub fn extract(&self, links: Vec<CandidateLink>) -> RecordStream<'a> {
        RecordStream {
            client: self.client,
            target: self.target,
            delay: self.delay,
            links: links.into_iter(),
            cancel: None,
            attempted: 0,
            skipped: 0,
            interrupted: false,
        }
    }
}

/// A finite, non-restartable sequence of extracted records
pub struct RecordStream<'a> {
    client: &'a RetryingHttpClient,
    target: &'a CatalogTarget,
    delay: Duration,
    links: std::vec::IntoIter<CandidateLink>,
    cancel: Option<CancellationToken>,
    attempted: u64,
    skipped: u64,
    interrupted: bool,
}

impl RecordStream<'_> {
    /// Stops pulling further links once `token` is cancelled
    ///
    /// Without this, a long run of skipped links would only notice a
    /// cancellation once the next record is produced.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Pulls the next record
    ///
    /// Returns `None` when the links are exhausted or the stream was
    /// cancelled (see [`RecordStream::was_interrupted`]).
    pub async fn next(&mut self) -> Option<ExtractedRecord> {
        loop {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                self.interrupted = true;
                return None;
            }

            let link = self.links.next()?;

            match self.resolve(&link).await {
                Some(record) => return Some(record),
                None => self.skipped += 1,
            }
        }
    }

    /// Visits one link and reads the identifier from its final URL
    async fn resolve(&mut self, link: &CandidateLink) -> Option<ExtractedRecord> {
        let Some(url) = self.target.resolve(link.as_str()) else {
            tracing::debug!("Skipping unresolvable link {}", link);
            return None;
        };

        tokio::time::sleep(self.delay).await;
        self.attempted += 1;

        let response = match self.client.get(url.as_str(), &[]).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", url, e);
                return None;
            }
        };

        if !response.is_success() {
            tracing::debug!("Skipping {}: HTTP {}", url, response.status);
            return None;
        }

        let record = self
            .target
            .id_pattern
            .extract(&response.final_url)
            .and_then(ExtractedRecord::new);

        if record.is_none() {
            tracing::debug!("No identifier in final URL {}", response.final_url);
        }

        record
    }

    /// Links for which a request was made
    pub fn attempted(&self) -> u64 {
        self.attempted
    }

    /// Links that produced no record
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// True if the stream ended because of cancellation
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }
}
