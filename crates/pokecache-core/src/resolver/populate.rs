//! Bulk population of the store from the full catalog index.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::CatalogSource;
use crate::models::CatalogEntry;

use super::Resolver;

/// Entries fetched concurrently per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Pause between batches, in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for PopulateSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

/// Cumulative counts reported after each batch and returned at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateProgress {
    pub total: usize,
    pub processed: usize,
    pub cached: usize,
    pub failed: usize,
}

impl<S: CatalogSource> Resolver<S> {
    /// Fetch and cache every Pokémon in the catalog.
    ///
    /// Entries are processed in batches of `batch_size`: a batch's fetches
    /// run concurrently and the whole batch finishes before the next starts.
    /// Failed entries are logged and counted, never fatal. `on_progress` is
    /// called after every batch; an error from it is logged and ignored.
    /// If the catalog index itself cannot be fetched, nothing is processed.
    pub async fn populate_all<F>(&self, mut on_progress: F) -> PopulateProgress
    where
        F: FnMut(&PopulateProgress) -> anyhow::Result<()>,
    {
        let entries = match self.source.fetch_catalog().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to fetch catalog index");
                return PopulateProgress::default();
            }
        };

        let mut progress = PopulateProgress {
            total: entries.len(),
            ..Default::default()
        };
        info!(total = progress.total, "Populating store from catalog");

        let batch_size = self.settings.batch_size.max(1);
        for (index, batch) in entries.chunks(batch_size).enumerate() {
            if index > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }

            let results = join_all(batch.iter().map(|entry| self.populate_entry(entry))).await;
            for stored in results {
                progress.processed += 1;
                if stored {
                    progress.cached += 1;
                } else {
                    progress.failed += 1;
                }
            }
            debug!(
                batch = index,
                processed = progress.processed,
                total = progress.total,
                "Batch complete"
            );

            if let Err(e) = on_progress(&progress) {
                warn!(error = %e, "Progress callback failed, continuing");
            }
        }

        info!(
            cached = progress.cached,
            failed = progress.failed,
            "Catalog population finished"
        );
        progress
    }

    async fn populate_entry(&self, entry: &CatalogEntry) -> bool {
        match self.source.fetch_url(&entry.url).await {
            Ok(payload) => self.complete(payload).await.1,
            Err(e) => {
                warn!(name = %entry.name, url = %entry.url, error = %e, "Skipping catalog entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::PokemonStore;
    use crate::resolver::testing::{FakeSource, SPECIES_BASE};

    fn resolver(source: FakeSource, batch_size: usize) -> Resolver<FakeSource> {
        let store = Arc::new(PokemonStore::open_in_memory().expect("open store"));
        Resolver::new(store, source).with_settings(PopulateSettings {
            batch_size,
            batch_delay: Duration::ZERO,
        })
    }

    fn catalog(source: &FakeSource, count: i64) -> Vec<CatalogEntry> {
        (1..=count)
            .map(|id| source.add_pokemon(id, &format!("mon-{}", id), true))
            .collect()
    }

    fn plain_catalog(source: &FakeSource, count: i64) -> Vec<CatalogEntry> {
        (1..=count)
            .map(|id| source.add_pokemon(id, &format!("mon-{}", id), false))
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = PopulateSettings::default();
        assert_eq!(settings.batch_size, 20);
        assert_eq!(settings.batch_delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_populate_all_caches_everything() {
        let source = FakeSource::new();
        let entries = catalog(&source, 45);
        source.set_catalog(entries);
        let resolver = resolver(source, 20);

        let mut reports = Vec::new();
        let summary = resolver
            .populate_all(|p| {
                reports.push(*p);
                Ok(())
            })
            .await;

        assert_eq!(summary.total, 45);
        assert_eq!(summary.cached, 45);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.processed, summary.total);
        assert_eq!(resolver.store().count(), 45);

        let processed: Vec<usize> = reports.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![20, 40, 45]);
    }

    #[tokio::test]
    async fn test_populate_all_skips_failed_entry() {
        let source = FakeSource::new();
        let entries = catalog(&source, 40);
        source.fail_url(&entries[12].url);
        source.set_catalog(entries);
        let resolver = resolver(source, 20);

        let summary = resolver.populate_all(|_| Ok(())).await;

        assert_eq!(summary.processed, 40);
        assert_eq!(summary.cached, 39);
        assert_eq!(summary.failed, 1);
        assert!(resolver.store().get_by_id(13).is_none());
        for id in (1..=12).chain(14..=40) {
            assert!(resolver.store().get_by_id(id).is_some(), "missing id {}", id);
        }
    }

    #[tokio::test]
    async fn test_populate_all_ignores_callback_errors() {
        let source = FakeSource::new();
        let entries = catalog(&source, 30);
        source.set_catalog(entries);
        let resolver = resolver(source, 10);

        let mut calls = 0;
        let summary = resolver
            .populate_all(|_| {
                calls += 1;
                anyhow::bail!("progress display went away")
            })
            .await;

        assert_eq!(calls, 3);
        assert_eq!(summary.cached, 30);
        assert_eq!(resolver.store().count(), 30);
    }

    #[tokio::test]
    async fn test_populate_all_without_catalog() {
        let resolver = resolver(FakeSource::new(), 20);
        let mut calls = 0;
        let summary = resolver
            .populate_all(|_| {
                calls += 1;
                Ok(())
            })
            .await;

        assert_eq!(summary, PopulateProgress::default());
        assert_eq!(calls, 0);
        assert_eq!(resolver.store().count(), 0);
    }

    #[tokio::test]
    async fn test_populate_all_overwrites_existing() {
        let source = FakeSource::new();
        let entries = catalog(&source, 3);
        source.set_catalog(entries);
        let resolver = resolver(source, 20);

        resolver.resolve("2").await.expect("prefetch");
        let summary = resolver.populate_all(|_| Ok(())).await;

        assert_eq!(summary.cached, 3);
        assert_eq!(resolver.store().count(), 3);
    }

    #[tokio::test]
    async fn test_populate_species_failure_still_counts_as_cached() {
        let source = FakeSource::new();
        let entries = catalog(&source, 2);
        source.fail_url(&format!("{}/2/", SPECIES_BASE));
        source.set_catalog(entries);
        let resolver = resolver(source, 20);

        let summary = resolver.populate_all(|_| Ok(())).await;
        assert_eq!(summary.cached, 2);
        assert!(resolver.store().get_by_id(2).expect("cached").data.species.is_none());
    }

    #[tokio::test]
    async fn test_populate_all_bounds_concurrency_per_batch() {
        let source = FakeSource::new();
        let entries = plain_catalog(&source, 25);
        let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
        source.set_catalog(entries);
        let resolver = resolver(source, 10);

        let summary = resolver.populate_all(|_| Ok(())).await;
        assert_eq!(summary.cached, 25);

        // Each batch runs all of its fetches together, never more
        assert_eq!(resolver.source.peak_in_flight(), 10);

        // No fetch of batch N+1 starts before every fetch of batch N finished
        let starts = resolver.source.url_starts();
        assert_eq!(starts.len(), 25);
        for (url, finished_before) in starts {
            let position = urls.iter().position(|u| *u == url).expect("catalog url");
            let batch_start = (position / 10) * 10;
            assert!(
                finished_before >= batch_start,
                "{} started with only {} fetches finished",
                url,
                finished_before
            );
            assert!(finished_before <= batch_start, "{} started late", url);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_populate_all_waits_between_batches() {
        let source = FakeSource::new();
        let entries = plain_catalog(&source, 5);
        source.set_catalog(entries);
        let store = Arc::new(PokemonStore::open_in_memory().expect("open store"));
        let resolver = Resolver::new(store, source).with_settings(PopulateSettings {
            batch_size: 2,
            batch_delay: Duration::from_millis(100),
        });

        let started = tokio::time::Instant::now();
        let mut report_times = Vec::new();
        let summary = resolver
            .populate_all(|_| {
                report_times.push(started.elapsed());
                Ok(())
            })
            .await;

        assert_eq!(summary.cached, 5);
        // Three batches: no pause before the first, one before each of the rest
        assert_eq!(report_times.len(), 3);
        for (batch, elapsed) in report_times.into_iter().enumerate() {
            let pauses = Duration::from_millis(100) * batch as u32;
            assert!(
                elapsed >= pauses && elapsed < pauses + Duration::from_millis(50),
                "batch {} reported at {:?}",
                batch,
                elapsed
            );
        }
    }
}
