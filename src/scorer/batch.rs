use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::api::health::BatchHealth;
use crate::api::latency::{LatencyPercentiles, ScoringLatency};
use crate::benchmark::{build_benchmarks, BenchmarkMap};
use crate::db::reader::load_population;
use crate::db::writer::ScoreWriter;
use crate::error::Result;
use crate::scorer::CompositeCalculator;
use crate::types::{InvestmentScore, PropertyRecord};

/// Outcome of one full scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Rows read from the store, decodable or not.
    pub loaded: usize,
    pub scored: usize,
    pub written: usize,
    /// Undecodable rows, rejected properties and failed writes.
    pub failed: usize,
    /// Stale score rows deleted: rejected or vanished properties.
    pub pruned: u64,
    pub benchmark_keys: usize,
    pub top_opportunities: usize,
    pub latency: LatencyPercentiles,
    pub started_at_ns: u64,
    pub finished_at_ns: u64,
}

pub type SharedReport = Arc<RwLock<Option<BatchReport>>>;

struct ChunkOutcome {
    scores: Vec<InvestmentScore>,
    failed: usize,
    latency: Histogram<u64>,
}

/// Scores the whole property population and syncs the score store.
/// Runs once at startup and, in serving mode, again on every interval.
pub struct BatchScorer {
    pool: sqlx::SqlitePool,
    calculator: Arc<CompositeCalculator>,
    workers: usize,
    interval: Duration,
    health: Arc<BatchHealth>,
    latency: Arc<ScoringLatency>,
    last_report: SharedReport,
}

impl BatchScorer {
    pub fn new(
        pool: sqlx::SqlitePool,
        calculator: CompositeCalculator,
        workers: usize,
        interval: Duration,
    ) -> Result<Self> {
        Ok(Self {
            pool,
            calculator: Arc::new(calculator),
            workers: workers.max(1),
            interval,
            health: Arc::new(BatchHealth::new()),
            latency: Arc::new(ScoringLatency::new()?),
            last_report: Arc::new(RwLock::new(None)),
        })
    }

    pub fn health(&self) -> Arc<BatchHealth> {
        Arc::clone(&self.health)
    }

    pub fn last_report(&self) -> SharedReport {
        Arc::clone(&self.last_report)
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // startup batch already ran

        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Scoring batch error: {e}");
            }
        }
    }

    pub async fn run_once(&self) -> Result<BatchReport> {
        self.health.set_batch_running(true);
        let result = self.score_population().await;
        self.health.set_batch_running(false);

        let report = result?;
        self.health.record_batch(report.finished_at_ns, report.failed as u64);
        if let Ok(mut last) = self.last_report.write() {
            *last = Some(report.clone());
        }
        Ok(report)
    }

    async fn score_population(&self) -> Result<BatchReport> {
        let started_at_ns = now_ns();
        let population = load_population(&self.pool).await?;
        let loaded = population.records.len() + population.rejected;
        info!(loaded, rejected = population.rejected, "Scoring batch started");

        // Frozen before the first property is scored.
        let benchmarks = Arc::new(build_benchmarks(
            population.records.iter().map(|r| &r.property),
        ));

        let mut handles = Vec::with_capacity(self.workers);
        for chunk in split_chunks(population.records, self.workers) {
            let calculator = Arc::clone(&self.calculator);
            let benchmarks = Arc::clone(&benchmarks);
            let latency = ScoringLatency::histogram()?;
            handles.push(tokio::task::spawn_blocking(move || {
                score_chunk(&calculator, &benchmarks, chunk, latency)
            }));
        }

        self.latency.reset();
        let mut scores = Vec::with_capacity(loaded);
        let mut failed = population.rejected;
        for handle in handles {
            let outcome = handle.await?;
            self.latency.merge(&outcome.latency)?;
            failed += outcome.failed;
            scores.extend(outcome.scores);
        }

        let writer = ScoreWriter::new(self.pool.clone());
        let calculated_at = now_ns() as i64;
        let written = writer.write_all(&scores, calculated_at).await?;
        failed += written.failed;
        let pruned = writer.prune_stale(calculated_at).await?;

        let report = BatchReport {
            loaded,
            scored: scores.len(),
            written: written.written,
            failed,
            pruned,
            benchmark_keys: benchmarks.len(),
            top_opportunities: scores.iter().filter(|s| s.is_top_opportunity).count(),
            latency: self.latency.percentiles(),
            started_at_ns,
            finished_at_ns: now_ns(),
        };

        info!(
            loaded = report.loaded,
            scored = report.scored,
            written = report.written,
            failed = report.failed,
            pruned = report.pruned,
            benchmark_keys = report.benchmark_keys,
            top_opportunities = report.top_opportunities,
            p50_ns = report.latency.p50_ns,
            p99_ns = report.latency.p99_ns,
            "Scoring batch finished"
        );
        Ok(report)
    }
}

fn score_chunk(
    calculator: &CompositeCalculator,
    benchmarks: &BenchmarkMap,
    chunk: Vec<PropertyRecord>,
    mut latency: Histogram<u64>,
) -> ChunkOutcome {
    let mut scores = Vec::with_capacity(chunk.len());
    let mut failed = 0;

    for record in &chunk {
        let started = Instant::now();
        match calculator.score(&record.property, record.reviews.as_ref(), benchmarks) {
            Ok(score) => {
                latency.saturating_record(started.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64);
                scores.push(score);
            }
            Err(e) => {
                warn!(property_id = %record.property.property_id, "Skipping property: {e}");
                failed += 1;
            }
        }
    }

    ChunkOutcome { scores, failed, latency }
}

/// Contiguous chunks, at most `parts` of them, preserving load order.
fn split_chunks(records: Vec<PropertyRecord>, parts: usize) -> Vec<Vec<PropertyRecord>> {
    let size = records.len().div_ceil(parts.max(1)).max(1);
    let mut chunks = Vec::with_capacity(parts);
    let mut rest = records.into_iter().peekable();
    while rest.peek().is_some() {
        chunks.push(rest.by_ref().take(size).collect());
    }
    chunks
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::db::fixtures::{insert_property, listing, test_pool};
    use crate::db::reader::load_score;
    use crate::types::Property;

    async fn scorer_with(pool: &sqlx::SqlitePool, workers: usize) -> BatchScorer {
        BatchScorer::new(
            pool.clone(),
            CompositeCalculator::new(ScoringConfig::default()),
            workers,
            Duration::from_secs(3600),
        )
        .unwrap()
    }

    async fn seed_market(pool: &sqlx::SqlitePool) {
        for (id, revenue, adr) in [
            ("a", 40_000.0, 200.0),
            ("b", 50_000.0, 250.0),
            ("c", 60_000.0, 300.0),
            ("d", 50_000.0, 350.0),
        ] {
            insert_property(pool, &listing(id, Some(revenue), Some(adr))).await;
        }
    }

    #[test]
    fn chunks_cover_every_record_in_order() {
        let records: Vec<_> = (0..10)
            .map(|i| PropertyRecord {
                property: listing(&format!("p{i}"), None, None),
                reviews: None,
            })
            .collect();

        let chunks = split_chunks(records, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![3usize, 3, 3, 1]);
        let ids: Vec<_> = chunks.iter().flatten().map(|r| r.property.property_id.clone()).collect();
        assert_eq!(ids, (0..10).map(|i| format!("p{i}")).collect::<Vec<_>>());

        assert!(split_chunks(Vec::new(), 4).is_empty());
    }

    #[tokio::test]
    async fn batch_scores_and_persists_population() {
        let pool = test_pool().await;
        seed_market(&pool).await;
        let scorer = scorer_with(&pool, 3).await;

        let report = scorer.run_once().await.unwrap();
        assert_eq!(report.loaded, 4);
        assert_eq!(report.scored, 4);
        assert_eq!(report.written, 4);
        assert_eq!(report.failed, 0);
        assert_eq!(report.benchmark_keys, 1);
        assert_eq!(report.latency.samples, 4);
        assert!(report.finished_at_ns >= report.started_at_ns);

        let c = load_score(&pool, "c").await.unwrap().unwrap();
        assert!((c.revenue_vs_market_avg - 1.2).abs() < 1e-12);
        assert_eq!(c.components.revenue, 100.0);
        assert_eq!(c.bedroom_count, Some(3));

        let health = scorer.health();
        assert_eq!(health.batches_completed(), 1);
        assert_eq!(health.last_batch_at_ns(), report.finished_at_ns);
        assert!(!health.batch_running());
        assert_eq!(scorer.last_report().read().unwrap().as_ref(), Some(&report));
    }

    #[tokio::test]
    async fn invalid_property_is_skipped_not_fatal() {
        let pool = test_pool().await;
        seed_market(&pool).await;
        let overbooked = Property { occupancy: Some(1.5), ..listing("bad", None, None) };
        insert_property(&pool, &overbooked).await;

        let scorer = scorer_with(&pool, 2).await;
        let report = scorer.run_once().await.unwrap();
        assert_eq!(report.loaded, 5);
        assert_eq!(report.scored, 4);
        assert_eq!(report.written, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(scorer.health().last_batch_failed(), 1);

        assert!(load_score(&pool, "bad").await.unwrap().is_none());
        assert!(load_score(&pool, "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rerun_overwrites_instead_of_duplicating() {
        let pool = test_pool().await;
        seed_market(&pool).await;
        let scorer = scorer_with(&pool, 4).await;

        let first = scorer.run_once().await.unwrap();
        let before = load_score(&pool, "b").await.unwrap().unwrap();

        sqlx::query("UPDATE properties SET superhost = 1 WHERE property_id = 'b'")
            .execute(&pool)
            .await
            .unwrap();
        let second = scorer.run_once().await.unwrap();
        assert_eq!(first.scored, second.scored);

        let after = load_score(&pool, "b").await.unwrap().unwrap();
        assert_eq!(after.components.host_status, 60.0);
        assert!(after.total_score > before.total_score);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investment_scores")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 4);
        assert_eq!(second.pruned, 0);
        assert_eq!(scorer.health().batches_completed(), 2);
    }

    #[tokio::test]
    async fn rejected_or_removed_property_loses_its_old_score() {
        let pool = test_pool().await;
        seed_market(&pool).await;
        let scorer = scorer_with(&pool, 2).await;
        scorer.run_once().await.unwrap();
        assert!(load_score(&pool, "b").await.unwrap().is_some());

        sqlx::query("UPDATE properties SET occupancy = 1.5 WHERE property_id = 'b'")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM properties WHERE property_id = 'd'")
            .execute(&pool)
            .await
            .unwrap();

        let report = scorer.run_once().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.written, 2);
        assert_eq!(report.pruned, 2);
        assert!(load_score(&pool, "b").await.unwrap().is_none());
        assert!(load_score(&pool, "d").await.unwrap().is_none());
        assert!(load_score(&pool, "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_store_yields_empty_report() {
        let pool = test_pool().await;
        let report = scorer_with(&pool, 4).await.run_once().await.unwrap();
        assert_eq!(report.loaded, 0);
        assert_eq!(report.scored, 0);
        assert_eq!(report.benchmark_keys, 0);
        assert_eq!(report.latency, LatencyPercentiles::default());
    }
}
