use tracing::{error, warn};

use crate::error::Result;
use crate::types::InvestmentScore;

/// Scores committed per transaction.
pub const WRITE_CHUNK_SIZE: usize = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub written: usize,
    pub failed: usize,
}

impl WriteOutcome {
    /// Rows whose upsert already failed were counted when they failed; a lost
    /// commit only moves the chunk's successful rows over to `failed`.
    fn settle_chunk(&mut self, chunk_written: usize, committed: bool) {
        if committed {
            self.written += chunk_written;
        } else {
            self.failed += chunk_written;
        }
    }
}

/// Persists computed scores into `investment_scores`.
///
/// Every write replaces the whole row, so nothing from an earlier run
/// (sub-scores under an old weight table, say) can survive a rescore.
pub struct ScoreWriter {
    pool: sqlx::SqlitePool,
}

impl ScoreWriter {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert every score. A failing row is logged and counted; the rest
    /// of its chunk still commits.
    pub async fn write_all(&self, scores: &[InvestmentScore], calculated_at: i64) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();

        for chunk in scores.chunks(WRITE_CHUNK_SIZE) {
            let mut tx = self.pool.begin().await?;
            let mut chunk_written = 0;
            for score in chunk {
                match upsert(&mut *tx, score, calculated_at).await {
                    Ok(()) => chunk_written += 1,
                    Err(e) => {
                        warn!(property_id = %score.property_id, "Score write failed: {e}");
                        outcome.failed += 1;
                    }
                }
            }
            let committed = match tx.commit().await {
                Ok(()) => true,
                Err(e) => {
                    error!("Score chunk commit failed: {e}");
                    false
                }
            };
            outcome.settle_chunk(chunk_written, committed);
        }

        Ok(outcome)
    }

    /// Delete every score not written at `calculated_at`: properties that were
    /// rejected this run or no longer exist. Returns the number of rows removed.
    pub async fn prune_stale(&self, calculated_at: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM investment_scores WHERE calculated_at <> ?")
            .bind(calculated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn write(&self, score: &InvestmentScore, calculated_at: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut *conn, score, calculated_at).await
    }
}

async fn upsert(conn: &mut sqlx::SqliteConnection, s: &InvestmentScore, calculated_at: i64) -> Result<()> {
    let breakdown = serde_json::to_string(&s.breakdown)?;
    let c = &s.components;

    sqlx::query(
        r#"
        INSERT INTO investment_scores (
            property_id, total_score, grade, investment_tier,
            revenue_score, occupancy_score, positioning_score, review_score,
            amenity_score, host_status_score, seasonal_score,
            market_area, bedroom_count, revenue_vs_market_avg, revenue_potential_gap,
            is_top_opportunity, score_breakdown, calculated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(property_id) DO UPDATE SET
            total_score = excluded.total_score,
            grade = excluded.grade,
            investment_tier = excluded.investment_tier,
            revenue_score = excluded.revenue_score,
            occupancy_score = excluded.occupancy_score,
            positioning_score = excluded.positioning_score,
            review_score = excluded.review_score,
            amenity_score = excluded.amenity_score,
            host_status_score = excluded.host_status_score,
            seasonal_score = excluded.seasonal_score,
            market_area = excluded.market_area,
            bedroom_count = excluded.bedroom_count,
            revenue_vs_market_avg = excluded.revenue_vs_market_avg,
            revenue_potential_gap = excluded.revenue_potential_gap,
            is_top_opportunity = excluded.is_top_opportunity,
            score_breakdown = excluded.score_breakdown,
            calculated_at = excluded.calculated_at
        "#,
    )
    .bind(&s.property_id)
    .bind(s.total_score)
    .bind(s.grade.as_str())
    .bind(s.investment_tier.as_str())
    .bind(c.revenue)
    .bind(c.occupancy)
    .bind(c.positioning)
    .bind(c.reviews)
    .bind(c.amenities)
    .bind(c.host_status)
    .bind(c.seasonal)
    .bind(&s.market_area)
    .bind(s.bedroom_count)
    .bind(s.revenue_vs_market_avg)
    .bind(s.revenue_potential_gap)
    .bind(s.is_top_opportunity)
    .bind(breakdown)
    .bind(calculated_at)
    .execute(conn)
    .await?;

    Ok(())
}
