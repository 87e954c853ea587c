mod api;
mod benchmark;
mod config;
mod db;
mod error;
mod scorer;
mod stats;
mod types;

use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::{Config, DEFAULT_TOP_LIMIT};
use crate::db::reader::top_scores;
use crate::error::Result;
use crate::scorer::{BatchScorer, CompositeCalculator};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    let w = &cfg.scoring.weights;
    info!(
        revenue = w.revenue_performance,
        occupancy = w.occupancy_quality,
        positioning = w.market_positioning,
        reviews = w.review_strength,
        amenities = w.amenity_value,
        host_status = w.host_status,
        seasonal = w.seasonal_stability,
        top_threshold = cfg.scoring.top_opportunity_threshold,
        workers = cfg.score_workers,
        "Scoring configuration loaded"
    );

    // --- Startup batch ---
    let scorer = BatchScorer::new(
        pool.clone(),
        CompositeCalculator::new(cfg.scoring.clone()),
        cfg.score_workers,
        Duration::from_secs(cfg.score_interval_secs),
    )?;
    let report = scorer.run_once().await?;
    info!(
        "Batch complete: {} loaded, {} scored, {} written, {} failed, {} pruned, {} top opportunities",
        report.loaded,
        report.scored,
        report.written,
        report.failed,
        report.pruned,
        report.top_opportunities,
    );

    log_top_opportunities(&pool).await?;

    if !cfg.serve_api {
        return Ok(());
    }

    // --- Serving mode: periodic rescoring + read API ---
    let api_state = ApiState {
        pool: pool.clone(),
        health: scorer.health(),
        last_report: scorer.last_report(),
    };
    info!("Rescoring every {}s", cfg.score_interval_secs);
    tokio::spawn(async move { scorer.run().await });

    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_top_opportunities(pool: &sqlx::SqlitePool) -> Result<()> {
    let top = top_scores(pool, None, 0.0, DEFAULT_TOP_LIMIT).await?;
    if top.is_empty() {
        info!("No scored properties yet");
        return Ok(());
    }

    info!("Top {} investment opportunities:", top.len());
    for (rank, s) in top.iter().enumerate() {
        info!(
            property_id = %s.property_id,
            market_area = %s.market_area,
            "#{:<2} {:>6.2} | {:<2} | {:<15} | {}BR | {:.2}x market",
            rank + 1,
            s.total_score,
            s.grade.as_str(),
            s.investment_tier.as_str(),
            s.bedroom_count.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string()),
            s.revenue_vs_market_avg,
        );
    }
    Ok(())
}
