//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-company failures inside a batch are logged and counted
//! by the stage itself; a handler only returns an error when the stage
//! cannot run at all.

use sqlx::PgPool;

use propensity_core::AppConfig;
use propensity_engine::ScoringEngine;
use propensity_triage::{SerpApiClient, SerpApiConfig, TitleClassifier};

pub(crate) struct RunAllOptions {
    pub skip_macro: bool,
    pub skip_scoring: bool,
    pub skip_triage: bool,
    pub limit: i64,
    pub macro_series: String,
}

/// The full daily pass, stage by stage. Each stage prints its own summary;
/// a stage failure is reported but does not stop the later stages, so a
/// broken indicator feed still leaves fresh scores behind.
pub(crate) async fn run_all(
    pool: &PgPool,
    config: &AppConfig,
    opts: &RunAllOptions,
) -> anyhow::Result<()> {
    let mut stage_failures = 0usize;

    if opts.skip_macro {
        println!("macro: skipped");
    } else {
        match propensity_engine::apply_macro_modifier(
            pool,
            &opts.macro_series,
            opts.limit,
            config.db_write_max_retries,
            config.db_write_backoff_base_ms,
        )
        .await
        {
            Ok((modifier, stamped)) => {
                println!(
                    "macro: modifier {modifier:.2} from series '{}', stamped {stamped} companies",
                    opts.macro_series
                );
            }
            Err(e) => {
                stage_failures += 1;
                eprintln!("error: macro stage failed: {e}");
            }
        }
    }

    if opts.skip_scoring {
        println!("scoring: skipped");
    } else {
        match run_score(pool, config, opts.limit, false).await {
            Ok(()) => {}
            Err(e) => {
                stage_failures += 1;
                eprintln!("error: scoring stage failed: {e}");
            }
        }
    }

    if opts.skip_triage {
        println!("triage: skipped");
    } else if config.serpapi_key.is_none() {
        println!("triage: skipped (SERPAPI_KEY is not set)");
    } else {
        match run_triage(pool, config, opts.limit.min(15)).await {
            Ok(()) => {}
            Err(e) => {
                stage_failures += 1;
                eprintln!("error: triage stage failed: {e}");
            }
        }
    }

    if stage_failures > 0 {
        println!("run-all finished with {stage_failures} failed stage(s)");
    } else {
        println!("run-all finished");
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct ScoreRunSummary<'a> {
    scored: usize,
    failed: usize,
    tiers: propensity_engine::TierCounts,
    results: &'a [propensity_core::ScoreResult],
}

/// Score a batch and print the tier summary, or the full result set as
/// JSON when requested.
pub(crate) async fn run_score(
    pool: &PgPool,
    config: &AppConfig,
    limit: i64,
    json: bool,
) -> anyhow::Result<()> {
    let engine = ScoringEngine::from_config(config);
    let outcome = engine.score_all(pool, limit).await?;

    if json {
        let summary = ScoreRunSummary {
            scored: outcome.results.len(),
            failed: outcome.failed,
            tiers: outcome.tiers,
            results: &outcome.results,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "scored {} companies ({} failed): {} hot / {} warm / {} cool / {} cold",
        outcome.results.len(),
        outcome.failed,
        outcome.tiers.hot,
        outcome.tiers.warm,
        outcome.tiers.cool,
        outcome.tiers.cold,
    );
    for result in outcome.results.iter().take(10) {
        println!(
            "  {:>6.1} [{}] {}",
            result.propensity_score, result.tier, result.company_name
        );
    }
    Ok(())
}

/// List companies whose latest score clears `min_score`.
pub(crate) async fn run_leads(
    pool: &PgPool,
    min_score: f64,
    limit: i64,
    json: bool,
) -> anyhow::Result<()> {
    let leads = propensity_db::list_hot_leads(pool, min_score, limit).await?;

    if json {
        #[derive(serde::Serialize)]
        struct LeadLine<'a> {
            company_id: uuid::Uuid,
            company_name: &'a str,
            city: Option<&'a str>,
            state: Option<&'a str>,
            propensity_score: f64,
            score_tier: &'a str,
            record_date: chrono::NaiveDate,
        }
        let lines: Vec<LeadLine<'_>> = leads
            .iter()
            .map(|l| LeadLine {
                company_id: l.company_id,
                company_name: &l.company_name,
                city: l.city.as_deref(),
                state: l.state.as_deref(),
                propensity_score: l.propensity_score,
                score_tier: &l.score_tier,
                record_date: l.record_date,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    if leads.is_empty() {
        println!("no leads at or above {min_score:.1}");
        return Ok(());
    }
    println!("{} leads at or above {min_score:.1}:", leads.len());
    for lead in &leads {
        let place = match (lead.city.as_deref(), lead.state.as_deref()) {
            (Some(city), Some(state)) => format!(" ({city}, {state})"),
            (Some(city), None) => format!(" ({city})"),
            (None, Some(state)) => format!(" ({state})"),
            (None, None) => String::new(),
        };
        println!(
            "  {:>6.1} [{}] {}{place}  scored {}",
            lead.propensity_score, lead.score_tier, lead.company_name, lead.record_date
        );
    }
    Ok(())
}

/// Search decision-maker contacts for the current triage targets.
pub(crate) async fn run_triage(pool: &PgPool, config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let api_key = config
        .serpapi_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("triage requires SERPAPI_KEY to be set"))?;

    let client = SerpApiClient::new(&SerpApiConfig {
        api_key,
        request_timeout_secs: config.search_request_timeout_secs,
        inter_request_delay_ms: config.search_inter_request_delay_ms,
    })
    .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;

    let keywords = propensity_core::load_keyword_config(&config.keywords_path)?;
    let classifier = TitleClassifier::new(keywords);

    let summary = propensity_triage::run_triage_batch(
        pool,
        &client,
        &classifier,
        limit,
        client.inter_request_delay(),
    )
    .await?;

    println!(
        "triaged {} companies: {} matched, {} kept existing, {} no match, {} failed",
        summary.searched, summary.matched, summary.kept_existing, summary.no_match, summary.failed
    );
    Ok(())
}

/// Record one indicator observation and report the derived direction.
pub(crate) async fn run_indicator(
    pool: &PgPool,
    series: &str,
    date: chrono::NaiveDate,
    value: f64,
) -> anyhow::Result<()> {
    let direction = propensity_engine::record_indicator_point(pool, series, date, value).await?;
    match direction {
        Some(d) => println!("recorded {series} {date} = {value} (trend {})", d.as_str()),
        None => println!("recorded {series} {date} = {value} (no prior point)"),
    }
    Ok(())
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = propensity_db::run_migrations(pool).await?;
    if applied == 0 {
        println!("migrations up to date");
    } else {
        println!("applied {applied} migration(s)");
    }
    Ok(())
}

pub(crate) async fn run_status(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    propensity_db::health_check(pool).await?;
    let companies = propensity_db::count_companies(pool).await?;
    println!("database: ok ({companies} companies tracked)");
    println!("environment: {}", config.env);
    println!(
        "weights: expansion {:.2} / distress {:.2} / job velocity {:.2} / sentiment {:.2} / market tightness {:.2} / macro {:.2} (sum {:.3})",
        config.weights.expansion,
        config.weights.distress,
        config.weights.job_velocity,
        config.weights.sentiment,
        config.weights.market_tightness,
        config.weights.macro_trend,
        config.weights.sum(),
    );
    println!(
        "search: {}",
        if config.serpapi_key.is_some() {
            "configured"
        } else {
            "not configured (triage disabled)"
        }
    );
    Ok(())
}
