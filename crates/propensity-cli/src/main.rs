use clap::{Parser, Subcommand};

mod commands;
#[cfg(test)]
mod tests;

#[derive(Debug, Parser)]
#[command(name = "propensity")]
#[command(about = "Lead propensity scoring and contact triage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full daily pass: macro modifier, scoring, triage.
    RunAll {
        /// Skip stamping the macro modifier onto today's snapshots.
        #[arg(long)]
        skip_macro: bool,
        /// Skip the batch scoring stage.
        #[arg(long)]
        skip_scoring: bool,
        /// Skip the contact triage stage.
        #[arg(long)]
        skip_triage: bool,
        /// Maximum companies per stage.
        #[arg(long, default_value_t = 500)]
        limit: i64,
        /// Indicator series driving the macro modifier.
        #[arg(long, default_value = "freight_shipments")]
        macro_series: String,
    },
    /// Score a batch of companies from their latest snapshots.
    Score {
        #[arg(long, default_value_t = 500)]
        limit: i64,
        /// Emit the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List companies whose latest score clears the hot-lead threshold.
    Leads {
        /// Override the configured minimum score.
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long, default_value_t = 25)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
    /// Search contacts for hot leads without a qualified decision-maker.
    Triage {
        #[arg(long, default_value_t = 15)]
        limit: i64,
    },
    /// Record one monthly economic indicator observation.
    Indicator {
        #[arg(long)]
        series: String,
        /// Observation month, as YYYY-MM-DD.
        #[arg(long)]
        date: chrono::NaiveDate,
        #[arg(long)]
        value: f64,
    },
    /// Apply pending database migrations.
    Migrate,
    /// Check configuration and store connectivity.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Argument errors and --help must not depend on configuration or a
    // reachable database.
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    // The subscriber comes up before config loading so config-time warnings
    // (weight sums, defaults) are captured. PROPENSITY_LOG_LEVEL is the
    // fallback when RUST_LOG is unset.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = std::env::var("PROPENSITY_LOG_LEVEL")
                    .unwrap_or_else(|_| "info".to_string());
                tracing_subscriber::EnvFilter::new(level)
            }),
        )
        .init();

    let config = propensity_core::load_app_config_from_env()?;
    let pool = propensity_db::connect_pool(
        &config.database_url,
        propensity_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::RunAll {
            skip_macro,
            skip_scoring,
            skip_triage,
            limit,
            macro_series,
        } => {
            commands::run_all(
                &pool,
                &config,
                &commands::RunAllOptions {
                    skip_macro,
                    skip_scoring,
                    skip_triage,
                    limit,
                    macro_series,
                },
            )
            .await
        }
        Commands::Score { limit, json } => commands::run_score(&pool, &config, limit, json).await,
        Commands::Leads {
            min_score,
            limit,
            json,
        } => {
            let min = min_score.unwrap_or(config.hot_lead_threshold);
            commands::run_leads(&pool, min, limit, json).await
        }
        Commands::Triage { limit } => commands::run_triage(&pool, &config, limit).await,
        Commands::Indicator {
            series,
            date,
            value,
        } => commands::run_indicator(&pool, &series, date, value).await,
        Commands::Migrate => commands::run_migrate(&pool).await,
        Commands::Status => commands::run_status(&pool, &config).await,
    }
}
