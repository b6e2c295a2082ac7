use clap::Parser;

use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["propensity", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn parses_status_command() {
    let cli = Cli::try_parse_from(["propensity", "status"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn score_defaults_to_text_output() {
    let cli = Cli::try_parse_from(["propensity", "score"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Score {
            limit: 500,
            json: false
        }
    ));
}

#[test]
fn score_accepts_limit_and_json() {
    let cli = Cli::try_parse_from(["propensity", "score", "--limit", "25", "--json"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Score {
            limit: 25,
            json: true
        }
    ));
}

#[test]
fn leads_min_score_is_optional() {
    let cli = Cli::try_parse_from(["propensity", "leads"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Leads {
            min_score: None,
            limit: 25,
            json: false
        }
    ));

    let cli = Cli::try_parse_from(["propensity", "leads", "--min-score", "70"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Leads {
            min_score: Some(s),
            ..
        } if (s - 70.0).abs() < f64::EPSILON
    ));
}

#[test]
fn run_all_skip_flags_parse_independently() {
    let cli = Cli::try_parse_from(["propensity", "run-all", "--skip-triage"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::RunAll {
            skip_macro: false,
            skip_scoring: false,
            skip_triage: true,
            ..
        }
    ));
}

#[test]
fn run_all_macro_series_is_overridable() {
    let cli = Cli::try_parse_from(["propensity", "run-all", "--macro-series", "truck_tonnage"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::RunAll { ref macro_series, .. } if macro_series == "truck_tonnage"
    ));
}

#[test]
fn indicator_parses_series_date_and_value() {
    let cli = Cli::try_parse_from([
        "propensity",
        "indicator",
        "--series",
        "freight_shipments",
        "--date",
        "2026-08-01",
        "--value",
        "104.2",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Indicator { ref series, date, value }
            if series == "freight_shipments"
                && date == chrono::NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date")
                && (value - 104.2).abs() < f64::EPSILON
    ));
}

#[test]
fn a_command_is_required() {
    assert!(Cli::try_parse_from(["propensity"]).is_err());
}

// --help and argument errors resolve at parse time, before config loading
// or a database connection.

#[test]
fn help_needs_no_configuration() {
    let err = Cli::try_parse_from(["propensity", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn unknown_flags_fail_at_parse_time() {
    let err = Cli::try_parse_from(["propensity", "score", "--no-such-flag"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}
