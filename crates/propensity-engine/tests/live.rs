//! Live tests for the batch stages, using `#[sqlx::test]` against a fresh
//! migrated database. The `migrations` path is relative to the crate root,
//! so `"../../migrations"` resolves to the workspace migration directory.

use chrono::Utc;
use propensity_core::{ScoringWeights, Tier};
use propensity_db::{
    find_or_create_company, latest_snapshot, upsert_signal_snapshot, NewCompany,
    SignalSnapshotUpdate,
};
use propensity_engine::{apply_macro_modifier, ScoringEngine};

#[sqlx::test(migrations = "../../migrations")]
async fn modifier_stamp_preserves_an_earlier_days_components(pool: sqlx::PgPool) {
    let company = find_or_create_company(
        &pool,
        "Acme Fabrication Inc.",
        "acme fabrication",
        "29601",
        &NewCompany::default(),
    )
    .await
    .expect("create failed");

    // Collectors last reported yesterday.
    let yesterday = Utc::now().date_naive().pred_opt().expect("valid date");
    upsert_signal_snapshot(
        &pool,
        company.id,
        yesterday,
        &SignalSnapshotUpdate {
            expansion_score: Some(85.0),
            distress_score: Some(70.0),
            sentiment_score: Some(60.0),
            job_velocity_score: Some(80.0),
            turnover_score: Some(65.0),
            market_tightness_score: Some(75.0),
            macro_modifier: Some(1.0),
            ..SignalSnapshotUpdate::default()
        },
    )
    .await
    .expect("snapshot write failed");

    // No stored series: the modifier defaults to 1.0 but a today row is
    // still written, now carrying yesterday's components.
    let (modifier, stamped) = apply_macro_modifier(&pool, "freight_shipments", 10, 1, 1)
        .await
        .expect("stamp failed");
    assert!((modifier - 1.0).abs() < 1e-9);
    assert_eq!(stamped, 1);

    let today_row = latest_snapshot(&pool, company.id)
        .await
        .expect("latest_snapshot failed")
        .expect("today row should exist");
    assert!(today_row.record_date > yesterday);
    assert_eq!(today_row.expansion_score, Some(85.0));
    assert_eq!(today_row.turnover_score, Some(65.0));

    // Scoring from the stamped row must see the carried history, not an
    // empty snapshot.
    let result = ScoringEngine::new(ScoringWeights::default())
        .score_company(&pool, company.id)
        .await
        .expect("scoring failed");
    assert!(
        (result.propensity_score - 74.25).abs() < 1e-9,
        "score was {}",
        result.propensity_score
    );
    assert_eq!(result.tier, Tier::Warm);
}
