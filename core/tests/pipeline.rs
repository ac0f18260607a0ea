//! End-to-end tests: CSV files in, two CSV reports out.
//!
//! 1. A complete dataset produces both reports with the expected verdicts
//! 2. Missing tables and columns degrade instead of failing
//! 3. No referral_id column means no summary report
//! 4. Identical inputs produce byte-identical outputs
//! 5. An unwritable output directory is the one fatal error

use referral_recon_core::{
    config::PipelineConfig,
    error::ReconError,
    loader::read_table,
    pipeline::ReportPipeline,
    table::Table,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const USER_REFERRALS: &str = "\
id,referral_id,referral_source,referral_at,referrer_id,referee_id,referee_name,referee_phone,referral_reward_id,transaction_id,updated_at,user_referral_status_id
1,R1,User Sign Up,2024-01-05T10:00:00+07:00,U1,P1,Budi,0811,W1,T1,2024-01-11 00:00:00,S1
2,R2,Lead,2024-01-06 09:00:00,U2,L2,Sari,0812,,,2024-01-07 00:00:00,S2
3,R3,Draft Transaction,2024-01-07 09:00:00,U1,P3,Andi,0813,W1,,2024-01-08 00:00:00,S2
";

const STATUSES: &str = "\
id,description,created_at
S1,Berhasil,2023-01-01
S2,Menunggu,2023-01-01
S3,Tidak Berhasil,2023-01-01
";

const REWARDS: &str = "\
id,reward_value,created_at
W1,50,2023-01-01
";

const PAID_TRANSACTIONS: &str = "\
transaction_id,transaction_status,transaction_at,transaction_location,transaction_type
T1,PAID,2024-01-10 08:00:00,Jakarta,NEW
";

const REFERRAL_LOGS: &str = "\
id,user_referral_id,source_transaction_id,created_at,is_reward_granted,reward_granted_at
G1,R1,T1,2024-01-10 09:00:00,True,2024-01-10 09:00:00
G2,R1,T1,2024-01-09 09:00:00,False,
";

// Deliberately under the alias name and with padded headers.
const LEAD_LOGS: &str = "\
id , lead_id , source_category
1,L2,Walk In
";

const USER_LOGS: &str = "\
id,user_id,name,phone_number,homeclub,membership_expired_date,is_deleted
1,U1,Ana,0899,Senayan,2025-01-01,False
2,U2,Bayu,0898,Kemang,2023-01-01,True
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write fixture");
}

fn full_dataset() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "user_referrals.csv", USER_REFERRALS);
    write(dir.path(), "user_referral_statuses.csv", STATUSES);
    write(dir.path(), "referral_rewards.csv", REWARDS);
    write(dir.path(), "paid_transactions.csv", PAID_TRANSACTIONS);
    write(dir.path(), "user_referral_logs.csv", REFERRAL_LOGS);
    write(dir.path(), "lead_logs.csv", LEAD_LOGS);
    write(dir.path(), "user_logs.csv", USER_LOGS);
    dir
}

fn config(input: &Path, output: &Path) -> PipelineConfig {
    PipelineConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        ..Default::default()
    }
}

fn row_where<'a>(table: &'a Table, column: &str, value: &str) -> Vec<usize> {
    (0..table.len())
        .filter(|r| table.cell(*r, column) == Some(value))
        .collect()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: complete dataset
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn complete_dataset_produces_both_reports() {
    init_logging();
    let input = full_dataset();
    let output = tempfile::tempdir().unwrap();
    let cfg = config(input.path(), output.path());

    let result = ReportPipeline::with_run_id("e2e-1".into(), cfg.clone())
        .run()
        .expect("pipeline run");

    assert_eq!(result.run.base_rows, 3);
    assert_eq!(result.run.event_rows, 4, "R1 fans out over two log rows");
    assert_eq!(result.run.summary_rows, Some(3));
    assert_eq!(result.run.joins_applied(), 6);

    let events = read_table(&cfg.report_path()).unwrap();
    let summary = read_table(&cfg.summary_path()).unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(summary.len(), 3);
    assert_eq!(summary.columns()[0], "referral_id");
    assert_eq!(events.columns()[0], "referral_details_id");
    assert!(!events.has_column("num_reward_days"), "no source carries it");
}

#[test]
fn event_rows_carry_the_expected_verdicts() {
    let input = full_dataset();
    let output = tempfile::tempdir().unwrap();
    let cfg = config(input.path(), output.path());
    ReportPipeline::with_run_id("e2e-2".into(), cfg.clone())
        .run()
        .unwrap();

    let events = read_table(&cfg.report_path()).unwrap();

    let r1 = row_where(&events, "referral_id", "R1");
    assert_eq!(r1.len(), 2);
    // The granted log row is valid; the ungranted one is not.
    assert_eq!(events.cell(r1[0], "is_reward_granted"), Some("True"));
    assert_eq!(events.cell(r1[0], "is_business_logic_valid"), Some("True"));
    assert_eq!(events.cell(r1[1], "is_business_logic_valid"), Some("False"));
    // 10:00 at +07:00 is 03:00 UTC.
    assert_eq!(events.cell(r1[0], "referral_at"), Some("2024-01-05 03:00:00"));
    assert_eq!(events.cell(r1[0], "referral_source_category"), Some("Online"));
    assert_eq!(events.cell(r1[0], "referrer_name"), Some("Ana"));
    assert_eq!(events.cell(r1[0], "transaction_location"), Some("Jakarta"));

    let r2 = row_where(&events, "referral_id", "R2")[0];
    assert_eq!(events.cell(r2, "referral_source_category"), Some("Walk In"));
    assert_eq!(events.cell(r2, "referral_status"), Some("Menunggu"));
    assert_eq!(events.cell(r2, "referrer_not_deleted"), Some("False"));
    assert_eq!(events.cell(r2, "referrer_membership_not_expired"), Some("False"));
    assert_eq!(events.cell(r2, "is_business_logic_valid"), Some("True"));

    let r3 = row_where(&events, "referral_id", "R3")[0];
    assert_eq!(events.cell(r3, "referral_source_category"), Some("Offline"));
    assert_eq!(events.cell(r3, "reward_value"), Some("50"));
    assert_eq!(events.cell(r3, "is_business_logic_valid"), Some("False"));
}

#[test]
fn summary_rows_reduce_each_referral() {
    let input = full_dataset();
    let output = tempfile::tempdir().unwrap();
    let cfg = config(input.path(), output.path());
    let result = ReportPipeline::with_run_id("e2e-3".into(), cfg.clone())
        .run()
        .unwrap();

    let summary = read_table(&cfg.summary_path()).unwrap();
    let ids: Vec<_> = (0..summary.len())
        .map(|r| summary.cell(r, "referral_id"))
        .collect();
    assert_eq!(ids, vec![Some("R1"), Some("R2"), Some("R3")]);

    assert_eq!(summary.cell(0, "is_business_logic_valid"), Some("True"));
    assert_eq!(summary.cell(0, "reward_granted_at"), Some("2024-01-10 09:00:00"));
    assert_eq!(summary.cell(2, "is_business_logic_valid"), Some("False"));

    assert_eq!(result.run.valid_rows, 2);
    assert_eq!(result.run.invalid_rows, 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: graceful degradation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn base_table_alone_still_produces_reports() {
    let input = tempfile::tempdir().unwrap();
    write(input.path(), "user_referrals.csv", USER_REFERRALS);
    let output = tempfile::tempdir().unwrap();
    let cfg = config(input.path(), output.path());

    let result = ReportPipeline::with_run_id("e2e-4".into(), cfg.clone())
        .run()
        .unwrap();

    assert_eq!(result.run.event_rows, 3);
    assert_eq!(result.run.joins_applied(), 0);

    let events = read_table(&cfg.report_path()).unwrap();
    assert!(!events.has_column("referral_status"));
    for r in 0..events.len() {
        assert_eq!(events.cell(r, "referrer_membership_not_expired"), Some("True"));
        assert_eq!(events.cell(r, "referrer_not_deleted"), Some("True"));
        assert_eq!(events.cell(r, "is_reward_granted"), Some("False"));
    }
    assert!(cfg.summary_path().is_file());
}

#[test]
fn missing_input_directory_writes_an_empty_report() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(&root.path().join("nope"), &root.path().join("out"));

    let result = ReportPipeline::with_run_id("e2e-5".into(), cfg.clone())
        .run()
        .unwrap();

    assert_eq!(result.run.event_rows, 0);
    assert!(result.summary.is_none());
    let events = read_table(&cfg.report_path()).unwrap();
    assert!(events.is_empty());
    assert!(events.has_column("is_business_logic_valid"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: no referral_id
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn without_referral_id_only_the_event_report_is_written() {
    let input = tempfile::tempdir().unwrap();
    write(
        input.path(),
        "user_referrals.csv",
        "id,referral_source,referral_at\n1,User Sign Up,2024-01-05\n",
    );
    let output = tempfile::tempdir().unwrap();
    let cfg = config(input.path(), output.path());

    let result = ReportPipeline::with_run_id("e2e-6".into(), cfg.clone())
        .run()
        .unwrap();

    assert!(result.summary.is_none());
    assert_eq!(result.run.summary_path, None);
    assert!(cfg.report_path().is_file());
    assert!(!cfg.summary_path().exists());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn identical_inputs_produce_identical_reports() {
    let input = full_dataset();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let cfg_a = config(input.path(), out_a.path());
    let cfg_b = config(input.path(), out_b.path());

    ReportPipeline::with_run_id("det-a".into(), cfg_a.clone()).run().unwrap();
    ReportPipeline::with_run_id("det-b".into(), cfg_b.clone()).run().unwrap();

    for (a, b) in [
        (cfg_a.report_path(), cfg_b.report_path()),
        (cfg_a.summary_path(), cfg_b.summary_path()),
    ] {
        let a = fs::read(a).unwrap();
        let b = fs::read(b).unwrap();
        assert_eq!(a, b, "reports diverged between identical runs");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: fatal output error
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unwritable_output_directory_aborts_the_run() {
    let input = full_dataset();
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("not-a-dir");
    fs::write(&blocker, "file in the way").unwrap();
    let cfg = config(input.path(), &blocker.join("out"));

    let err = ReportPipeline::new(cfg).run().unwrap_err();
    assert!(matches!(err, ReconError::OutputDir { .. }), "got {err:?}");
}
