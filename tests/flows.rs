mod common;

use careconnect::harness::{self, flows};

async fn run_flows(filter: &str) {
    let config = common::stub_config();
    let selected = flows::matching(Some(filter));
    assert!(!selected.is_empty(), "no flow matches {filter}");

    let report = harness::run(&config, &selected).await;
    let failures: Vec<String> = report
        .failed()
        .iter()
        .map(|o| format!("{}: {}", o.name, o.error.as_deref().unwrap_or_default()))
        .collect();
    assert!(failures.is_empty(), "failed flows:\n{}", failures.join("\n"));
    assert_eq!(report.passed(), selected.len());
}

#[tokio::test]
async fn auth_flows_pass_against_the_stub() {
    run_flows("auth::").await;
}

#[tokio::test]
async fn admin_flows_pass_against_the_stub() {
    run_flows("admin::").await;
}

#[tokio::test]
async fn doctor_flows_pass_against_the_stub() {
    run_flows("doctor::").await;
}

#[tokio::test]
async fn patient_flows_pass_against_the_stub() {
    run_flows("patient::").await;
}

#[test]
fn every_flow_has_a_unique_name() {
    let mut names: Vec<&str> = flows::all_flows().iter().map(|f| f.name).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}
