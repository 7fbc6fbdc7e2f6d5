//! End-to-end tests for the `auditlog` binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use auditlog::config::AuditPaths;
use auditlog::models::{Action, ChangeRecord, EntityType, FieldMap, InboundRequest, RequestRecord};
use auditlog::storage::{AuditStore, JsonlAuditStore};

struct Seeded {
    dir: TempDir,
    change: ChangeRecord,
    request: RequestRecord,
}

fn seed() -> Seeded {
    let dir = TempDir::new().unwrap();
    let store = JsonlAuditStore::open(&AuditPaths::with_base_dir(dir.path().to_path_buf())).unwrap();

    let request = RequestRecord::from_request(
        &InboundRequest::new("POST", "/orders")
            .with_meta("REMOTE_ADDR", "192.168.0.7")
            .with_user("alice"),
    );
    store.insert_request(&request).unwrap();

    let mut changes = FieldMap::new();
    changes.insert("status".into(), json!("open"));
    let mut change = ChangeRecord::new(
        EntityType::from("shop.order"),
        "42",
        Action::Create,
        None,
        changes,
    );
    change.user_id = request.user_id.clone();
    change.request_id = Some(request.id);
    store.insert_change(&change).unwrap();

    let other = ChangeRecord::new(
        EntityType::from("shop.customer"),
        "7",
        Action::Delete,
        None,
        FieldMap::new(),
    );
    store.insert_change(&other).unwrap();

    Seeded {
        dir,
        change,
        request,
    }
}

fn auditlog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("auditlog").unwrap();
    cmd.env("AUDITLOG_DATA_DIR", dir.path());
    cmd
}

#[test]
fn changes_list_shows_seeded_records() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["changes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shop.order 42"))
        .stdout(predicate::str::contains("shop.customer 7"))
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn changes_list_filters_by_action() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["changes", "list", "--action", "delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shop.customer 7"))
        .stdout(predicate::str::contains("shop.order").not());
}

#[test]
fn changes_list_rejects_unknown_action() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["changes", "list", "--action", "rename"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid action"));
}

#[test]
fn changes_show_accepts_short_id() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["changes", "show", &seeded.change.id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Primary Key:  42"))
        .stdout(predicate::str::contains("status: (added) -> \"open\""));
}

#[test]
fn requests_show_lists_related_changes() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["requests", "show", &seeded.request.id.as_uuid().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Request: POST - /orders"))
        .stdout(predicate::str::contains("Changes (1):"))
        .stdout(predicate::str::contains("shop.order 42"));
}

#[test]
fn unknown_change_is_an_error() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["changes", "show", "chg-ffffffff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn forget_user_scrubs_records() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .args(["forget-user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from 2 records"));

    auditlog(&seeded.dir)
        .args(["changes", "list", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes found."));
}

#[test]
fn export_all_writes_json() {
    let seeded = seed();
    let output = seeded.dir.path().join("export.json");

    auditlog(&seeded.dir)
        .args(["export", "all"])
        .arg(&output)
        .assert()
        .success();

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(exported["metadata"]["change_count"], json!(2));
    assert_eq!(exported["metadata"]["request_count"], json!(1));
}

#[test]
fn config_shows_settings() {
    let seeded = seed();
    auditlog(&seeded.dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("CHANGE_LOGGING"))
        .stdout(predicate::str::contains("AUDIT_LOG"));
}
