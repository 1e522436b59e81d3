//! CLI integration tests for tablewright
//!
//! Tests the tablewright CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command with an isolated config pointing data and seeds into `dir`
#[allow(deprecated)]
fn tablewright_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tablewright").unwrap();
    cmd.env("TABLEWRIGHT_CONFIG_DIR", dir.join("config"));
    cmd
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[storage]\ndata_dir = \"{}\"\nseed_dir = \"{}\"\n",
            dir.path().join("database").display(),
            dir.path().join("seed").display()
        ),
    )
    .unwrap();

    let seed_dir = dir.path().join("seed").join("auctionDB");
    fs::create_dir_all(&seed_dir).unwrap();
    fs::write(
        seed_dir.join("tables.json"),
        r#"[
            {"name": "Permission", "autoinc": true,
             "fields": [{"name": "Name", "type": 2, "nullable": false, "unique": true}]},
            {"name": "Bod", "autoinc": true,
             "fields": [
                {"name": "PermissionID", "type": 1, "foreign": "Permission"},
                {"name": "FirstName", "type": 2},
                {"name": "LastName", "type": 2}
             ]}
        ]"#,
    )
    .unwrap();
    fs::write(
        seed_dir.join("inserts.json"),
        r#"[
            {"tableName": "Permission", "fieldNames": ["Name"], "values": ["Admin"]},
            {"tableName": "Bod", "fieldNames": ["PermissionID", "FirstName", "LastName"],
             "values": [1, null, "X"]}
        ]"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_ddl_prints_create_statements() {
    let dir = setup();
    let schema = dir.path().join("seed/auctionDB/tables.json");

    tablewright_cmd(dir.path())
        .arg("ddl")
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "'PermissionID' INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE",
        ))
        .stdout(predicate::str::contains(
            "FOREIGN KEY ('PermissionID') REFERENCES 'Permission'(PermissionID)",
        ));
}

#[test]
fn test_create_seeds_and_substitutes_nulls() {
    let dir = setup();

    tablewright_cmd(dir.path())
        .args(["create", "auctionDB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 tables, 2 seed rows, 0 failures"));

    assert!(dir.path().join("database/auctionDB.db").exists());
    assert!(dir.path().join("database/auctionDB.json").exists());

    tablewright_cmd(dir.path())
        .args(["query", "auctionDB", "Bod"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""FirstName":"""#));
}

#[test]
fn test_row_commands_round_trip() {
    let dir = setup();
    tablewright_cmd(dir.path())
        .args(["create", "auctionDB", "--quiet"])
        .assert()
        .success();

    tablewright_cmd(dir.path())
        .args(["insert", "auctionDB", "Permission", r#"{"Name": "Guest"}"#])
        .assert()
        .success()
        .stdout("2\n");

    tablewright_cmd(dir.path())
        .args(["update", "auctionDB", "Permission", "Name", "2", "Visitor"])
        .assert()
        .success()
        .stdout("Visitor\n");

    tablewright_cmd(dir.path())
        .args(["--format", "json", "delete", "auctionDB", "Permission", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"success":true,"response":1}"#));

    tablewright_cmd(dir.path())
        .args(["--format", "json", "delete", "auctionDB", "Permission", "2"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""success":false"#));
}

#[test]
fn test_insert_into_missing_table_fails() {
    let dir = setup();
    tablewright_cmd(dir.path())
        .args(["create", "auctionDB", "--quiet"])
        .assert()
        .success();

    tablewright_cmd(dir.path())
        .args(["insert", "auctionDB", "Nope", r#"{"Name": "x"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such table"));
}

#[test]
fn test_query_unknown_database_fails() {
    let dir = setup();
    tablewright_cmd(dir.path())
        .args(["query", "ghostDB", "Bod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(!dir.path().join("database/ghostDB.db").exists());
}

#[test]
fn test_drop_removes_files() {
    let dir = setup();
    tablewright_cmd(dir.path())
        .args(["create", "auctionDB", "--quiet"])
        .assert()
        .success();

    tablewright_cmd(dir.path())
        .args(["drop", "auctionDB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted database 'auctionDB'"));

    assert!(!dir.path().join("database/auctionDB.db").exists());
    assert!(!dir.path().join("database/auctionDB.json").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = setup();

    tablewright_cmd(dir.path())
        .args(["config", "set", "rows.zero_row_delete", "succeed"])
        .assert()
        .success();

    tablewright_cmd(dir.path())
        .args(["config", "get", "rows.zero_row_delete"])
        .assert()
        .success()
        .stdout("succeed\n");

    tablewright_cmd(dir.path())
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure();
}
