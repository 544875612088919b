use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const OFX: &str = "OFXHEADER:100\r\nDATA:OFXSGML\r\nVERSION:102\r\n\r\n\
<OFX>\r\n<SIGNONMSGSRSV1>\r\n<SONRS>\r\n<STATUS>\r\n<CODE>0\r\n<SEVERITY>INFO\r\n</STATUS>\r\n\
<DTSERVER>20250131\r\n<LANGUAGE>POR\r\n</SONRS>\r\n</SIGNONMSGSRSV1>\r\n\
<BANKMSGSRSV1>\r\n<STMTTRNRS>\r\n<TRNUID>1\r\n<STMTRS>\r\n<CURDEF>BRL\r\n<BANKTRANLIST>\r\n\
<STMTTRN>\r\n<TRNTYPE>DEBIT\r\n<DTPOSTED>20250101\r\n<TRNAMT>-50.00\r\n<FITID>A1\r\n<MEMO>COMPRA CARTAO 1234\r\n</STMTTRN>\r\n\
<STMTTRN>\r\n<TRNTYPE>CREDIT\r\n<DTPOSTED>20250102\r\n<TRNAMT>10.00\r\n<FITID>A2\r\n<MEMO>PIX RECEBIDO\r\n</STMTTRN>\r\n\
</BANKTRANLIST>\r\n</STMTRS>\r\n</STMTTRNRS>\r\n</BANKMSGSRSV1>\r\n</OFX>\r\n";

const SHEET: &str = "Data,Descrição,Valor\n2025-01-01,Groceries,-50\n2025-01-05,Rent,-1500\n";

fn fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let ofx = dir.join("extrato.ofx");
    let sheet = dir.join("planilha.csv");
    std::fs::write(&ofx, OFX).unwrap();
    std::fs::write(&sheet, SHEET).unwrap();
    (ofx, sheet)
}

fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ofx-reconcile").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_reconciles_and_writes_updated_ofx() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, sheet) = fixtures(dir.path());
    let out = dir.path().join("atualizado.ofx");

    cmd(dir.path())
        .args(["run", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 2 descriptions replaced"))
        .stdout(predicate::str::contains("Breakdown by description"))
        .stdout(predicate::str::contains("Wrote"));

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("OFXHEADER:100"));
    assert!(written.contains("<MEMO>Groceries</MEMO>"));
    assert!(written.contains("<MEMO>PIX RECEBIDO</MEMO>"));
    assert!(written.contains("<FITID>000000</FITID>"));
    assert!(written.contains("<FITID>000001</FITID>"));
    assert!(!written.contains("COMPRA CARTAO"));
}

#[test]
fn run_defaults_output_to_atualizado_ofx() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, sheet) = fixtures(dir.path());

    cmd(dir.path())
        .current_dir(dir.path())
        .args(["run", "--no-chart", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("Breakdown").not());

    assert!(dir.path().join("atualizado.ofx").exists());
}

#[test]
fn run_stdout_prints_only_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, sheet) = fixtures(dir.path());

    cmd(dir.path())
        .args(["run", "--stdout", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("OFXHEADER:100"))
        .stdout(predicate::str::contains("<TRNTYPE>CREDIT</TRNTYPE>"))
        .stdout(predicate::str::contains("OFX transactions").not());
}

#[test]
fn run_bad_sheet_still_shows_ofx_table_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, _) = fixtures(dir.path());
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "Data,Descrição,Valor\n2025-01-01,Groceries,cinquenta\n").unwrap();
    let out = dir.path().join("out.ofx");

    cmd(dir.path())
        .args(["run", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&bad)
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("OFX transactions"))
        .stdout(predicate::str::contains("COMPRA CARTAO 1234"))
        .stderr(predicate::str::contains("Spreadsheet:"))
        .stderr(predicate::str::contains("Valor"));

    assert!(!out.exists());
}

#[test]
fn run_malformed_ofx_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, sheet) = fixtures(dir.path());
    let bad = dir.path().join("bad.ofx");
    std::fs::write(&bad, "OFXHEADER:100\n\n<OFX><BANKMSGSRSV1></BANKMSGSRSV1></OFX>").unwrap();

    cmd(dir.path())
        .args(["run", "--ofx"])
        .arg(&bad)
        .arg("--sheet")
        .arg(&sheet)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Spreadsheet"))
        .stderr(predicate::str::contains("Malformed OFX"));
}

#[test]
fn run_without_inputs_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn run_with_only_ofx_shows_table_without_export() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, _) = fixtures(dir.path());
    cmd(dir.path())
        .current_dir(dir.path())
        .args(["run", "--ofx"])
        .arg(&ofx)
        .assert()
        .success()
        .stdout(predicate::str::contains("PIX RECEBIDO"))
        .stdout(predicate::str::contains("Provide both"));
    assert!(!dir.path().join("atualizado.ofx").exists());
}

#[test]
fn init_then_status_reads_settings() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"));
    assert!(dir.path().join(".config/ofx-reconcile/settings.json").exists());

    cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist"));

    cmd(dir.path())
        .arg("status")
        .env("OPENAI_API_KEY", "sk-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("atualizado.ofx"))
        .stdout(predicate::str::contains("OPENAI_API_KEY: set (unused)"))
        .stdout(predicate::str::contains("sk-test").not());
}

#[test]
fn settings_file_changes_export_header() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, sheet) = fixtures(dir.path());
    let config = dir.path().join(".config/ofx-reconcile");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(
        config.join("settings.json"),
        r#"{"export": {"currency": "USD", "language": "ENG"}}"#,
    )
    .unwrap();

    cmd(dir.path())
        .args(["run", "--stdout", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("<CURDEF>USD</CURDEF>"))
        .stdout(predicate::str::contains("<LANGUAGE>ENG</LANGUAGE>"));
}

#[test]
fn corrupt_settings_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (ofx, sheet) = fixtures(dir.path());
    let config = dir.path().join(".config/ofx-reconcile");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("settings.json"), "{ \"export\": ").unwrap();

    cmd(dir.path())
        .args(["run", "--stdout", "--ofx"])
        .arg(&ofx)
        .arg("--sheet")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("<CURDEF>BRL</CURDEF>"))
        .stderr(predicate::str::contains("ignoring unreadable settings file"));
}
