//! Exit status and stderr of the binary on fatal conditions.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const BIN: &str = "zkevm-bench-report";

#[test]
fn phase_flags_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("tables")
        .arg(dir.path())
        .args(["--execution-only", "--proving-only", "-o", "-"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "cannot combine --execution-only with --proving-only",
        ));
    Ok(())
}

#[test]
fn missing_input_folder() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("compare")
        .arg("--left")
        .arg(dir.path().join("nope"))
        .arg("--right")
        .arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input path does not exist"));
    Ok(())
}

#[test]
fn empty_folders_have_no_records() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let (left, right) = (dir.path().join("l"), dir.path().join("r"));
    fs::create_dir_all(&left)?;
    fs::create_dir_all(&right)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("compare").arg("--left").arg(&left).arg("--right").arg(&right);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no loadable benchmark records found"));
    Ok(())
}

#[test]
fn detailed_without_csv_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let record = r#"{"proving": {"success": {"proving_time_ms": 10, "proof_size": 1, "peak_memory_usage_bytes": 1}}}"#;
    for side in ["l", "r"] {
        fs::create_dir_all(dir.path().join(side).join("out"))?;
        fs::write(dir.path().join(side).join("out/t.json"), record)?;
    }

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("compare")
        .arg("--left")
        .arg(dir.path().join("l"))
        .arg("--right")
        .arg(dir.path().join("r"))
        .args(["--format", "markdown", "--detailed"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot combine --detailed"));

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("compare")
        .arg("--left")
        .arg(dir.path().join("l"))
        .arg("--right")
        .arg(dir.path().join("r"))
        .args(["--format", "csv", "--detailed"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("test_name,risc0_proving_time_s,"));
    Ok(())
}

#[test]
fn tables_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let folder = dir.path().join("zkevm-metrics-10M");
    fs::create_dir_all(folder.join("blocks"))?;
    fs::write(
        folder.join("blocks/empty.json"),
        r#"{"execution": {"success": {"total_num_cycles": 42}}}"#,
    )?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("tables").arg(&folder).args(["-o", "-"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("## Gas Category: 10M"));
    Ok(())
}
