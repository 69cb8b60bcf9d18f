//! CLI integration tests

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const VINFO: &str = "\
VM Name,Power State,Cluster Name,MOID
db01,poweredOn,prod,vm-101
legacy02,poweredOff,prod,vm-200
tiny03,poweredOn,dev,vm-300
";

const VCPU: &str = "\
vCPUs,Peak %,Average %,Median %,95th Percentile % (recommended),MOID
8,90,20,15,40,vm-101
4,,,,,vm-200
1,100,100,100,100,vm-300
";

const VMEMORY: &str = "\
Size (MiB),Peak %,Average %,Median %,95th Percentile % (recommended),MOID
16384,80,30,25,50,vm-101
512,90,90,90,90,vm-300
";

fn write_sheets(dir: &Path, vcpu: &str) {
    fs::write(dir.join("vInfo.csv"), VINFO).unwrap();
    fs::write(dir.join("vCPU.csv"), vcpu).unwrap();
    fs::write(dir.join("vMemory.csv"), VMEMORY).unwrap();
}

fn rightsize(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rightsize"))
        .args(args)
        .env_remove("RIGHTSIZE_INPUT_DIR")
        .env_remove("RIGHTSIZE_VALIDATION")
        .env("HOME", std::env::temp_dir())
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = rightsize(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("VM right-sizing"), "Should show app name");
    assert!(stdout.contains("overview"), "Should show overview command");
    assert!(stdout.contains("vms"), "Should show vms command");
    assert!(stdout.contains("savings"), "Should show savings command");
    assert!(stdout.contains("validate"), "Should show validate command");
    assert!(stdout.contains("export"), "Should show export command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = rightsize(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("rightsize"), "Should show binary name");
}

/// Test vms subcommand help
#[test]
fn test_vms_help() {
    let output = rightsize(&["vms", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "vms help should succeed");
    assert!(stdout.contains("--cluster"), "Should show cluster option");
    assert!(stdout.contains("--power-state"), "Should show power-state option");
    assert!(stdout.contains("--columns"), "Should show columns option");
}

/// Test invalid command
#[test]
fn test_invalid_command() {
    let output = rightsize(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_savings_json() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), VCPU);

    let input = dir.path().to_str().unwrap();
    let output = rightsize(&["--input-dir", input, "--format", "json", "savings", "--cluster", "prod"]);
    assert!(output.status.success(), "savings should succeed");

    let savings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(savings["statistic"], "p95");
    // db01 8 -> 4, legacy02 keeps 4
    assert_eq!(savings["cpu_vcpus"], 4);
    assert_eq!(savings["memory_gib"], 6.0);
}

#[test]
fn test_vms_json_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), VCPU);

    let input = dir.path().to_str().unwrap();
    let output = rightsize(&[
        "-i",
        input,
        "-f",
        "json",
        "vms",
        "--power-state",
        "poweredOn",
        "--columns",
        "name,memory_p95_recommended",
    ]);
    assert!(output.status.success(), "vms should succeed");

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        view["columns"],
        serde_json::json!(["VM Name", "vMemory 95th Percentile #"])
    );
    assert_eq!(view["rows"][0], serde_json::json!(["db01", 10.0]));
    assert_eq!(view["rows"][1], serde_json::json!(["tiny03", 0.5]));
}

#[test]
fn test_missing_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), "vCPUs,MOID\n8,vm-101\n");

    let output = rightsize(&["-i", dir.path().to_str().unwrap(), "overview"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "missing columns should fail");
    assert!(stderr.contains("Peak %"), "Should name the missing column");
}

#[test]
fn test_validate_strict_fails_on_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let duplicated = format!("{}8,90,20,15,40,vm-101\n", VCPU);
    write_sheets(dir.path(), &duplicated);
    let input = dir.path().to_str().unwrap();

    let relaxed = rightsize(&["-i", input, "validate"]);
    assert!(relaxed.status.success(), "warn mode should pass");

    let strict = rightsize(&["-i", input, "validate", "--strict"]);
    assert!(!strict.status.success(), "strict mode should fail");
    let stdout = String::from_utf8_lossy(&strict.stdout);
    assert!(stdout.contains("duplicate join key 'vm-101'"));
}

#[test]
fn test_strict_load_names_each_finding() {
    let dir = tempfile::tempdir().unwrap();
    let duplicated = format!("{}8,90,20,15,40,vm-101\n", VCPU);
    write_sheets(dir.path(), &duplicated);
    let memory = VMEMORY.replace("16384,80,", "16384,150,");
    fs::write(dir.path().join("vMemory.csv"), memory).unwrap();

    let output = rightsize(&[
        "-i",
        dir.path().to_str().unwrap(),
        "--validation",
        "strict",
        "overview",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "strict load should fail");
    assert!(stderr.contains("2 finding(s)"), "Should count findings: {}", stderr);
    assert!(
        stderr.contains("duplicate join key 'vm-101'"),
        "Should name the duplicate: {}",
        stderr
    );
    assert!(
        stderr.contains("Peak % = 150 for 'vm-101'"),
        "Should name the out-of-range value: {}",
        stderr
    );
}

#[test]
fn test_export_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), VCPU);
    let out = dir.path().join("out");

    let output = rightsize(&[
        "-i",
        dir.path().to_str().unwrap(),
        "export",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "export should succeed");

    for file in [
        "vm_details.csv",
        "vcpu_overview.csv",
        "vmemory_overview.csv",
        "report.json",
    ] {
        assert!(out.join(file).exists(), "{} should exist", file);
    }

    let details = fs::read_to_string(out.join("vm_details.csv")).unwrap();
    assert!(details.starts_with("VM Name,Power State,Cluster Name,vCPUs,vCPU Peak %"));
    assert_eq!(details.lines().count(), 4);
}
