use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCHEDULE: &str = "\
CERTIFICATE OF INSURANCE
Insured: Harbour Logistics Ltd
Unique Market Reference: B0509BOWCY2200456
Certificate Reference: 987654
Period of Insurance: from 01/04/2024 to 31/03/2025
";

/// A command isolated from the user's config, `.env` and LEX_* variables.
fn lexingest(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lexingest").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("LEX_CONSTRAINED_DEPLOYMENT", "true")
        .env_remove("LEX_DOCINTEL_ENDPOINT")
        .env_remove("LEX_DOCINTEL_KEY")
        .env_remove("LEX_VISION_ENDPOINT")
        .env_remove("LEX_VISION_KEY")
        .env_remove("LEX_MIN_TEXT_LENGTH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn fields_from_file_as_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schedule.txt");
    fs::write(&input, SCHEDULE).unwrap();

    let output = lexingest(dir.path())
        .args(["fields", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let fields: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(fields["insuredName"], "Harbour Logistics Ltd");
    assert_eq!(fields["marketRef"], "B0509BOWCY2200456");
    assert_eq!(fields["certificateRef"], "987654");
    assert_eq!(fields["policyPeriodStart"], "01/04/2024");
    assert_eq!(fields["policyPeriodEnd"], "31/03/2025");
    assert_eq!(fields["lineSlipNo"], "");
}

#[test]
fn fields_from_stdin_as_csv() {
    let dir = TempDir::new().unwrap();

    lexingest(dir.path())
        .args(["fields", "--format", "csv"])
        .write_stdin(SCHEDULE)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("insuredName,marketRef,lineSlipNo"))
        .stdout(predicate::str::contains("987654"));
}

#[test]
fn protect_then_restore_round_trips_through_map_file() {
    let dir = TempDir::new().unwrap();
    let original = "paid 12,500 ₪ on 01/02/2020 for 30% of damages in case 1234/56";
    let input = dir.path().join("draft.txt");
    let map = dir.path().join("map.json");
    let protected = dir.path().join("protected.txt");
    fs::write(&input, original).unwrap();

    lexingest(dir.path())
        .args(["protect", input.to_str().unwrap()])
        .args(["--map-out", map.to_str().unwrap()])
        .args(["--output", protected.to_str().unwrap()])
        .assert()
        .success();

    let protected_text = fs::read_to_string(&protected).unwrap();
    assert!(protected_text.contains("⟦MONEY_"));
    assert!(!protected_text.contains("12,500"));

    lexingest(dir.path())
        .args(["restore", protected.to_str().unwrap()])
        .args(["--map", map.to_str().unwrap()])
        .assert()
        .success()
        .stdout(format!("{}\n", original));
}

#[test]
fn restore_accepts_full_protect_output() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");

    let output = lexingest(dir.path())
        .arg("protect")
        .write_stdin("The insurer must pay $3,000 within 14 days.")
        .output()
        .unwrap();
    assert!(output.status.success());
    fs::write(&bundle, &output.stdout).unwrap();

    let protected: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let text = protected["protectedText"].as_str().unwrap().to_string();

    lexingest(dir.path())
        .args(["restore", "--map", bundle.to_str().unwrap()])
        .write_stdin(text)
        .assert()
        .success()
        .stdout(predicate::str::contains("$3,000"));
}

#[test]
fn strict_restore_fails_when_a_fact_was_dropped() {
    let dir = TempDir::new().unwrap();
    let map = dir.path().join("map.json");

    let output = lexingest(dir.path())
        .args(["protect", "--map-out", map.to_str().unwrap()])
        .write_stdin("The insurer must pay $3,000 within 14 days.")
        .output()
        .unwrap();
    assert!(output.status.success());
    let protected = String::from_utf8(output.stdout).unwrap();

    let entries: serde_json::Value = serde_json::from_str(&fs::read_to_string(&map).unwrap()).unwrap();
    let money = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["original"] == "$3,000")
        .unwrap()["placeholder"]
        .as_str()
        .unwrap()
        .to_string();
    let rewritten = protected.trim_end().replace(&money, "the agreed amount");

    lexingest(dir.path())
        .args(["restore", "--strict", "--map", map.to_str().unwrap()])
        .write_stdin(rewritten)
        .assert()
        .failure()
        .stderr(predicate::str::contains(money.as_str()))
        .stderr(predicate::str::contains("$3,000"));
}

#[test]
fn extract_plain_text_with_fields() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schedule.txt");
    fs::write(&input, SCHEDULE).unwrap();

    let output = lexingest(dir.path())
        .args(["extract", input.to_str().unwrap(), "--format", "json", "--with-fields"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mimeType"], "text/plain");
    assert_eq!(report["lowConfidence"], false);
    assert!(report["text"].as_str().unwrap().contains("Harbour Logistics"));
    assert_eq!(report["fields"]["certificateRef"], "987654");
}

#[test]
fn extract_unknown_extension_needs_mime() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("payload.bin");
    fs::write(&input, b"MZ").unwrap();

    lexingest(dir.path())
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mime"));

    lexingest(dir.path())
        .args(["extract", input.to_str().unwrap(), "--mime", "application/x-dosexec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported"));
}

#[test]
fn batch_writes_json_lines_and_summary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), SCHEDULE).unwrap();
    fs::write(dir.path().join("b.txt"), "Line Slip Reference: LS/8841/B").unwrap();
    fs::write(dir.path().join("ignored.bin"), b"\x00\x01").unwrap();
    let summary = dir.path().join("summary.csv");
    let pattern = dir.path().join("*").to_str().unwrap().to_string();

    let output = lexingest(dir.path())
        .args(["batch", &pattern, "--summary", summary.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l["fields"]["lineSlipNo"] == "LS/8841/B"));

    let csv = fs::read_to_string(&summary).unwrap();
    assert!(csv.starts_with("filename,status,path_taken"));
    assert!(csv.contains("a.txt,success,flat_text,false"));
}

#[test]
fn config_init_get_and_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("lexingest.json");
    let config_arg = config.to_str().unwrap();

    lexingest(dir.path())
        .args(["config", "init", "--output", config_arg])
        .assert()
        .success();
    assert!(config.exists());

    lexingest(dir.path())
        .args(["config", "init", "--output", config_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    lexingest(dir.path())
        .args(["--config", config_arg, "config", "set", "extraction.min_text_length", "50"])
        .assert()
        .success();

    lexingest(dir.path())
        .args(["--config", config_arg, "config", "get", "extraction.min_text_length"])
        .assert()
        .success()
        .stdout("50\n");

    lexingest(dir.path())
        .args(["--config", config_arg, "config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn config_path_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("absent.json");

    lexingest(dir.path())
        .args(["--config", config.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
