use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

mod common;

#[test]
fn test_malformed_requests_get_validation_responses() {
    let mut requests = tempfile::NamedTempFile::new().unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "1.00")).unwrap();
    writeln!(requests, "this is not json").unwrap();
    writeln!(requests, r#"{{"bank": "First Bank", "cc_num": "1", "card_type": "credit", "amount": "1"}}"#).unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "not_a_number")).unwrap();
    writeln!(requests).unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "2.00")).unwrap();
    requests.flush().unwrap();

    let mut accounts = tempfile::NamedTempFile::new().unwrap();
    writeln!(accounts, "bank,account,balance").unwrap();
    writeln!(accounts, "First Bank,1,10.00").unwrap();
    accounts.flush().unwrap();

    let mut cmd = Command::new(cargo_bin!("cc-processor"));
    cmd.arg(requests.path()).arg("--accounts").arg(accounts.path());

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let bodies: Vec<&str> = stdout.lines().collect();

    assert_eq!(bodies.len(), 5);
    assert!(bodies[0].contains(r#""body":"Approved.""#));
    assert!(bodies[1].contains("request is not a valid JSON object"));
    assert!(bodies[2].contains("missing field `merchant_token`"));
    assert!(bodies[3].contains("`amount` must be a decimal"));
    assert!(bodies[4].contains(r#""body":"Approved.""#));
}

#[test]
fn test_bad_account_rows_are_skipped() {
    let mut accounts = tempfile::NamedTempFile::new().unwrap();
    writeln!(accounts, "bank,account,balance").unwrap();
    writeln!(accounts, "First Bank,abc,10.00").unwrap();
    writeln!(accounts, "First Bank,2,-5.00").unwrap();
    writeln!(accounts, "First Bank,3,not_a_number").unwrap();
    writeln!(accounts, "First Bank,1,10.00").unwrap();
    accounts.flush().unwrap();

    let mut requests = tempfile::NamedTempFile::new().unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "4.00")).unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 2, "1.00")).unwrap();
    requests.flush().unwrap();

    let mut cmd = Command::new(cargo_bin!("cc-processor"));
    cmd.arg(requests.path()).arg("--accounts").arg(accounts.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading account"))
        .stdout(predicate::str::contains("Approved."))
        .stdout(predicate::str::contains(
            "Error - Bad Bank or Account Number.",
        ));
}

#[test]
fn test_unavailable_bank_exhausts_retries() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("records.csv");
    let balances = dir.path().join("balances.csv");

    let mut cmd = Command::new(cargo_bin!("cc-processor"));
    cmd.arg("tests/fixtures/requests.jsonl")
        .arg("--accounts")
        .arg("tests/fixtures/accounts.csv")
        .arg("--failure-rate")
        .arg("1")
        .arg("--max-attempts")
        .arg("3")
        .arg("--base-delay-ms")
        .arg("1")
        .arg("--records")
        .arg(&records)
        .arg("--balances")
        .arg(&balances);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Max retries exceeded. Could not process transaction.",
        ))
        .stdout(predicate::str::contains("Approved.").not());

    let records = std::fs::read_to_string(&records).unwrap();
    assert_eq!(records.matches(",MaxRetriesExceeded").count(), 4);
    assert_eq!(records.matches(",ValidationError").count(), 1);

    let balances = std::fs::read_to_string(&balances).unwrap();
    assert!(balances.contains("First Bank,123,100.00\n"));
}

#[test]
fn test_invalid_failure_rate_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("cc-processor"));
    cmd.arg("tests/fixtures/requests.jsonl")
        .arg("--failure-rate")
        .arg("1.5");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failure_rate"));
}

#[test]
fn test_non_utf8_line_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("records.csv");
    let balances = dir.path().join("balances.csv");

    let mut accounts = tempfile::NamedTempFile::new().unwrap();
    writeln!(accounts, "bank,account,balance").unwrap();
    writeln!(accounts, "First Bank,1,10.00").unwrap();
    accounts.flush().unwrap();

    let mut requests = tempfile::NamedTempFile::new().unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "1.00")).unwrap();
    requests.write_all(b"\xff\xfe bad\n").unwrap();
    writeln!(requests, "{}", common::charge_json("First Bank", 1, "2.00")).unwrap();
    requests.flush().unwrap();

    let mut cmd = Command::new(cargo_bin!("cc-processor"));
    cmd.arg(requests.path())
        .arg("--accounts")
        .arg(accounts.path())
        .arg("--records")
        .arg(&records)
        .arg("--balances")
        .arg(&balances);

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let bodies: Vec<&str> = stdout.lines().collect();

    assert_eq!(bodies.len(), 3);
    assert!(bodies[0].contains(r#""body":"Approved.""#));
    assert!(bodies[1].contains("request is not valid UTF-8"));
    assert!(bodies[2].contains(r#""body":"Approved.""#));

    let records = std::fs::read_to_string(&records).unwrap();
    assert_eq!(records.lines().count(), 4);
    assert_eq!(records.matches(",ValidationError").count(), 1);

    let balances = std::fs::read_to_string(&balances).unwrap();
    assert!(balances.contains("First Bank,1,7.00\n"));
}
