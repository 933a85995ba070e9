//! Tests for status, failed, remove, formats, tools.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_status() {
    match parse(&["mdm", "status"]) {
        CliCommand::Status { json } => assert!(!json),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_status_json() {
    match parse(&["mdm", "status", "--json"]) {
        CliCommand::Status { json } => assert!(json),
        _ => panic!("expected Status --json"),
    }
}

#[test]
fn cli_parse_failed() {
    match parse(&["mdm", "failed"]) {
        CliCommand::Failed { json } => assert!(!json),
        _ => panic!("expected Failed"),
    }
}

#[test]
fn cli_parse_remove() {
    match parse(&["mdm", "remove", "0b7c-job"]) {
        CliCommand::Remove { job_id } => assert_eq!(job_id, "0b7c-job"),
        _ => panic!("expected Remove"),
    }
}

#[test]
fn cli_parse_tools() {
    match parse(&["mdm", "tools"]) {
        CliCommand::Tools => {}
        _ => panic!("expected Tools"),
    }
}

#[test]
fn cli_parse_formats() {
    match parse(&["mdm", "formats", "https://example.com/watch?v=abc"]) {
        CliCommand::Formats { url } => assert_eq!(url, "https://example.com/watch?v=abc"),
        _ => panic!("expected Formats"),
    }
}
