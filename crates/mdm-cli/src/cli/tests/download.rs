//! Tests for download argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_download_defaults() {
    match parse(&["mdm", "download", "https://example.com/watch?v=abc"]) {
        CliCommand::Download {
            urls,
            format,
            output_dir,
            po_token,
            no_browser_cookies,
            json,
        } => {
            assert_eq!(urls, vec!["https://example.com/watch?v=abc".to_string()]);
            assert_eq!(format, "mp4");
            assert_eq!(output_dir, Path::new("."));
            assert!(po_token.is_none());
            assert!(!no_browser_cookies);
            assert!(!json);
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_many_urls_with_options() {
    match parse(&[
        "mdm",
        "download",
        "https://a.example/1",
        "https://b.example/2",
        "-f",
        "mp3",
        "--output-dir",
        "/tmp/music",
        "--po-token",
        "tok",
        "--no-browser-cookies",
        "--json",
    ]) {
        CliCommand::Download {
            urls,
            format,
            output_dir,
            po_token,
            no_browser_cookies,
            json,
        } => {
            assert_eq!(urls.len(), 2);
            assert_eq!(format, "mp3");
            assert_eq!(output_dir, Path::new("/tmp/music"));
            assert_eq!(po_token.as_deref(), Some("tok"));
            assert!(no_browser_cookies);
            assert!(json);
        }
        _ => panic!("expected Download with options"),
    }
}

#[test]
fn cli_parse_download_requires_a_url() {
    assert!(Cli::try_parse_from(["mdm", "download"]).is_err());
}
