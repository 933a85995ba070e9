//! CLI command handlers, one file per command.

mod download;
mod failed;
mod formats;
mod remove;
mod status;
mod tools;

pub use download::{run_download, DownloadArgs};
pub use failed::run_failed;
pub use formats::run_formats;
pub use remove::run_remove;
pub use status::run_status;
pub use tools::run_tools;
