//! Subcommand implementations.

mod download;
mod list;

pub(crate) use download::{DownloadSettings, run_download};
pub(crate) use list::run_list;
