//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Sync your Humble Bundle library to local storage.
///
/// Authenticates with a Netscape cookie export from a signed-in browser,
/// lists the purchases of the account and downloads one format of a purchase
/// into a library directory. Files already present with the expected size are
/// skipped.
#[derive(Parser, Debug)]
#[command(name = "hbsync")]
#[command(author, version, about)]
pub struct Cli {
    /// Netscape-format cookie file exported from a signed-in browser
    #[arg(short = 'c', long = "cookie-jar", global = true, value_name = "PATH")]
    pub cookie_jar: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", visible_alias = "nc", global = true)]
    pub no_color: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Read defaults from this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the purchase keys of the account
    List(ListArgs),
    /// Download one format of a purchase into the library
    Download(DownloadArgs),
}

/// Options for `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Resolve each key and print its product name
    #[arg(long)]
    pub details: bool,
}

/// Options for `download`.
#[derive(Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Purchase key to download
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    pub key: String,

    /// File format to download, case-insensitive (e.g. epub, pdf, cbz)
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Library root; files go to <library>/<product>/<item>.<format>
    #[arg(short = 'l', long = "library-path", value_name = "DIR")]
    pub library_path: Option<PathBuf>,

    /// Keep going after a failed file and report failures at the end
    #[arg(long)]
    pub continue_on_error: bool,

    /// Download a file only once when several platforms offer it
    #[arg(long)]
    pub dedupe: bool,
}
