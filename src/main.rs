//! CLI entry point for hbsync.

use std::process::ExitCode;

use clap::Parser;
use hbsync_core::ErrorKind;

mod app;
mod cli;
mod commands;

use cli::Cli;

/// Final outcome of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything planned was downloaded or already present.
    Success,
    /// Bad arguments or configuration.
    Usage,
    /// Some transfers failed under `--continue-on-error`.
    Partial,
    /// The run aborted with an error of this class.
    Failed(ErrorKind),
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Usage => 1,
            Self::Partial => 2,
            Self::Failed(kind) => app::exit_handler::kind_exit_code(kind),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // clap's own exit code 2 would collide with the partial-run code
            return if err.use_stderr() {
                ExitCode::from(ProcessExit::Usage.code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let exit = app::runtime::run(cli).await;
    ExitCode::from(exit.code())
}
