//! Exit code logic for the hbsync process.
//!
//! Maps a finished run or a top-level error to the process exit outcome.

use hbsync_core::{ErrorKind, SyncError, TransferSummary};

use crate::ProcessExit;

/// Exit outcome of a transfer run that did not abort.
pub(crate) fn determine_exit_outcome(summary: &TransferSummary) -> ProcessExit {
    if summary.failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    }
}

/// Exit outcome for an error that ended the run.
///
/// The first [`SyncError`] in the chain picks the code; anything else is a
/// usage or configuration problem.
pub(crate) fn exit_for_error(error: &anyhow::Error) -> ProcessExit {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>())
        .map_or(ProcessExit::Usage, |sync| ProcessExit::Failed(sync.kind()))
}

/// Numeric exit code for each failure class.
pub(crate) fn kind_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::CookieLoad => 3,
        ErrorKind::Http => 4,
        ErrorKind::Parse => 5,
        ErrorKind::Decode => 6,
        ErrorKind::Io => 7,
    }
}
