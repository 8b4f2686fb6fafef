//! `hbsync download`: mirror one format of a purchase into the library.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use hbsync_core::{
    BarProgress, DownloadPlanner, ErrorPolicy, PurchaseDetailResolver, PurchaseKey, Session,
    TransferOutcome, TransferStatus, TransferSummary, Transferrer,
};
use indicatif::HumanBytes;
use tracing::{debug, warn};

/// Fully resolved options for one download run.
#[derive(Debug, Clone)]
pub(crate) struct DownloadSettings {
    pub(crate) key: PurchaseKey,
    pub(crate) format: String,
    pub(crate) library_path: PathBuf,
    pub(crate) policy: ErrorPolicy,
    pub(crate) dedupe: bool,
    pub(crate) show_progress: bool,
    pub(crate) quiet: bool,
}

/// Resolves the purchase, plans the matching files and transfers them.
pub(crate) async fn run_download(
    session: &Session,
    settings: &DownloadSettings,
) -> Result<TransferSummary> {
    let detail = PurchaseDetailResolver::new(session)
        .resolve(&settings.key)
        .await?;
    debug!(
        product = detail.name(),
        subproducts = detail.subproducts.len(),
        "purchase contents"
    );

    let mut plan = DownloadPlanner::new(settings.format.as_str(), settings.library_path.clone())
        .with_dedupe(settings.dedupe)
        .plan(&detail)?;

    for task in &plan.queue {
        debug!(
            url = %task.url,
            path = %task.destination().display(),
            size = task.expected_size,
            "planned"
        );
    }

    if plan.queue.is_empty() {
        let available: Vec<&str> = plan
            .inventory
            .iter()
            .flat_map(|item| item.formats.iter().map(String::as_str))
            .collect();
        warn!(
            format = %settings.format,
            ?available,
            "purchase has no downloads in the requested format"
        );
    }

    let progress = BarProgress::new(!settings.show_progress);
    let outcomes = Transferrer::new(session, &progress)
        .with_policy(settings.policy)
        .run(&mut plan.queue)
        .await?;
    let summary = TransferSummary::from_outcomes(&outcomes);

    let mut stdout = io::stdout().lock();
    write_summary(&mut stdout, detail.name(), &summary, &outcomes, settings.quiet)
        .context("Failed to write run summary")?;
    Ok(summary)
}

/// Prints the run tallies, then every failed task.
///
/// In quiet mode only the failures are printed.
pub(crate) fn write_summary(
    out: &mut dyn Write,
    product: &str,
    summary: &TransferSummary,
    outcomes: &[TransferOutcome],
    quiet: bool,
) -> io::Result<()> {
    if !quiet {
        writeln!(
            out,
            "{product}: {} downloaded, {} skipped, {} failed ({})",
            summary.downloaded,
            summary.skipped,
            summary.failed,
            HumanBytes(summary.bytes)
        )?;
    }
    for outcome in outcomes
        .iter()
        .filter(|o| o.status == TransferStatus::Failed)
    {
        match &outcome.error {
            Some((kind, message)) => writeln!(
                out,
                "  failed [{kind}] {}: {message}",
                outcome.destination.display()
            )?,
            None => writeln!(out, "  failed {}", outcome.destination.display())?,
        }
    }
    out.flush()
}
