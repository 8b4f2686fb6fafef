//! `hbsync list`: print the purchase keys of the account.

use std::io::Write;

use anyhow::{Context, Result};
use hbsync_core::{PurchaseDetailResolver, PurchaseKeySource, Session};
use tracing::info;

use crate::cli::ListArgs;

/// Fetches every key first, then prints one line per key.
///
/// With `--details` each key is resolved and printed as `key<TAB>product`;
/// the first failing lookup aborts the listing.
pub(crate) async fn run_list(
    session: &Session,
    source: &dyn PurchaseKeySource,
    args: &ListArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let keys = source.purchase_keys(session).await?;
    info!(purchases = keys.len(), "library listed");

    if args.details {
        let details = PurchaseDetailResolver::new(session).resolve_all(&keys).await?;
        for (key, detail) in keys.iter().zip(&details) {
            writeln!(out, "{key}\t{}", detail.name()).context("Failed to write listing")?;
        }
    } else {
        for key in &keys {
            writeln!(out, "{key}").context("Failed to write listing")?;
        }
    }
    out.flush().context("Failed to write listing")?;
    Ok(())
}
