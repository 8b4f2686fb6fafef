//! Turns a purchase detail into an ordered transfer queue.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument};

use super::task::{TransferQueue, TransferTask};
use crate::error::SyncError;
use crate::purchase::PurchaseDetail;

/// Platforms and formats a subproduct offers, before filtering.
///
/// Only used for verbose reporting; it has no effect on the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubproductInventory {
    /// Subproduct display name.
    pub name: String,
    /// Platform label of every download group, in API order.
    pub platforms: Vec<String>,
    /// Distinct format names across all groups.
    pub formats: BTreeSet<String>,
}

/// Result of planning one purchase.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    /// `<library>/<product name>`, created by the planner.
    pub product_dir: PathBuf,
    /// Matching downloads in traversal order.
    pub queue: TransferQueue,
    /// What every subproduct offers.
    pub inventory: Vec<SubproductInventory>,
}

/// Builds transfer queues for one format.
#[derive(Debug, Clone)]
pub struct DownloadPlanner {
    format: String,
    library_root: PathBuf,
    dedupe: bool,
}

impl DownloadPlanner {
    /// Creates a planner selecting `format` (case-insensitive) into `library_root`.
    #[must_use]
    pub fn new(format: impl Into<String>, library_root: impl Into<PathBuf>) -> Self {
        Self {
            format: format.into().to_lowercase(),
            library_root: library_root.into(),
            dedupe: false,
        }
    }

    /// Drops tasks whose destination equals an earlier task's.
    ///
    /// Off by default: the same file offered under two platforms is queued twice.
    #[must_use]
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Walks subproducts → platform groups → variants and queues every
    /// variant whose format matches.
    ///
    /// Creates the product directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the product directory cannot be created.
    #[instrument(skip(self, detail), fields(product = detail.name(), format = %self.format))]
    pub fn plan(&self, detail: &PurchaseDetail) -> Result<DownloadPlan, SyncError> {
        let product_dir = self.library_root.join(safe_path_component(detail.name()));
        std::fs::create_dir_all(&product_dir)
            .map_err(|e| SyncError::io(product_dir.clone(), e))?;

        let mut queue = TransferQueue::new();
        let mut inventory = Vec::with_capacity(detail.subproducts.len());

        for subproduct in &detail.subproducts {
            let mut seen = SubproductInventory {
                name: subproduct.human_name.clone(),
                ..SubproductInventory::default()
            };
            let file_stem = safe_path_component(&subproduct.human_name);

            for group in &subproduct.downloads {
                seen.platforms.push(group.platform.clone());
                for variant in &group.variants {
                    seen.formats.insert(variant.name.clone());
                    if variant.name.to_lowercase() != self.format {
                        continue;
                    }

                    let task = TransferTask::new(
                        file_stem.clone(),
                        product_dir.clone(),
                        variant.name.to_lowercase(),
                        variant.url.web.clone(),
                        variant.file_size,
                    );
                    if self.dedupe && queue.contains_destination(&task.destination()) {
                        debug!(
                            destination = %task.destination().display(),
                            platform = %group.platform,
                            "skipping duplicate destination"
                        );
                        continue;
                    }
                    queue.push(task);
                }
            }

            debug!(
                subproduct = %seen.name,
                platforms = ?seen.platforms,
                formats = ?seen.formats,
                "subproduct inventory"
            );
            inventory.push(seen);
        }

        info!(
            tasks = queue.len(),
            dir = %product_dir.display(),
            "download plan ready"
        );
        Ok(DownloadPlan {
            product_dir,
            queue,
            inventory,
        })
    }
}

/// Makes a display name safe to use as one path component.
///
/// Separators and control characters become `_`; names that would resolve to
/// `.`/`..` or are empty are replaced as well. Everything else is kept as-is.
pub(crate) fn safe_path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.trim().is_empty() {
        return "_".to_string();
    }

    let is_single_normal = {
        let mut components = Path::new(&cleaned).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    };
    if is_single_normal {
        cleaned
    } else {
        cleaned.replace('.', "_")
    }
}
