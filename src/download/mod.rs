//! Download planning and transfer.
//!
//! [`DownloadPlanner`] turns one [`PurchaseDetail`](crate::purchase::PurchaseDetail)
//! into a [`TransferQueue`]; [`Transferrer`] drains that queue in order,
//! streaming each body to disk.
//!
//! # Example
//!
//! ```no_run
//! use hbsync_core::download::{DownloadPlanner, NoProgress, Transferrer};
//! use hbsync_core::purchase::{PurchaseDetailResolver, PurchaseKey};
//! use hbsync_core::{Session, SessionOptions};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::initialize(Path::new("cookies.txt"), &SessionOptions::default())?;
//! let detail = PurchaseDetailResolver::new(&session)
//!     .resolve(&PurchaseKey::from("aBcD1234"))
//!     .await?;
//! let mut plan = DownloadPlanner::new("epub", "./library").plan(&detail)?;
//! let outcomes = Transferrer::new(&session, &NoProgress).run(&mut plan.queue).await?;
//! println!("{} files handled", outcomes.len());
//! # Ok(())
//! # }
//! ```

mod planner;
mod progress;
mod task;
mod transfer;

pub use planner::{DownloadPlan, DownloadPlanner, SubproductInventory};
pub use progress::{BarProgress, NoProgress, ProgressReporter};
pub use task::{TransferQueue, TransferStatus, TransferTask};
pub use transfer::{ErrorPolicy, TransferOutcome, TransferSummary, Transferrer};
