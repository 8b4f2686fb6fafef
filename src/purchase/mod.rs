//! Purchase records and their resolution from the order API.

mod model;
mod resolver;

pub use model::{
    DownloadVariant, DownloadVariantGroup, Payee, Product, PurchaseDetail, PurchaseKey,
    Subproduct, VariantUrls,
};
pub use resolver::PurchaseDetailResolver;
