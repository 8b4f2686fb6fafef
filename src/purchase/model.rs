//! Purchase-detail records as returned by the order API.
//!
//! Decoding is tolerant: unknown fields are ignored and missing or `null`
//! fields become empty values, so callers must cope with blank names and
//! zero sizes. A field holding the wrong JSON type still fails decoding.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of one purchased bundle/order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseKey(String);

impl PurchaseKey {
    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PurchaseKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PurchaseKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One order: the bundle and everything in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseDetail {
    /// Purchase key of this order.
    #[serde(deserialize_with = "null_as_default")]
    pub gamekey: PurchaseKey,
    /// Creation timestamp as sent by the API.
    #[serde(rename = "created", deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Amount paid.
    #[serde(deserialize_with = "null_as_default")]
    pub amount_spent: f64,
    /// Bundle-level product info.
    #[serde(deserialize_with = "null_as_default")]
    pub product: Product,
    /// Who received the payment.
    #[serde(deserialize_with = "null_as_default")]
    pub payee: Payee,
    /// Items in the order, in API order.
    #[serde(deserialize_with = "null_as_default")]
    pub subproducts: Vec<Subproduct>,
}

impl PurchaseDetail {
    /// Display name of the bundle.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.product.human_name
    }
}

/// Bundle-level product info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(deserialize_with = "null_as_default")]
    pub human_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub machine_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payee {
    #[serde(deserialize_with = "null_as_default")]
    pub human_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub machine_name: String,
}

/// One titled item inside a purchase, e.g. a single book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subproduct {
    #[serde(deserialize_with = "null_as_default")]
    pub human_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub machine_name: String,
    /// One group per platform.
    #[serde(deserialize_with = "null_as_default")]
    pub downloads: Vec<DownloadVariantGroup>,
}

/// Downloads of one subproduct for one platform (e.g. "ebook").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadVariantGroup {
    #[serde(deserialize_with = "null_as_default")]
    pub machine_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(rename = "download_struct", deserialize_with = "null_as_default")]
    pub variants: Vec<DownloadVariant>,
}

/// One concrete downloadable file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadVariant {
    /// Format name, e.g. "EPUB", "PDF", "CBZ".
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Advisory checksum, never verified.
    #[serde(deserialize_with = "null_as_default")]
    pub sha1: String,
    /// Advisory checksum, never verified.
    #[serde(deserialize_with = "null_as_default")]
    pub md5: String,
    /// Size for display, e.g. "4.2 MB".
    #[serde(deserialize_with = "null_as_default")]
    pub human_size: String,
    /// Size in bytes; the skip check compares against this.
    #[serde(deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub url: VariantUrls,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantUrls {
    /// Signed direct download URL.
    #[serde(deserialize_with = "null_as_default")]
    pub web: String,
    /// Unused.
    #[serde(deserialize_with = "null_as_default")]
    pub bittorrent: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "amount_spent": 15.0,
        "product": {"human_name": "Humble Book Bundle: Rust", "machine_name": "rust_bookbundle"},
        "gamekey": "aBcD1234",
        "created": "2024-03-01T10:00:00.000000",
        "uid": "extra-field",
        "payee": {"human_name": "Publisher", "machine_name": "publisher"},
        "subproducts": [{
            "human_name": "BookOne",
            "machine_name": "bookone",
            "library_family_name": null,
            "downloads": [{
                "machine_name": "bookone_ebook",
                "platform": "ebook",
                "download_struct": [
                    {"name": "PDF", "sha1": "aa", "md5": "bb", "human_size": "100 B",
                     "file_size": 100, "url": {"web": "https://dl.example/bookone.pdf", "bittorrent": "https://dl.example/bookone.pdf.torrent"}},
                    {"name": "EPUB", "human_size": "200 B", "file_size": 200,
                     "url": {"web": "https://dl.example/bookone.epub"}}
                ]
            }]
        }]
    }"#;

    #[test]
    fn test_decode_full_order() {
        let detail: PurchaseDetail = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(detail.gamekey.as_str(), "aBcD1234");
        assert_eq!(detail.name(), "Humble Book Bundle: Rust");
        assert_eq!(detail.created_at, "2024-03-01T10:00:00.000000");
        assert!((detail.amount_spent - 15.0).abs() < f64::EPSILON);
        assert_eq!(detail.payee.machine_name, "publisher");

        let group = &detail.subproducts[0].downloads[0];
        assert_eq!(group.platform, "ebook");
        assert_eq!(group.variants.len(), 2);
        assert_eq!(group.variants[0].name, "PDF");
        assert_eq!(group.variants[0].file_size, 100);
        assert_eq!(group.variants[1].url.web, "https://dl.example/bookone.epub");
        assert_eq!(group.variants[1].sha1, "");
    }

    #[test]
    fn test_missing_fields_decode_to_empty_values() {
        let detail: PurchaseDetail =
            serde_json::from_str(r#"{"subproducts": [{"downloads": [{"download_struct": [{}]}]}]}"#)
                .unwrap();
        assert_eq!(detail.name(), "");
        let variant = &detail.subproducts[0].downloads[0].variants[0];
        assert_eq!(variant.name, "");
        assert_eq!(variant.file_size, 0);
        assert_eq!(variant.url.web, "");
    }

    #[test]
    fn test_null_fields_decode_to_empty_values() {
        let detail: PurchaseDetail = serde_json::from_str(
            r#"{"product": null, "payee": null, "subproducts": [{"human_name": null, "downloads": null}]}"#,
        )
        .unwrap();
        assert_eq!(detail.payee, Payee::default());
        assert_eq!(detail.subproducts[0].human_name, "");
        assert!(detail.subproducts[0].downloads.is_empty());
    }

    #[test]
    fn test_wrong_type_fails_decoding() {
        let result = serde_json::from_str::<PurchaseDetail>(r#"{"subproducts": "none"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_size_fails_decoding() {
        let result = serde_json::from_str::<PurchaseDetail>(
            r#"{"subproducts": [{"downloads": [{"download_struct": [{"file_size": -1}]}]}]}"#,
        );
        assert!(result.is_err());
    }
}
