//! Purchase-key discovery from the account library page.
//!
//! The library page embeds the account's user data as JSON inside an element
//! with a fixed id. This is the only place that knows about that markup; the
//! rest of the pipeline talks to [`PurchaseKeySource`].

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::SyncError;
use crate::purchase::PurchaseKey;
use crate::session::Session;

/// Id of the element carrying the embedded user-data JSON.
pub const USER_DATA_ELEMENT_ID: &str = "user-home-json-data";

/// Anything that can list the purchase keys of the signed-in account.
#[async_trait]
pub trait PurchaseKeySource: Send + Sync {
    /// Returns the account's purchase keys in storefront order.
    async fn purchase_keys(&self, session: &Session) -> Result<Vec<PurchaseKey>, SyncError>;
}

/// Reads purchase keys from the HTML library page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryPage;

#[async_trait]
impl PurchaseKeySource for LibraryPage {
    #[instrument(skip_all)]
    async fn purchase_keys(&self, session: &Session) -> Result<Vec<PurchaseKey>, SyncError> {
        let url = session.endpoints().library_page()?;
        debug!(url = %url, "fetching library page");
        let body = session.fetch_bytes(url.as_str()).await?;
        let html = String::from_utf8_lossy(&body);
        extract_purchase_keys(&html)
    }
}

#[derive(Debug, Deserialize)]
struct UserHomeData {
    #[serde(default)]
    gamekeys: Vec<PurchaseKey>,
}

/// Extracts the `gamekeys` list from the embedded user-data element.
///
/// The storefront renders exactly one such element. If a page carries more,
/// the first in document order is used and a warning is logged; earlier
/// clients kept the last one instead.
///
/// # Errors
///
/// Returns [`SyncError::EmbeddedDataMissing`] when the element is absent and
/// [`SyncError::EmbeddedDataInvalid`] when its text is not the expected JSON.
#[allow(clippy::expect_used)]
pub fn extract_purchase_keys(html: &str) -> Result<Vec<PurchaseKey>, SyncError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("#{USER_DATA_ELEMENT_ID}"))
        .expect("static element selector is valid");

    let mut matches = document.select(&selector);
    let element = matches.next().ok_or(SyncError::EmbeddedDataMissing {
        element_id: USER_DATA_ELEMENT_ID,
    })?;
    if matches.next().is_some() {
        warn!(
            element_id = USER_DATA_ELEMENT_ID,
            "library page has more than one user-data element; using the first"
        );
    }

    let embedded: String = element.text().collect();
    let data: UserHomeData =
        serde_json::from_str(embedded.trim()).map_err(|source| SyncError::EmbeddedDataInvalid {
            element_id: USER_DATA_ELEMENT_ID,
            source,
        })?;

    debug!(keys = data.gamekeys.len(), "extracted purchase keys");
    Ok(data.gamekeys)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn page(embedded: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>Library</title></head><body>
<div id="site"></div>
<script id="user-home-json-data" type="application/json">{embedded}</script>
</body></html>"#
        )
    }

    #[test]
    fn test_extracts_keys_in_order() {
        let html = page(r#"{"gamekeys": ["zzz111", "aaa222", "mmm333"], "hasAdmin": false}"#);
        let keys = extract_purchase_keys(&html).unwrap();
        let keys: Vec<&str> = keys.iter().map(PurchaseKey::as_str).collect();
        assert_eq!(keys, ["zzz111", "aaa222", "mmm333"]);
    }

    #[test]
    fn test_empty_key_list() {
        let keys = extract_purchase_keys(&page(r#"{"gamekeys": []}"#)).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_json_with_markup_characters_survives() {
        let html = page(r#"{"gamekeys": ["k1"], "note": "a < b && c > d"}"#);
        assert_eq!(extract_purchase_keys(&html).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_element_is_parse_failure() {
        let html = "<html><body><script id=\"other\">{\"gamekeys\": [\"x\"]}</script></body></html>";
        let err = extract_purchase_keys(html).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, SyncError::EmbeddedDataMissing { .. }));
    }

    #[test]
    fn test_empty_element_is_parse_failure() {
        let err = extract_purchase_keys(&page("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, SyncError::EmbeddedDataInvalid { .. }));
    }

    #[test]
    fn test_wrong_gamekeys_type_is_parse_failure() {
        let err = extract_purchase_keys(&page(r#"{"gamekeys": "abc"}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_first_element_wins_when_duplicated() {
        let html = format!(
            "{}<div id=\"user-home-json-data\">{{\"gamekeys\": [\"second\"]}}</div>",
            page(r#"{"gamekeys": ["first"]}"#)
        );
        let keys = extract_purchase_keys(&html).unwrap();
        assert_eq!(keys[0].as_str(), "first");
    }
}
