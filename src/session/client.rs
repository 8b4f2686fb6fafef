//! HTTP client construction for authenticated sessions.

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::Jar;

use super::SessionOptions;
use crate::error::SyncError;
use crate::user_agent;

/// Builds the shared client: cookie jar, connect timeout, optional read
/// timeout, gzip.
///
/// No total request timeout is set so large downloads are never cut off.
pub(crate) fn build_client(
    cookie_jar: Arc<Jar>,
    options: &SessionOptions,
) -> Result<Client, SyncError> {
    let mut builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .cookie_provider(cookie_jar);
    if let Some(read_timeout) = options.read_timeout {
        builder = builder.read_timeout(read_timeout);
    }
    builder.build().map_err(SyncError::client)
}
