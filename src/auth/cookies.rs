//! Netscape cookie file parser, validator and reqwest jar loader.
//!
//! Parses the Netscape HTTP cookie file format (7 TAB-separated fields per line)
//! as exported by curl and browser extensions, validates the cookies that apply
//! to the storefront host, and loads them into a `reqwest::cookie::Jar`.
//!
//! Loading is strict: one malformed line or one invalid target cookie fails the
//! whole file.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use tracing::{debug, instrument, warn};

/// Prefix curl uses to mark `HttpOnly` cookies. Such lines are data, not comments.
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Latest expiry that still formats as an HTTP-date (9999-12-31T23:59:59Z).
const MAX_COOKIE_EXPIRES: u64 = 253_402_300_799;

/// A single parsed cookie from a Netscape-format cookie file.
///
/// The value field is redacted in Debug output.
#[derive(Clone)]
pub struct CookieLine {
    /// The domain the cookie belongs to (e.g., `.humblebundle.com`).
    pub domain: String,
    /// Whether subdomains should match.
    pub tailmatch: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Whether the line carried curl's `#HttpOnly_` marker.
    pub http_only: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    /// Cookie value. Sensitive, never logged.
    value: String,
}

impl CookieLine {
    /// Creates a new cookie entry.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        domain: String,
        tailmatch: bool,
        path: String,
        secure: bool,
        http_only: bool,
        expires: u64,
        name: String,
        value: String,
    ) -> Self {
        Self {
            domain,
            tailmatch,
            path,
            secure,
            http_only,
            expires,
            name,
            value,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true when this cookie would be sent to `host`.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let domain = self.domain.to_ascii_lowercase();
        let bare = domain.strip_prefix('.').unwrap_or(&domain);
        if host == bare {
            return true;
        }
        (self.tailmatch || domain.starts_with('.')) && host.ends_with(&format!(".{bare}"))
    }

    /// Returns true when the cookie carries an expiry that lies before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        if self.expires == 0 {
            return false;
        }
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.expires <= now_secs
    }
}

impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("tailmatch", &self.tailmatch)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while loading a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// A line in the cookie file has an invalid format.
    #[error("line {line_number}: {reason} (got: {content})")]
    InvalidLine {
        /// 1-based line number in the cookie file.
        line_number: usize,
        /// The offending line content (value redacted).
        content: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// A cookie for the storefront host failed a validity check.
    #[error("cookie '{name}' for {domain} is invalid: {reason}")]
    InvalidCookie {
        /// Cookie name (may itself be the invalid part).
        name: String,
        /// Cookie domain.
        domain: String,
        /// Which check failed.
        reason: String,
    },

    /// I/O error reading the cookie file.
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses a Netscape-format cookie file from a buffered reader.
///
/// Each non-comment, non-blank line must contain exactly 7 TAB-separated fields:
/// `domain`, `tailmatch`, `path`, `secure`, `expires`, `name`, `value`.
///
/// Lines starting with `#` and blank lines are skipped, except lines starting
/// with `#HttpOnly_`, which are parsed as `HttpOnly` cookies.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure and [`CookieError::InvalidLine`]
/// for the first malformed line.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<Vec<CookieLine>, CookieError> {
    let mut cookies = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        // Handle CRLF: strip trailing \r
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            continue;
        }

        let (data, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.starts_with('#') => continue,
            None => (line, false),
        };

        let cookie = parse_cookie_line(data, http_only, line_number)?;
        debug!(
            line = line_number,
            domain = %cookie.domain,
            name = %cookie.name,
            "parsed cookie"
        );
        cookies.push(cookie);
    }

    Ok(cookies)
}

/// Reads a cookie file and returns the cookies to load for `target_host`.
///
/// Every cookie that would be sent to `target_host` must pass
/// [`validate_cookie`]. Expired cookies are dropped, as a browser would.
///
/// # Errors
///
/// Returns [`CookieError`] when the file cannot be read, a line is malformed,
/// or a target cookie is invalid.
#[instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn load_cookie_file(path: &Path, target_host: &str) -> Result<Vec<CookieLine>, CookieError> {
    let file = File::open(path)?;
    let cookies = parse_netscape_cookies(BufReader::new(file))?;
    select_cookies_for_host(cookies, target_host, SystemTime::now())
}

/// Validates the target-host cookies and drops expired entries.
///
/// # Errors
///
/// Returns [`CookieError::InvalidCookie`] for the first target cookie that
/// fails validation.
pub fn select_cookies_for_host(
    cookies: Vec<CookieLine>,
    target_host: &str,
    now: SystemTime,
) -> Result<Vec<CookieLine>, CookieError> {
    let mut kept = Vec::with_capacity(cookies.len());
    let mut target_count = 0usize;

    for cookie in cookies {
        if cookie.is_expired_at(now) {
            debug!(domain = %cookie.domain, name = %cookie.name, "dropping expired cookie");
            continue;
        }
        if cookie.matches_host(target_host) {
            validate_cookie(&cookie)?;
            target_count += 1;
        }
        kept.push(cookie);
    }

    if target_count == 0 {
        warn!(host = target_host, "cookie file has no cookies for the storefront host");
    }

    Ok(kept)
}

/// Checks domain, expiry and syntax validity of a cookie.
///
/// # Errors
///
/// Returns [`CookieError::InvalidCookie`] naming the failed check.
pub fn validate_cookie(cookie: &CookieLine) -> Result<(), CookieError> {
    let invalid = |reason: &str| CookieError::InvalidCookie {
        name: cookie.name.clone(),
        domain: cookie.domain.clone(),
        reason: reason.to_string(),
    };

    if !is_valid_token(&cookie.name) {
        return Err(invalid("name contains characters not allowed in a cookie name"));
    }
    if !is_valid_value(cookie.value()) {
        return Err(invalid("value contains characters not allowed in a cookie value"));
    }
    if !cookie.path.bytes().all(|b| (0x20..0x7f).contains(&b) && b != b';') {
        return Err(invalid("path contains control characters or ';'"));
    }
    if !is_valid_domain(&cookie.domain) {
        return Err(invalid("domain is not a valid host name"));
    }
    if cookie.expires > MAX_COOKIE_EXPIRES {
        return Err(invalid("expiry lies beyond year 9999"));
    }
    Ok(())
}

fn is_valid_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            (0x21..0x7f).contains(&b) && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

fn is_valid_value(value: &str) -> bool {
    let unquoted = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };
    unquoted
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\')
}

fn is_valid_domain(domain: &str) -> bool {
    let bare = domain.strip_prefix('.').unwrap_or(domain);
    if bare.parse::<IpAddr>().is_ok() {
        return true;
    }
    if bare.is_empty() || bare.len() > 255 {
        return false;
    }
    bare.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

/// Parses a single cookie line into a `CookieLine`.
fn parse_cookie_line(
    line: &str,
    http_only: bool,
    line_number: usize,
) -> Result<CookieLine, CookieError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() != 7 {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!("expected 7 TAB-separated fields, found {}", fields.len()),
        });
    }

    let domain = fields[0].to_string();
    let tailmatch = parse_bool_field(fields[1], "tailmatch", line_number, line)?;
    let path = fields[2].to_string();
    let secure = parse_bool_field(fields[3], "secure", line_number, line)?;

    let expires = fields[4]
        .parse::<u64>()
        .map_err(|_| CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!(
                "expires field must be a non-negative integer, got '{}'",
                fields[4]
            ),
        })?;

    let name = fields[5].to_string();
    let value = fields[6].to_string();

    if domain.is_empty() {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: "domain field is empty".to_string(),
        });
    }

    if name.is_empty() {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: "cookie name field is empty".to_string(),
        });
    }

    Ok(CookieLine::new(
        domain, tailmatch, path, secure, http_only, expires, name, value,
    ))
}

/// Parses a `TRUE`/`FALSE` string field. curl writes upper case; some
/// exporters write lower case.
fn parse_bool_field(
    value: &str,
    field_name: &str,
    line_number: usize,
    line: &str,
) -> Result<bool, CookieError> {
    if value.eq_ignore_ascii_case("TRUE") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("FALSE") {
        Ok(false)
    } else {
        Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!("{field_name} field must be TRUE or FALSE, got '{value}'"),
        })
    }
}

/// Redacts cookie value (7th field) from a line for safe error messages.
fn redact_line_for_error(line: &str) -> String {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() >= 7 {
        let mut redacted = fields[..6].join("\t");
        redacted.push_str("\t[REDACTED]");
        redacted
    } else {
        line.to_string()
    }
}

/// Loads cookies into a `reqwest::cookie::Jar`.
///
/// Each `CookieLine` is converted to a `Set-Cookie` header string and added
/// to the jar with an origin URL built from its domain and path.
#[instrument(level = "debug", skip(cookies))]
pub fn load_cookies_into_jar(cookies: &[CookieLine]) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());

    for cookie in cookies {
        let set_cookie = build_set_cookie_string(cookie);
        let origin_url = build_origin_url(cookie);

        if let Ok(url) = origin_url.parse::<url::Url>() {
            jar.add_cookie_str(&set_cookie, &url);
            debug!(
                domain = %cookie.domain,
                name = %cookie.name,
                "loaded cookie into jar"
            );
        } else {
            warn!(
                domain = %cookie.domain,
                name = %cookie.name,
                "skipping cookie with unparseable domain"
            );
        }
    }

    jar
}

/// Builds a `Set-Cookie` header string from a `CookieLine`.
///
/// Host-only cookies (no tailmatch, no leading dot) carry no `Domain`
/// attribute so the jar keeps them host-only.
fn build_set_cookie_string(cookie: &CookieLine) -> String {
    let mut parts = vec![format!("{}={}", cookie.name, cookie.value())];

    if cookie.tailmatch || cookie.domain.starts_with('.') {
        parts.push(format!("Domain={}", cookie.domain));
    }

    parts.push(format!("Path={}", cookie.path));

    if cookie.secure {
        parts.push("Secure".to_string());
    }
    if cookie.http_only {
        parts.push("HttpOnly".to_string());
    }

    // 0 = session cookie, no Expires
    if cookie.expires > 0 {
        if let Some(expires_str) = unix_to_http_date(cookie.expires) {
            parts.push(format!("Expires={expires_str}"));
        } else {
            warn!(
                domain = %cookie.domain,
                name = %cookie.name,
                expires = cookie.expires,
                "cookie expiry timestamp out of range; treating as session cookie"
            );
        }
    }

    parts.join("; ")
}

/// Builds the origin URL for `Jar::add_cookie_str`.
///
/// Uses `https://` for secure cookies and `http://` otherwise, with the
/// leading dot stripped from the domain.
fn build_origin_url(cookie: &CookieLine) -> String {
    let scheme = if cookie.secure { "https" } else { "http" };
    let domain = cookie.domain.strip_prefix('.').unwrap_or(&cookie.domain);
    let path = if cookie.path.starts_with('/') {
        cookie.path.as_str()
    } else {
        "/"
    };
    format!("{scheme}://{domain}{path}")
}

/// Converts a Unix timestamp to an HTTP-date string (RFC 7231).
fn unix_to_http_date(timestamp: u64) -> Option<String> {
    if timestamp > MAX_COOKIE_EXPIRES {
        return None;
    }
    let time = UNIX_EPOCH.checked_add(Duration::from_secs(timestamp))?;
    Some(httpdate::fmt_http_date(time))
}
