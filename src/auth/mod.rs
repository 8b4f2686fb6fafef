//! Authentication via exported browser cookies.
//!
//! Cookies are loaded from Netscape-format cookie files as written by curl
//! and common browser export extensions.

mod cookies;

pub use cookies::{
    CookieError, CookieLine, load_cookie_file, load_cookies_into_jar, parse_netscape_cookies,
    select_cookies_for_host, validate_cookie,
};
