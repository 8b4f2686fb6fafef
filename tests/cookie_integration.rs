//! Integration tests for cookie loading and what the session sends.

mod support;

use std::io::Cursor;

use hbsync_core::auth::{CookieError, load_cookies_into_jar, parse_netscape_cookies};
use hbsync_core::{ErrorKind, LibraryPage, PurchaseKeySource, Session, SessionOptions, SyncError};
use reqwest::cookie::CookieStore;
use support::library_html;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options_for(server: &MockServer) -> SessionOptions {
    SessionOptions::with_base_url(Url::parse(&format!("{}/", server.uri())).unwrap())
}

async fn mount_library(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/home/library"))
        .respond_with(ResponseTemplate::new(200).set_body_string(library_html(&["k"])))
        .mount(server)
        .await;
}

async fn cookie_headers(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| request.headers.get("cookie"))
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_cookies_for_other_domains_are_not_sent() {
    let server = MockServer::start().await;
    mount_library(&server).await;
    let dir = TempDir::new().unwrap();
    let cookies = dir.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        ".unrelated-domain.com\tTRUE\t/\tFALSE\t0\tsession\tsecret\n",
    )
    .unwrap();

    let session = Session::initialize(&cookies, &options_for(&server)).unwrap();
    LibraryPage.purchase_keys(&session).await.unwrap();

    assert!(cookie_headers(&server).await.is_empty());
}

#[tokio::test]
async fn test_expired_cookie_is_dropped() {
    let server = MockServer::start().await;
    mount_library(&server).await;
    let dir = TempDir::new().unwrap();
    let cookies = dir.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        "127.0.0.1\tFALSE\t/\tFALSE\t1000000000\told\tgone\n\
         127.0.0.1\tFALSE\t/\tFALSE\t0\tfresh\there\n",
    )
    .unwrap();

    let session = Session::initialize(&cookies, &options_for(&server)).unwrap();
    LibraryPage.purchase_keys(&session).await.unwrap();

    assert_eq!(cookie_headers(&server).await, ["fresh=here"]);
}

#[test]
fn test_invalid_storefront_cookie_fails_initialize() {
    let dir = TempDir::new().unwrap();
    let cookies = dir.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        ".humblebundle.com\tTRUE\t/\tTRUE\t0\tbad name\tvalue\n",
    )
    .unwrap();

    let err = Session::initialize(&cookies, &SessionOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CookieLoad);
    match err {
        SyncError::CookieLoad {
            source: CookieError::InvalidCookie { name, .. },
            ..
        } => assert_eq!(name, "bad name"),
        other => panic!("expected invalid cookie, got {other:?}"),
    }
}

#[test]
fn test_malformed_line_fails_whole_file_with_line_number() {
    let input = "\
# Netscape HTTP Cookie File
.humblebundle.com\tTRUE\t/\tTRUE\t0\t_simpleauth_sess\tabc
this line is totally wrong
";
    let err = parse_netscape_cookies(Cursor::new(input.as_bytes())).unwrap_err();
    match err {
        CookieError::InvalidLine { line_number, .. } => assert_eq!(line_number, 3),
        other => panic!("expected invalid line, got {other:?}"),
    }
}

#[test]
fn test_http_only_export_matches_storefront_subdomains() {
    let input = "#HttpOnly_.humblebundle.com\tTRUE\t/\tTRUE\t0\t_simpleauth_sess\tabc\n";
    let cookies = parse_netscape_cookies(Cursor::new(input.as_bytes())).unwrap();
    let jar = load_cookies_into_jar(&cookies);

    let www = Url::parse("https://www.humblebundle.com/home/library").unwrap();
    assert!(jar.cookies(&www).is_some());
    let other = Url::parse("https://example.com/").unwrap();
    assert!(jar.cookies(&other).is_none());
}
