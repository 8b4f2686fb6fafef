//! Shared fixtures for integration tests: cookie files, library pages and
//! order payloads served from a wiremock server.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use hbsync_core::{Session, SessionOptions};
use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

pub const SESSION_COOKIE_NAME: &str = "_simpleauth_sess";
pub const SESSION_COOKIE_VALUE: &str = "s3cr3t-t0ken";

/// Writes a cookie export holding a session cookie for the mock server host
/// plus an unrelated `#HttpOnly_` entry.
pub fn write_cookie_file(dir: &Path) -> PathBuf {
    let path = dir.join("cookies.txt");
    let content = format!(
        "# Netscape HTTP Cookie File\n\
         # This is a generated file! Do not edit.\n\
         \n\
         127.0.0.1\tFALSE\t/\tFALSE\t0\t{SESSION_COOKIE_NAME}\t{SESSION_COOKIE_VALUE}\n\
         #HttpOnly_.example.org\tTRUE\t/\tTRUE\t0\tother\tvalue\n"
    );
    std::fs::write(&path, content).expect("write cookie file");
    path
}

/// Session pointed at the mock server.
pub fn session_for(server: &MockServer, dir: &Path) -> Session {
    let cookies = write_cookie_file(dir);
    let base = Url::parse(&format!("{}/", server.uri())).expect("mock server uri");
    Session::initialize(&cookies, &SessionOptions::with_base_url(base)).expect("session")
}

/// Minimal library page embedding `keys`.
pub fn library_html(keys: &[&str]) -> String {
    let data = json!({ "gamekeys": keys, "hasAdmin": false });
    format!(
        "<!DOCTYPE html><html><head><title>Library</title></head><body>\
         <div class=\"js-library-holder\"></div>\
         <script id=\"user-home-json-data\" type=\"application/json\">{data}</script>\
         </body></html>"
    )
}

/// One downloadable file: format, body served at `path`.
pub struct FileSpec<'a> {
    pub format: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
}

/// One subproduct with a single platform group.
pub struct SubSpec<'a> {
    pub name: &'a str,
    pub platform: &'a str,
    pub files: Vec<FileSpec<'a>>,
}

/// Order payload in the shape of the order API. File sizes match the bodies.
pub fn order_json(server: &MockServer, key: &str, product: &str, subs: &[SubSpec<'_>]) -> Value {
    let subproducts: Vec<Value> = subs
        .iter()
        .map(|sub| {
            let variants: Vec<Value> = sub
                .files
                .iter()
                .map(|file| {
                    json!({
                        "name": file.format,
                        "sha1": "0000",
                        "human_size": format!("{} B", file.body.len()),
                        "file_size": file.body.len(),
                        "url": {
                            "web": format!("{}{}", server.uri(), file.path),
                            "bittorrent": null
                        }
                    })
                })
                .collect();
            json!({
                "human_name": sub.name,
                "machine_name": sub.name.to_lowercase(),
                "downloads": [{
                    "machine_name": format!("{}_{}", sub.name.to_lowercase(), sub.platform),
                    "platform": sub.platform,
                    "download_struct": variants
                }]
            })
        })
        .collect();

    json!({
        "gamekey": key,
        "created": "2024-03-01T12:00:00.000000",
        "amount_spent": 15.0,
        "product": { "human_name": product, "machine_name": product.to_lowercase() },
        "payee": { "human_name": "Humble Bundle", "machine_name": "humblebundle" },
        "subproducts": subproducts
    })
}

/// Path the order API is served at for `key`.
pub fn order_path(key: &str) -> String {
    format!("/api/v1/order/{key}")
}
