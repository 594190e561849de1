//! Test helpers shared by the integration tests
//!
//! `FakeHub` stands in for GitHub: it serves release listings per repository
//! and asset bodies per download URL, and records every download it serves.
//! `HttpFixture` is a loopback HTTP server for exercising the real client.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_core::github::{Asset, AssetFetcher, Release, ReleaseLocator, RepositoryRef};
use catalog_core::{CatalogError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// In-memory release host
#[derive(Default)]
pub struct FakeHub {
    releases: HashMap<String, Vec<Release>>,
    blobs: HashMap<String, String>,
    downloads: Mutex<Vec<String>>,
}

/// Download URL of an asset in the form GitHub uses
pub fn download_url(slug: &str, tag: &str, asset: &str) -> String {
    format!("https://github.com/{slug}/releases/download/{tag}/{asset}")
}

/// Contract YAML declaring `(name, version)` pairs for one kind
pub fn contract_yaml(kind: &str, resources: &[(&str, &str)]) -> String {
    let mut yaml = format!("version: v1\ncatalog:\n  resources:\n    {kind}:\n");
    for (name, version) in resources {
        yaml.push_str(&format!("      - name: {name}\n        version: {version}\n"));
    }
    yaml
}

impl FakeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a release of `slug` with the given `(asset name, body)` pairs
    pub fn release<B: AsRef<str>>(mut self, slug: &str, tag: &str, assets: &[(&str, B)]) -> Self {
        let assets = assets
            .iter()
            .map(|(name, body)| {
                let url = download_url(slug, tag, name);
                self.blobs.insert(url.clone(), body.as_ref().to_string());
                Asset::new(*name, url)
            })
            .collect();

        self.releases
            .entry(slug.to_string())
            .or_default()
            .push(Release::new(tag, assets));
        self
    }

    /// Publish a release whose asset is listed but cannot be downloaded
    pub fn broken_release(mut self, slug: &str, tag: &str, asset: &str) -> Self {
        let url = download_url(slug, tag, asset);
        self.releases
            .entry(slug.to_string())
            .or_default()
            .push(Release::new(tag, vec![Asset::new(asset, url)]));
        self
    }

    /// Mark the most recent release of `slug` as a draft
    pub fn draft(mut self, slug: &str) -> Self {
        if let Some(release) = self
            .releases
            .get_mut(slug)
            .and_then(|releases| releases.last_mut())
        {
            release.draft = true;
        }
        self
    }

    /// Mark the most recent release of `slug` as a pre-release
    pub fn prerelease(mut self, slug: &str) -> Self {
        if let Some(release) = self
            .releases
            .get_mut(slug)
            .and_then(|releases| releases.last_mut())
        {
            release.prerelease = true;
        }
        self
    }

    /// URLs downloaded so far, in order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReleaseLocator for FakeHub {
    async fn list_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>> {
        self.releases
            .get(&repository.slug())
            .cloned()
            .ok_or_else(|| CatalogError::HttpStatus {
                url: format!("https://api.github.com/{}", repository.releases_path()),
                status: 404,
            })
    }
}

#[async_trait]
impl AssetFetcher for FakeHub {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloads.lock().unwrap().push(url.to_string());
        let body = self.blobs.get(url).ok_or_else(|| CatalogError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })?;
        std::fs::write(dest, body)?;
        Ok(())
    }
}

type Routes = Arc<Mutex<HashMap<String, String>>>;

/// Loopback HTTP/1.1 server answering GET requests from a route table
///
/// Unknown paths answer 404. Every requested path is recorded.
pub struct HttpFixture {
    base: String,
    routes: Routes,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HttpFixture {
    pub fn start() -> Self {
        // Keep loopback traffic away from any proxy configured in the environment
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();

        let (served_routes, log) = (Arc::clone(&routes), Arc::clone(&requests));
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                answer(stream, &served_routes, &log);
            }
        });

        Self {
            base,
            routes,
            requests,
        }
    }

    /// `http://127.0.0.1:<port>`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Serve `body` for GET requests to `path` (including any query string)
    pub fn route(&self, path: &str, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn answer(mut stream: TcpStream, routes: &Routes, log: &Mutex<Vec<String>>) {
    let Ok(reader) = stream.try_clone() else { return };
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(path.clone());

    let body = routes.lock().unwrap().get(&path).cloned();
    let (status, body) = match body {
        Some(body) => ("200 OK", body),
        None => ("404 Not Found", String::new()),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}
