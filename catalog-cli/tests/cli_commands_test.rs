//! Integration tests for the catalog-cd commands
//!
//! Remote commands run against a loopback HTTP server standing in for the
//! GitHub API, selected with `--api-base`.

use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

/// Helper to run catalog-cd in a directory
fn run_catalog_cd(dir: &Path, args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_catalog-cd"))
        .current_dir(dir)
        .args(args)
        .env("NO_PROXY", "127.0.0.1,localhost")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .output()
        .expect("Failed to run catalog-cd")
}

/// Start a loopback HTTP server; `routes` maps request paths to bodies given
/// the server base URL. Returns the base URL.
fn serve(routes: impl FnOnce(&str) -> HashMap<String, String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes = routes(&base);

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap_or_default();
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap_or(0) > 0 && header != "\r\n" {
                header.clear();
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = match routes.get(path) {
                Some(body) => ("200 OK", body.as_str()),
                None => ("404 Not Found", ""),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    base
}

/// Routes for one release `v1` per repository, each publishing `contract`
fn release_routes(base: &str, repos: &[(&str, &str)]) -> HashMap<String, String> {
    let mut routes = HashMap::new();
    for (slug, contract) in repos {
        let asset_url = format!("{base}/download/{slug}/v1/catalog.yaml");
        let listing = json!([{
            "tag_name": "v1",
            "assets": [{ "name": "catalog.yaml", "browser_download_url": asset_url }]
        }]);
        routes.insert(
            format!("/repos/{slug}/releases?per_page=100&page=1"),
            listing.to_string(),
        );
        routes.insert(format!("/download/{slug}/v1/catalog.yaml"), contract.to_string());
    }
    routes
}

const TWO_REPOS: &str = "repositories:\n  - name: one\n    url: https://github.com/org/one\n    type: tasks\n  - name: two\n    url: https://github.com/org/two\n    type: tasks\n";

const VALID_CONTRACT: &str = r#"
version: v1
catalog:
  resources:
    tasks:
      - name: git-clone
        version: 0.9.0
        filename: git-clone.yaml
      - name: git-clone
        version: 0.10.0
    pipelines:
      - name: build-and-deploy
        version: 0.1.0
"#;

#[test]
fn test_check_accepts_contract_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("catalog.yaml"), VALID_CONTRACT).unwrap();

    let output = run_catalog_cd(temp_dir.path(), &["check", "."]);

    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tasks: 1"), "unexpected output: {stdout}");
    assert!(stdout.contains("pipelines: 1"), "unexpected output: {stdout}");
}

#[test]
fn test_check_rejects_repeated_declaration() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("release.yaml"),
        "catalog:\n  resources:\n    tasks:\n      - name: lint\n        version: 1.0.0\n      - name: lint\n        version: 1.0.0\n",
    )
    .unwrap();

    let output = run_catalog_cd(temp_dir.path(), &["check", "release.yaml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("and version '1.0.0' from the same source"),
        "unexpected error: {stderr}"
    );
}

#[test]
fn test_check_reports_missing_contract() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_catalog_cd(temp_dir.path(), &["check", "missing.yaml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read catalog contract"));
}

#[test]
fn test_verify_rejects_unsupported_host_before_fetching() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("externals.yaml"),
        "repositories:\n  - name: mirror\n    url: https://gitlab.com/org/repo\n    types: [tasks]\n",
    )
    .unwrap();

    let output = run_catalog_cd(
        temp_dir.path(),
        &["verify-name-conflicts", "--config", "externals.yaml"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid repository URL 'https://gitlab.com/org/repo'"),
        "unexpected error: {stderr}"
    );
}

#[test]
fn test_verify_reports_missing_config() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_catalog_cd(
        temp_dir.path(),
        &["verify-name-conflicts", "--config", "nowhere.yaml"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read externals configuration"));
}

#[test]
fn test_verify_reports_collision_and_fails() {
    let base = serve(|base| {
        release_routes(
            base,
            &[
                ("org/one", "catalog:\n  resources:\n    tasks:\n      - name: foo\n        version: 1.0.0\n"),
                ("org/two", "catalog:\n  resources:\n    tasks:\n      - name: foo\n        version: 2.0.0\n"),
            ],
        )
    });
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("externals.yaml"), TWO_REPOS).unwrap();

    let output = run_catalog_cd(
        temp_dir.path(),
        &["verify-name-conflicts", "--config", "externals.yaml", "--api-base", &base],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("have the same name 'foo' from different sources"),
        "unexpected error: {stderr}"
    );
    assert!(stderr.contains(&format!("{base}/download/org/one/v1/catalog.yaml")));
    assert!(stderr.contains(&format!("{base}/download/org/two/v1/catalog.yaml")));
}

#[test]
fn test_verify_prints_namespace_when_clean() {
    let base = serve(|base| {
        release_routes(
            base,
            &[
                ("org/one", "catalog:\n  resources:\n    tasks:\n      - name: foo\n        version: 1.1\n      - name: foo\n        version: 1.10\n"),
                ("org/two", "catalog:\n  resources:\n    tasks:\n      - name: bar\n        version: 2.0.0\n"),
            ],
        )
    });
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("externals.yaml"), TWO_REPOS).unwrap();

    let output = run_catalog_cd(
        temp_dir.path(),
        &["verify-name-conflicts", "--config", "externals.yaml", "--api-base", &base],
    );

    assert!(
        output.status.success(),
        "verify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1.1, 1.10"), "unexpected output: {stdout}");
    assert!(stdout.contains("No name conflicts across 2 sources"));
}
