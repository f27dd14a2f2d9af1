//! Integration tests for deptrail-info
//!
//! Tests that hit the real registries require network access and are ignored
//! by default. Run with: cargo test --package deptrail-info -- --ignored

use deptrail_config::DeptrailConfig;
use deptrail_info::{caching_client_from_config, InfoClient, Registry, RegistryClient};
use tempfile::TempDir;

#[tokio::test]
#[ignore]
async fn test_fetch_npm_package() {
    let client = InfoClient::new().unwrap();
    let info = client.fetch_npm("react").await.unwrap();

    assert_eq!(info.registry, Registry::Npm);
    assert_eq!(info.name, "react");
    assert!(info.versions.iter().any(|v| v == "18.2.0"));
}

#[tokio::test]
#[ignore]
async fn test_fetch_jsr_package() {
    let client = InfoClient::new().unwrap();
    let info = client.fetch_jsr("@std/path").await.unwrap();
    assert_eq!(info.registry, Registry::Jsr);
    assert!(info.latest.is_some());
}

#[tokio::test]
#[ignore]
async fn test_fetch_rubygems_package() {
    let client = InfoClient::new().unwrap();
    let info = client.fetch_rubygems("rails").await.unwrap();
    assert!(info.versions.iter().any(|v| v == "7.1.0"));
}

#[tokio::test]
#[ignore]
async fn test_fetch_pypi_package() {
    let client = InfoClient::new().unwrap();
    let info = client.fetch_pypi("fastapi").await.unwrap();
    assert!(info.versions.iter().any(|v| v == "0.119.0"));
}

#[tokio::test]
#[ignore]
async fn test_unknown_package_is_unavailable() {
    let client = InfoClient::new().unwrap();
    let result = client
        .fetch(Registry::Npm, "this-package-should-not-exist-deptrail-xyz", true)
        .await;
    assert!(result.is_none());
}

#[tokio::test]
async fn test_invalid_name_is_unavailable_not_an_error() {
    let client = InfoClient::new().unwrap();
    assert!(client.fetch(Registry::Jsr, "not-scoped", true).await.is_none());
}

#[tokio::test]
async fn test_caching_client_creates_cache_dir() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = DeptrailConfig::default();
    config.cache.dir = Some(temp_dir.path().join("registry-cache"));

    let client = caching_client_from_config(&config).unwrap();
    assert!(temp_dir.path().join("registry-cache").is_dir());
    assert_eq!(client.cache().ttl(), config.cache.ttl());
}
