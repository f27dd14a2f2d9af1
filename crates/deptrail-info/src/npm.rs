//! npm registry client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::{PackageVersions, Registry};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Abbreviated ("corgi") packument, the format npm itself installs from
const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

/// npm registry API response structure
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    name: String,
    #[serde(rename = "dist-tags", default)]
    dist_tags: DistTags,
    #[serde(default)]
    versions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DistTags {
    latest: Option<String>,
}

/// Encode package name for URL (handle scoped packages like @scope/name)
pub(crate) fn encode_package_name(package_name: &str) -> String {
    if package_name.starts_with('@') {
        package_name.replace('/', "%2F")
    } else {
        package_name.to_string()
    }
}

/// Fetch published versions from the npm registry
pub async fn fetch_npm_versions(
    client: &HttpClient,
    base_url: &str,
    package_name: &str,
) -> Result<PackageVersions> {
    if package_name.is_empty() {
        return Err(Error::InvalidPackageName(
            "Package name cannot be empty".to_string(),
        ));
    }

    let url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        encode_package_name(package_name)
    );

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ABBREVIATED_METADATA));

    let response: NpmPackageResponse = client
        .get_json_with_headers(&url, headers)
        .await
        .map_err(|e| e.not_found_as(package_name, "npm"))?;

    Ok(into_package_versions(response))
}

fn into_package_versions(response: NpmPackageResponse) -> PackageVersions {
    PackageVersions {
        registry: Registry::Npm,
        name: response.name,
        versions: response.versions.into_keys().collect(),
        latest: response.dist_tags.latest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_response_parsing() {
        let response: NpmPackageResponse = serde_json::from_str(
            r#"{
                "name": "lodash",
                "dist-tags": { "latest": "4.17.21", "next": "5.0.0-beta.1" },
                "versions": {
                    "4.17.20": { "name": "lodash" },
                    "4.17.21": { "name": "lodash" },
                    "5.0.0-beta.1": { "name": "lodash" }
                }
            }"#,
        )
        .unwrap();

        let info = into_package_versions(response);
        assert_eq!(info.registry, Registry::Npm);
        assert_eq!(info.latest.as_deref(), Some("4.17.21"));
        assert_eq!(info.versions.len(), 3);
    }

    #[test]
    fn test_missing_dist_tags() {
        let response: NpmPackageResponse =
            serde_json::from_str(r#"{ "name": "empty", "versions": {} }"#).unwrap();
        let info = into_package_versions(response);
        assert!(info.latest.is_none());
        assert!(info.versions.is_empty());
    }

    #[test]
    fn test_scoped_name_encoding() {
        assert_eq!(encode_package_name("@types/node"), "@types%2Fnode");
        assert_eq!(encode_package_name("react"), "react");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_npm_versions() {
        let client = HttpClient::new(Duration::from_secs(30)).unwrap();
        let info = fetch_npm_versions(&client, "https://registry.npmjs.org", "react")
            .await
            .unwrap();

        assert_eq!(info.name, "react");
        assert!(info.latest.is_some());
        assert!(!info.versions.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_package_name() {
        let client = HttpClient::new(Duration::from_secs(30)).unwrap();
        let result = fetch_npm_versions(&client, "https://registry.npmjs.org", "").await;
        assert!(matches!(result, Err(Error::InvalidPackageName(_))));
    }
}
