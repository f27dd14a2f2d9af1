//! PyPI JSON API client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::{PackageVersions, Registry};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct PyPiResponse {
    info: PyPiInfo,
    #[serde(default)]
    releases: BTreeMap<String, Vec<PyPiFile>>,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    name: String,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PyPiFile {
    #[serde(default)]
    yanked: bool,
}

/// Fetch published versions from PyPI
///
/// Releases whose files are all yanked are dropped; `info.version` is the
/// latest stable release as reported by PyPI.
pub async fn fetch_pypi_versions(
    client: &HttpClient,
    base_url: &str,
    package_name: &str,
) -> Result<PackageVersions> {
    if package_name.is_empty() || package_name.contains('/') {
        return Err(Error::InvalidPackageName(format!(
            "Invalid PyPI project name: {:?}",
            package_name
        )));
    }

    let url = format!(
        "{}/pypi/{}/json",
        base_url.trim_end_matches('/'),
        package_name
    );

    let response: PyPiResponse = client
        .get_json(&url)
        .await
        .map_err(|e| e.not_found_as(package_name, "pypi"))?;

    Ok(into_package_versions(response))
}

fn into_package_versions(response: PyPiResponse) -> PackageVersions {
    PackageVersions {
        registry: Registry::PyPi,
        name: response.info.name,
        versions: response
            .releases
            .into_iter()
            .filter(|(_, files)| files.is_empty() || files.iter().any(|f| !f.yanked))
            .map(|(version, _)| version)
            .collect(),
        latest: response.info.version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_yanked_release_is_dropped() {
        let response: PyPiResponse = serde_json::from_str(
            r#"{
                "info": { "name": "fastapi", "version": "0.120.0" },
                "releases": {
                    "0.119.0": [{ "yanked": false }],
                    "0.119.1": [{ "yanked": true }, { "yanked": true }],
                    "0.120.0": [{ "yanked": false }, { "yanked": true }],
                    "0.121.0a1": []
                }
            }"#,
        )
        .unwrap();

        let info = into_package_versions(response);
        assert_eq!(info.name, "fastapi");
        assert_eq!(info.latest.as_deref(), Some("0.120.0"));
        assert_eq!(info.versions, vec!["0.119.0", "0.120.0", "0.121.0a1"]);
    }
}
