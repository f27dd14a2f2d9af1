//! rubygems.org client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::{PackageVersions, Registry};
use serde::Deserialize;

/// One entry of `/api/v1/versions/{name}.json`
#[derive(Debug, Deserialize)]
struct GemVersion {
    number: String,
    #[serde(default)]
    prerelease: bool,
}

/// Fetch published versions from rubygems.org
///
/// The API lists one entry per platform build, newest first; platform
/// duplicates are collapsed and the first stable entry becomes `latest`.
pub async fn fetch_rubygems_versions(
    client: &HttpClient,
    base_url: &str,
    gem_name: &str,
) -> Result<PackageVersions> {
    if gem_name.is_empty() || gem_name.contains('/') {
        return Err(Error::InvalidPackageName(format!(
            "Invalid gem name: {:?}",
            gem_name
        )));
    }

    let url = format!(
        "{}/api/v1/versions/{}.json",
        base_url.trim_end_matches('/'),
        gem_name
    );

    let response: Vec<GemVersion> = client
        .get_json(&url)
        .await
        .map_err(|e| e.not_found_as(gem_name, "rubygems"))?;

    Ok(into_package_versions(gem_name, response))
}

fn into_package_versions(gem_name: &str, response: Vec<GemVersion>) -> PackageVersions {
    let latest = response
        .iter()
        .find(|v| !v.prerelease)
        .map(|v| v.number.clone());

    let mut versions: Vec<String> = Vec::with_capacity(response.len());
    for entry in response {
        if !versions.contains(&entry.number) {
            versions.push(entry.number);
        }
    }

    PackageVersions {
        registry: Registry::RubyGems,
        name: gem_name.to_string(),
        versions,
        latest,
    }
}
