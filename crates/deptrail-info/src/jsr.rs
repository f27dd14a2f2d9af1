//! JSR (JavaScript Registry) client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::{PackageVersions, Registry};
use serde::Deserialize;
use std::collections::BTreeMap;

/// JSR package metadata response (`meta.json`)
#[derive(Debug, Deserialize)]
struct JsrPackageMetadata {
    scope: String,
    name: String,
    latest: Option<String>,
    #[serde(default)]
    versions: BTreeMap<String, JsrVersionMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct JsrVersionMeta {
    #[serde(default)]
    yanked: bool,
}

/// Split "@scope/package" into its parts
fn split_package_name(package_name: &str) -> Result<(&str, &str)> {
    let invalid = || {
        Error::InvalidPackageName(format!(
            "JSR package name must be in format @scope/package, got: {}",
            package_name
        ))
    };

    let rest = package_name.strip_prefix('@').ok_or_else(invalid)?;
    match rest.split_once('/') {
        Some((scope, name)) if !scope.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((scope, name))
        }
        _ => Err(invalid()),
    }
}

/// Fetch published versions from JSR
///
/// Package name should be in the format "@scope/package" (e.g., "@std/path")
pub async fn fetch_jsr_versions(
    client: &HttpClient,
    base_url: &str,
    package_name: &str,
) -> Result<PackageVersions> {
    let (scope, name) = split_package_name(package_name)?;
    let url = format!(
        "{}/@{}/{}/meta.json",
        base_url.trim_end_matches('/'),
        scope,
        name
    );

    let response: JsrPackageMetadata = client
        .get_json(&url)
        .await
        .map_err(|e| e.not_found_as(package_name, "jsr"))?;

    Ok(into_package_versions(response))
}

fn into_package_versions(response: JsrPackageMetadata) -> PackageVersions {
    PackageVersions {
        registry: Registry::Jsr,
        name: format!("@{}/{}", response.scope, response.name),
        versions: response
            .versions
            .into_iter()
            .filter(|(_, meta)| !meta.yanked)
            .map(|(version, _)| version)
            .collect(),
        latest: response.latest,
    }
}
