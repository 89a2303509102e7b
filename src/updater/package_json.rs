use log::*;
use serde_json::{Value, json};
use std::fs;

use crate::{
    result::Result,
    updater::{UpdateContext, Updater},
};

const PACKAGE_JSON: &str = "package.json";

/// Sets the top-level `version` of the root `package.json`.
pub struct PackageJson;

impl Updater for PackageJson {
    fn name(&self) -> &'static str {
        PACKAGE_JSON
    }

    fn update(&self, ctx: &UpdateContext<'_>) -> Result<bool> {
        let path = ctx.root.join(PACKAGE_JSON);
        if !path.exists() {
            return Ok(false);
        }

        let content = fs::read_to_string(&path)?;
        let mut doc: Value = serde_json::from_str(&content)?;

        if !doc.is_object() {
            warn!("{PACKAGE_JSON} is not a JSON object: skipping");
            return Ok(false);
        }

        doc["version"] = json!(ctx.version.semver.to_string());

        let mut updated = serde_json::to_string_pretty(&doc)?;
        updated.push('\n');

        if updated == content {
            return Ok(false);
        }

        fs::write(&path, updated)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::test_helpers::version;
    use tempfile::TempDir;

    #[test]
    fn test_updates_version_keeping_key_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PACKAGE_JSON),
            "{\n  \"name\": \"demo\",\n  \"version\": \"1.2.0\",\n  \"private\": true\n}\n",
        )
        .unwrap();
        let version = version("1.3.0");

        let changed = PackageJson
            .update(&UpdateContext {
                root: dir.path(),
                version: &version,
                changelog_entry: "",
            })
            .unwrap();

        assert!(changed);
        assert_eq!(
            fs::read_to_string(dir.path().join(PACKAGE_JSON)).unwrap(),
            "{\n  \"name\": \"demo\",\n  \"version\": \"1.3.0\",\n  \"private\": true\n}\n"
        );
    }

    #[test]
    fn test_adds_missing_version() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PACKAGE_JSON), "{\"name\": \"demo\"}").unwrap();
        let version = version("0.1.0");

        PackageJson
            .update(&UpdateContext {
                root: dir.path(),
                version: &version,
                changelog_entry: "",
            })
            .unwrap();

        let doc: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(PACKAGE_JSON)).unwrap(),
        )
        .unwrap();
        assert_eq!(doc["version"], "0.1.0");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PACKAGE_JSON), "{ nope").unwrap();
        let version = version("0.1.0");

        let result = PackageJson.update(&UpdateContext {
            root: dir.path(),
            version: &version,
            changelog_entry: "",
        });

        assert!(result.is_err());
    }
}
