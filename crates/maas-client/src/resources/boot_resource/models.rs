//! Boot resource snapshot types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MaasError, Result};
use crate::resources::null_as_default;

/// Prefix MAAS puts in front of upload URIs; the client adds its own.
const UPLOAD_URI_PREFIX: &str = "/MAAS/api/2.0";

/// One file of a boot resource set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootResourceFile {
    #[serde(deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sha256: String,
    pub size: u64,
    pub complete: bool,
    pub progress: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub upload_uri: String,
}

/// A versioned set of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootResourceSet {
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    pub size: u64,
    pub complete: bool,
    pub progress: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub files: BTreeMap<String, BootResourceFile>,
}

impl BootResourceSet {
    /// Upload URI of the set's only file, relative to the API root.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] unless the set has exactly one
    /// file.
    pub fn upload_uri(&self) -> Result<String> {
        let mut files = self.files.values();
        match (files.next(), files.next()) {
            (Some(file), None) => Ok(file
                .upload_uri
                .strip_prefix(UPLOAD_URI_PREFIX)
                .unwrap_or(&file.upload_uri)
                .to_string()),
            (None, _) => Err(MaasError::InvalidState(
                "boot resource set has no files".to_string(),
            )),
            (Some(_), Some(_)) => Err(MaasError::InvalidState(format!(
                "boot resource set has {} files, expected one",
                self.files.len()
            ))),
        }
    }
}

/// Point-in-time view of a boot resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootResource {
    pub id: i64,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub resource_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub architecture: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subarches: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sets: BTreeMap<String, BootResourceSet>,
}

impl BootResource {
    /// The set an upload targets: the one whose key sorts first.
    ///
    /// Set keys are timestamps, so this is the oldest set rather than the
    /// newest. A freshly created resource only has one.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] when the resource has no sets.
    pub fn latest_set(&self) -> Result<&BootResourceSet> {
        self.sets.values().next().ok_or_else(|| {
            MaasError::InvalidState(format!("boot resource {} has no sets", self.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(files: &[(&str, &str)]) -> BootResourceSet {
        BootResourceSet {
            files: files
                .iter()
                .map(|(name, uri)| {
                    (
                        (*name).to_string(),
                        BootResourceFile {
                            filename: (*name).to_string(),
                            upload_uri: (*uri).to_string(),
                            ..BootResourceFile::default()
                        },
                    )
                })
                .collect(),
            ..BootResourceSet::default()
        }
    }

    #[test]
    fn test_boot_resource_deserialization() {
        let json = r#"{
            "id": 7,
            "type": "Uploaded",
            "name": "custom/u-1804",
            "architecture": "amd64/generic",
            "subarches": "generic",
            "title": "",
            "sets": {
                "20210524": {
                    "version": "20210524", "label": "uploaded", "size": 1024,
                    "complete": false, "progress": 0,
                    "files": {
                        "root-tgz": {
                            "filename": "root-tgz", "filetype": "root-tgz",
                            "sha256": "abc", "size": 1024, "complete": false,
                            "upload_uri": "/MAAS/api/2.0/boot-resources/7/upload/9/"
                        }
                    }
                }
            }
        }"#;

        let resource: BootResource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.id, 7);
        assert_eq!(resource.resource_type, "Uploaded");
        let set = resource.latest_set().unwrap();
        assert_eq!(set.version, "20210524");
        assert_eq!(set.upload_uri().unwrap(), "/boot-resources/7/upload/9/");
    }

    #[test]
    fn test_latest_set_picks_smallest_key() {
        let mut resource = BootResource::default();
        resource
            .sets
            .insert("20240101-0".to_string(), set_with(&[("a", "/new/")]));
        resource
            .sets
            .insert("20231231-0".to_string(), set_with(&[("a", "/old/")]));

        let set = resource.latest_set().unwrap();
        assert_eq!(set.upload_uri().unwrap(), "/old/");
    }

    #[test]
    fn test_latest_set_without_sets_fails() {
        let resource = BootResource::default();
        assert!(matches!(
            resource.latest_set(),
            Err(MaasError::InvalidState(_))
        ));
    }

    #[test]
    fn test_upload_uri_requires_exactly_one_file() {
        let multiple = set_with(&[("a", "/a/"), ("b", "/b/")]);
        assert!(multiple.upload_uri().is_err());
        assert!(set_with(&[]).upload_uri().is_err());
    }

    #[test]
    fn test_upload_uri_without_prefix_is_kept() {
        let set = set_with(&[("a", "/boot-resources/1/upload/1/")]);
        assert_eq!(set.upload_uri().unwrap(), "/boot-resources/1/upload/1/");
    }
}
