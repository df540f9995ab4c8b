// src/types.rs
//
// Plain data exchanged between the object client, the paging walker, the
// resolver and the renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::DETAILED_LOOKUP_SUFFIX;

/// Metadata resolved for one requested object name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectRecord {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One entry of a bucket listing. Version fields are only populated by
/// version listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(rename = "ETag")]
    pub e_tag: Option<String>,
    pub owner: Option<String>,
    pub version_id: Option<String>,
    pub is_latest: bool,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            is_latest: true,
            ..Default::default()
        }
    }
}

/// Opaque continuation token of a listing. `marker` is a key to resume after;
/// version listings also carry the version id to resume after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub marker: String,
    pub version_marker: Option<String>,
}

impl PageCursor {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            version_marker: None,
        }
    }

    pub fn with_version(marker: impl Into<String>, version_marker: Option<String>) -> Self {
        Self {
            marker: marker.into(),
            version_marker,
        }
    }
}

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub include_versions: bool,
    pub cursor: Option<PageCursor>,
}

impl ListRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            include_versions: false,
            cursor: None,
        }
    }

    pub fn prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn include_versions(mut self, include_versions: bool) -> Self {
        self.include_versions = include_versions;
        self
    }

    pub fn cursor(mut self, cursor: Option<PageCursor>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// One page of a listing. `objects` holds the current versions, `versions`
/// every version; a remote may leave the list it was not asked for empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub objects: Vec<ObjectEntry>,
    pub versions: Vec<ObjectEntry>,
    /// `None` ends the listing.
    pub next: Option<PageCursor>,
}

/// Which remote lookup resolves a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupVariant {
    /// Cheap metadata lookup of the named object.
    Basic,
    /// Full-detail lookup restricted to the latest version.
    DetailedLatest,
}

impl LookupVariant {
    pub fn for_name(name: &str) -> Self {
        let suffix = DETAILED_LOOKUP_SUFFIX.as_bytes();
        let name = name.as_bytes();
        if name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
            LookupVariant::DetailedLatest
        } else {
            LookupVariant::Basic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_dispatch_is_case_insensitive() {
        assert_eq!(LookupVariant::for_name("a.json"), LookupVariant::DetailedLatest);
        assert_eq!(LookupVariant::for_name("dir/A.JSON"), LookupVariant::DetailedLatest);
        assert_eq!(LookupVariant::for_name("b.Json"), LookupVariant::DetailedLatest);
        assert_eq!(LookupVariant::for_name("b.txt"), LookupVariant::Basic);
        assert_eq!(LookupVariant::for_name("json"), LookupVariant::Basic);
        assert_eq!(LookupVariant::for_name("a.json.bak"), LookupVariant::Basic);
        assert_eq!(LookupVariant::for_name("ünï.json"), LookupVariant::DetailedLatest);
    }

    #[test]
    fn test_list_request_builder() {
        let req = ListRequest::new("bucket")
            .prefix(Some("logs/".into()))
            .include_versions(true)
            .cursor(Some(PageCursor::new("logs/a")));
        assert_eq!(req.bucket, "bucket");
        assert_eq!(req.prefix.as_deref(), Some("logs/"));
        assert!(req.include_versions);
        assert_eq!(req.cursor, Some(PageCursor::new("logs/a")));
    }
}
