// src/filter.rs
//
// Filter parameters for detailed bucket listings.

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::TryStreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::FilterError;
use crate::paging::EntryStream;
use crate::types::ObjectEntry;

const CONTAINS: &str = "contains";
const OWNER: &str = "owner";
const NEWER_THAN: &str = "newerthan";
const OLDER_THAN: &str = "olderthan";
const LARGER_THAN: &str = "largerthan";
const SMALLER_THAN: &str = "smallerthan";

static DURATION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([dhms])([0-9]+)$").expect("duration segment pattern compiles"));

/// Parsed `--filter-params`. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    pub contains: Option<String>,
    pub owner: Option<String>,
    pub newer_than: Option<TimeDelta>,
    pub older_than: Option<TimeDelta>,
    pub larger_than: Option<u64>,
    pub smaller_than: Option<u64>,
}

impl FilterParams {
    /// Parse `key:value` pairs separated by commas, e.g.
    /// `contains:logs,newerthan:d1.h12,largerthan:1024`.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut params = FilterParams::default();
        let mut seen = HashSet::new();

        for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            // Exactly one separator and a non-empty value.
            let (key, value) = match pair.split(':').collect::<Vec<_>>()[..] {
                [key, value] if !value.trim().is_empty() => (key, value.trim()),
                _ => return Err(FilterError::Malformed(pair.to_string())),
            };
            let key = key.trim().to_ascii_lowercase();

            match key.as_str() {
                CONTAINS => params.contains = Some(value.to_string()),
                OWNER => params.owner = Some(value.to_string()),
                NEWER_THAN => params.newer_than = Some(parse_duration(value)),
                OLDER_THAN => params.older_than = Some(parse_duration(value)),
                LARGER_THAN => params.larger_than = Some(parse_size(&key, value)?),
                SMALLER_THAN => params.smaller_than = Some(parse_size(&key, value)?),
                _ => return Err(FilterError::UnknownParameter(key)),
            }

            if !seen.insert(key.clone()) {
                return Err(FilterError::DuplicateParameter(key));
            }
        }

        Ok(params)
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterParams::default()
    }

    /// True when `entry` satisfies every configured constraint, judged
    /// against the instant `now`.
    pub fn matches(&self, entry: &ObjectEntry, now: DateTime<Utc>) -> bool {
        self.size_matches(entry)
            && self.date_matches(entry, now)
            && self.name_matches(entry)
            && self.owner_matches(entry)
    }

    fn size_matches(&self, entry: &ObjectEntry) -> bool {
        if self.larger_than.is_none() && self.smaller_than.is_none() {
            return true;
        }
        let larger = self.larger_than.unwrap_or(0);
        let smaller = self.smaller_than.unwrap_or(u64::MAX);
        entry.size > larger && entry.size < smaller
    }

    fn date_matches(&self, entry: &ObjectEntry, now: DateTime<Utc>) -> bool {
        if self.newer_than.is_none() && self.older_than.is_none() {
            return true;
        }
        let Some(modified) = entry.last_modified else {
            return false;
        };
        // An offset reaching past the representable range leaves no lower
        // bound, and nothing is older than it.
        let newer = self.newer_than.is_none_or(|d| {
            now.checked_sub_signed(d).is_none_or(|after| modified > after)
        });
        let older = self.older_than.is_none_or(|d| {
            now.checked_sub_signed(d).is_some_and(|before| modified < before)
        });
        newer && older
    }

    fn name_matches(&self, entry: &ObjectEntry) -> bool {
        self.contains.as_deref().is_none_or(|s| entry.key.contains(s))
    }

    fn owner_matches(&self, entry: &ObjectEntry) -> bool {
        self.owner
            .as_deref()
            .is_none_or(|o| entry.owner.as_deref() == Some(o))
    }
}

/// Parse a `d<N>.h<N>.m<N>.s<N>` offset. Units may appear in any order;
/// segments that do not fit the pattern are skipped.
pub fn parse_duration(value: &str) -> TimeDelta {
    let seconds: i64 = value
        .split('.')
        .filter_map(|seg| DURATION_SEGMENT.captures(seg.trim()))
        .filter_map(|caps| {
            let n: i64 = caps[2].parse().ok()?;
            let unit = match &caps[1] {
                "d" => 86_400,
                "h" => 3_600,
                "m" => 60,
                _ => 1,
            };
            n.checked_mul(unit)
        })
        .fold(0i64, i64::saturating_add);

    TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX)
}

fn parse_size(key: &str, value: &str) -> Result<u64, FilterError> {
    value.parse().map_err(|_| FilterError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Lazily drop entries of `stream` that fail `params`. Errors pass through.
pub fn apply(stream: EntryStream, params: FilterParams) -> EntryStream {
    if params.is_empty() {
        return stream;
    }
    let now = Utc::now();
    Box::pin(stream.try_filter(move |entry| futures::future::ready(params.matches(entry, now))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use futures::stream;

    fn entry(key: &str, size: u64, age: TimeDelta, now: DateTime<Utc>) -> ObjectEntry {
        ObjectEntry {
            last_modified: Some(now - age),
            owner: Some("alice".into()),
            ..ObjectEntry::new(key, size)
        }
    }

    #[test]
    fn test_parse_all_keys() {
        let p = FilterParams::parse(
            "contains:logs, owner:alice,newerthan:d1.h2,olderthan:m30,largerthan:10,smallerthan:500",
        )
        .unwrap();
        assert_eq!(p.contains.as_deref(), Some("logs"));
        assert_eq!(p.owner.as_deref(), Some("alice"));
        assert_eq!(p.newer_than, Some(TimeDelta::seconds(86_400 + 7_200)));
        assert_eq!(p.older_than, Some(TimeDelta::minutes(30)));
        assert_eq!(p.larger_than, Some(10));
        assert_eq!(p.smaller_than, Some(500));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        assert_eq!(
            FilterParams::parse("colour:red"),
            Err(FilterError::UnknownParameter("colour".into()))
        );
        assert_eq!(
            FilterParams::parse("contains:x,bogus:1").unwrap_err().to_string(),
            "Unknown filter parameter: bogus"
        );
    }

    #[test]
    fn test_parse_rejects_malformed_and_bad_sizes() {
        assert!(matches!(FilterParams::parse("owner"), Err(FilterError::Malformed(_))));
        assert!(matches!(
            FilterParams::parse("largerthan:big"),
            Err(FilterError::InvalidValue { .. })
        ));
        assert!(FilterParams::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_empty_values() {
        for input in ["owner:", "newerthan:", "contains:  ", "largerthan:,owner:bob"] {
            assert!(
                matches!(FilterParams::parse(input), Err(FilterError::Malformed(_))),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_extra_separators() {
        assert_eq!(
            FilterParams::parse("contains:a:b"),
            Err(FilterError::Malformed("contains:a:b".into()))
        );
        assert!(matches!(FilterParams::parse("newerthan:d1:h2"), Err(FilterError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_repeated_keys() {
        assert_eq!(
            FilterParams::parse("owner:a,owner:b"),
            Err(FilterError::DuplicateParameter("owner".into()))
        );
        assert_eq!(
            FilterParams::parse("newerthan:d1,NewerThan:h2").unwrap_err().to_string(),
            "Filter parameter newerthan given more than once"
        );
    }

    #[test]
    fn test_duration_segments_in_any_order() {
        assert_eq!(parse_duration("s5.d1"), TimeDelta::seconds(86_405));
        assert_eq!(parse_duration("h1.junk.m1"), TimeDelta::seconds(3_660));
        assert_eq!(parse_duration("nothing"), TimeDelta::zero());
    }

    #[test]
    fn test_size_bounds_are_strict() {
        let now = Utc::now();
        let p = FilterParams::parse("largerthan:10,smallerthan:20").unwrap();
        assert!(!p.matches(&entry("a", 10, TimeDelta::zero(), now), now));
        assert!(p.matches(&entry("a", 15, TimeDelta::zero(), now), now));
        assert!(!p.matches(&entry("a", 20, TimeDelta::zero(), now), now));

        let only_smaller = FilterParams::parse("smallerthan:5").unwrap();
        assert!(!only_smaller.matches(&entry("a", 0, TimeDelta::zero(), now), now));
        assert!(only_smaller.matches(&entry("a", 1, TimeDelta::zero(), now), now));
    }

    #[test]
    fn test_date_window() {
        let now = Utc::now();
        let p = FilterParams::parse("newerthan:d2,olderthan:h1").unwrap();
        assert!(p.matches(&entry("a", 1, TimeDelta::days(1), now), now));
        assert!(!p.matches(&entry("a", 1, TimeDelta::days(3), now), now));
        assert!(!p.matches(&entry("a", 1, TimeDelta::minutes(5), now), now));

        let undated = ObjectEntry::new("a", 1);
        assert!(!p.matches(&undated, now));
        assert!(FilterParams::default().matches(&undated, now));
    }

    #[test]
    fn test_name_and_owner() {
        let now = Utc::now();
        let p = FilterParams::parse("contains:log,owner:alice").unwrap();
        assert!(p.matches(&entry("app.log", 1, TimeDelta::zero(), now), now));
        assert!(!p.matches(&entry("app.txt", 1, TimeDelta::zero(), now), now));

        let mut other = entry("app.log", 1, TimeDelta::zero(), now);
        other.owner = Some("bob".into());
        assert!(!p.matches(&other, now));
    }

    #[tokio::test]
    async fn test_apply_filters_lazily_and_keeps_errors() {
        let items: Vec<Result<ObjectEntry, ClientError>> = vec![
            Ok(ObjectEntry::new("small", 1)),
            Ok(ObjectEntry::new("big", 100)),
            Err(ClientError::not_found("bucket")),
        ];
        let params = FilterParams::parse("largerthan:50").unwrap();
        let mut filtered = apply(Box::pin(stream::iter(items)), params);

        assert_eq!(filtered.try_next().await.unwrap().unwrap().key, "big");
        assert!(filtered.try_next().await.is_err());
    }
}
