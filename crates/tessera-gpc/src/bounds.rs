use serde::{Deserialize, Serialize};

use tessera_core::{POD_INT_MAX, POD_INT_MIN};

use crate::config::RangeSpec;
use crate::error::GpcError;

/// Canonical numeric bounds for one entry: the value must lie in `in_range`
/// and, when present, outside `not_in_range`.
///
/// `not_in_range` survives canonicalization only when it lies strictly
/// inside `in_range`; every other overlap is folded into `in_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBounds {
    pub in_range: RangeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in_range: Option<RangeSpec>,
}

impl CanonicalBounds {
    pub fn contains(&self, value: i64) -> bool {
        let allowed = self.in_range.min <= value && value <= self.in_range.max;
        let excluded = self
            .not_in_range
            .map_or(false, |r| r.min <= value && value <= r.max);
        allowed && !excluded
    }

    pub fn describe(&self) -> String {
        match self.not_in_range {
            Some(r) => format!(
                "[{}, {}] excluding [{}, {}]",
                self.in_range.min, self.in_range.max, r.min, r.max
            ),
            None => format!("[{}, {}]", self.in_range.min, self.in_range.max),
        }
    }
}

fn check_interval(range: &RangeSpec, what: &str, entry: &str) -> Result<(), GpcError> {
    if range.min > range.max {
        return Err(GpcError::RangeError(format!(
            "{} for {} has min {} greater than max {}",
            what, entry, range.min, range.max
        )));
    }
    Ok(())
}

/// Fold an entry's `inRange` and `notInRange` into canonical form.
///
/// A `notInRange` that covers the whole allowed interval is a contradiction.
/// One that touches either end trims that end. A `notInRange` with no
/// `inRange` is applied to the full int range.
pub fn canonicalize_bounds(
    in_range: Option<RangeSpec>,
    not_in_range: Option<RangeSpec>,
    entry: &str,
) -> Result<Option<CanonicalBounds>, GpcError> {
    if let Some(r) = &in_range {
        check_interval(r, "inRange", entry)?;
    }
    if let Some(r) = &not_in_range {
        check_interval(r, "notInRange", entry)?;
    }

    let Some(excluded) = not_in_range else {
        return Ok(in_range.map(|in_range| CanonicalBounds {
            in_range,
            not_in_range: None,
        }));
    };
    let mut allowed = in_range.unwrap_or(RangeSpec::new(POD_INT_MIN, POD_INT_MAX));

    if excluded.max < allowed.min || excluded.min > allowed.max {
        return Ok(Some(CanonicalBounds {
            in_range: allowed,
            not_in_range: None,
        }));
    }

    let covers_low = excluded.min <= allowed.min;
    let covers_high = excluded.max >= allowed.max;
    match (covers_low, covers_high) {
        (true, true) => Err(GpcError::InvalidConfig(format!(
            "notInRange [{}, {}] for {} excludes every value of inRange [{}, {}]",
            excluded.min, excluded.max, entry, allowed.min, allowed.max
        ))),
        (true, false) => {
            allowed.min = excluded.max + 1;
            Ok(Some(CanonicalBounds {
                in_range: allowed,
                not_in_range: None,
            }))
        }
        (false, true) => {
            allowed.max = excluded.min - 1;
            Ok(Some(CanonicalBounds {
                in_range: allowed,
                not_in_range: None,
            }))
        }
        (false, false) => Ok(Some(CanonicalBounds {
            in_range: allowed,
            not_in_range: Some(excluded),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ErrorKind;

    fn r(min: i64, max: i64) -> Option<RangeSpec> {
        Some(RangeSpec::new(min, max))
    }

    #[test]
    fn test_no_bounds() {
        assert_eq!(canonicalize_bounds(None, None, "a.x").unwrap(), None);
    }

    #[test]
    fn test_in_range_only() {
        let b = canonicalize_bounds(r(0, 10), None, "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(0, 10));
        assert!(b.contains(0) && b.contains(10) && !b.contains(11));
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let err = canonicalize_bounds(r(5, 4), None, "a.x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(canonicalize_bounds(r(0, 10), r(3, 2), "a.x").is_err());
    }

    #[test]
    fn test_full_cover_is_contradiction() {
        let err = canonicalize_bounds(r(0, 10), r(0, 10), "a.x").unwrap_err();
        assert!(matches!(err, GpcError::InvalidConfig(_)));
        assert!(canonicalize_bounds(r(0, 10), r(-5, 20), "a.x").is_err());
        assert!(canonicalize_bounds(None, r(POD_INT_MIN, POD_INT_MAX), "a.x").is_err());
    }

    #[test]
    fn test_lower_overlap_trims_min() {
        let b = canonicalize_bounds(r(0, 100), r(-10, 40), "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(41, 100));
        assert_eq!(b.not_in_range, None);
    }

    #[test]
    fn test_upper_overlap_trims_max() {
        let b = canonicalize_bounds(r(0, 100), r(40, 100), "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(0, 39));
        assert_eq!(b.not_in_range, None);
    }

    #[test]
    fn test_interior_exclusion_kept() {
        let b = canonicalize_bounds(r(0, 100), r(40, 60), "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(0, 100));
        assert_eq!(b.not_in_range, Some(RangeSpec::new(40, 60)));
        assert!(b.contains(39) && !b.contains(40) && !b.contains(60) && b.contains(61));
    }

    #[test]
    fn test_disjoint_exclusion_dropped() {
        let b = canonicalize_bounds(r(0, 10), r(20, 30), "a.x").unwrap().unwrap();
        assert_eq!(b.not_in_range, None);
        assert_eq!(b.in_range, RangeSpec::new(0, 10));
    }

    #[test]
    fn test_exclusion_without_in_range() {
        let b = canonicalize_bounds(None, r(POD_INT_MIN, -1), "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(0, POD_INT_MAX));
        let b = canonicalize_bounds(None, r(0, 0), "a.x").unwrap().unwrap();
        assert_eq!(b.in_range, RangeSpec::new(POD_INT_MIN, POD_INT_MAX));
        assert_eq!(b.not_in_range, r(0, 0));
    }
}
