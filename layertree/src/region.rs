//! Region availability filtering.
//!
//! A source may restrict itself to a set of region keys through
//! `availableInRegions`:
//!
//! - `["a"]` loads only for region `a`
//! - `["a", "b"]` loads for `a` and `b`
//! - `["b", "main"]` loads for `b` and for the main region
//! - absent or empty loads everywhere

use crate::config::SourceEntry;

/// Returns true if a source with the given region list is available for
/// `region_key`.
///
/// An absent region key only matches unrestricted sources.
pub fn is_available_in(regions: Option<&[String]>, region_key: Option<&str>) -> bool {
    match regions {
        None => true,
        Some([]) => true,
        Some(list) => region_key.is_some_and(|key| list.iter().any(|r| r == key)),
    }
}

/// Keeps the entries available for `region_key`, preserving order.
pub fn filter_by_region(entries: Vec<SourceEntry>, region_key: Option<&str>) -> Vec<SourceEntry> {
    entries
        .into_iter()
        .filter(|entry| is_available_in(entry.available_in_regions(), region_key))
        .collect()
}
