//! # Query Engine
//!
//! Stateless filter and sort operations over a record sequence.
//!
//! Both entry points take the field name as it appears in the command
//! surface and return `None` ("no result") for an unsupported field or a
//! wrong number of filter values — distinct from `Some(vec![])`, the empty
//! matched set. The conversation layer renders both the same way; the
//! distinction is kept here for callers that care.

use crate::record::Record;

/// Filter field: administrative area, one value.
pub const FILTER_ADM_AREA: &str = "AdmArea";
/// Filter field: network name, one value.
pub const FILTER_WIFI_NAME: &str = "WiFiName";
/// Filter field: function flag and access flag, exactly two values.
pub const FILTER_FLAGS: &str = "FunctionFlagAndAccessFlag";
/// Sort field: ascending lexicographic by library name.
pub const SORT_LIBRARY_NAME: &str = "LibraryName";
/// Sort field: descending numeric by coverage area.
pub const SORT_COVERAGE_AREA: &str = "CoverageArea";

// =============================================================================
// FILTER
// =============================================================================

/// Select the records matching `values` on `field`, preserving input order.
///
/// Matching is case-insensitive and Unicode-aware (the dataset values are
/// Russian). Unknown field or wrong arity returns `None`.
#[must_use]
pub fn filter(records: &[Record], field: &str, values: &[&str]) -> Option<Vec<Record>> {
    match field {
        FILTER_ADM_AREA => (values.len() == 1).then(|| {
            records
                .iter()
                .filter(|r| eq_fold(r.adm_area(), values[0]))
                .cloned()
                .collect()
        }),
        FILTER_WIFI_NAME => (values.len() == 1).then(|| {
            records
                .iter()
                .filter(|r| eq_fold(r.wifi_name(), values[0]))
                .cloned()
                .collect()
        }),
        FILTER_FLAGS => (values.len() == 2).then(|| {
            records
                .iter()
                .filter(|r| eq_fold(r.function_flag(), values[0]) && eq_fold(r.access_flag(), values[1]))
                .cloned()
                .collect()
        }),
        _ => None,
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// =============================================================================
// SORT
// =============================================================================

/// Sort the records by `field`; stable for equal keys.
///
/// `LibraryName` sorts ascending lexicographic, `CoverageArea` descending
/// numeric (a total order over floats; records cannot hold NaN). Unknown
/// field returns `None`.
#[must_use]
pub fn sort(records: &[Record], field: &str) -> Option<Vec<Record>> {
    match field {
        SORT_LIBRARY_NAME => {
            let mut out = records.to_vec();
            out.sort_by(|a, b| a.library_name().cmp(b.library_name()));
            Some(out)
        }
        SORT_COVERAGE_AREA => {
            let mut out = records.to_vec();
            out.sort_by(|a, b| b.coverage_area().total_cmp(&a.coverage_area()));
            Some(out)
        }
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
