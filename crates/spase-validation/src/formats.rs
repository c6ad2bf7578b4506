//! Custom format checkers

use std::sync::LazyLock;

use regex::Regex;

static DURATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:[.,]\d+)?S)?)?$",
    )
    .ok()
});

/// ISO 8601 duration such as `PT1M`, `P1DT12H` or `PT0.5S`.
///
/// At least one component is required, and a `T` must be followed by a
/// time component.
pub fn is_iso8601_duration(value: &str) -> bool {
    let Some(pattern) = DURATION.as_ref() else {
        return false;
    };
    pattern.is_match(value) && value != "P" && !value.ends_with('T')
}
