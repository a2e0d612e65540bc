//! Compact (ISO 8601 style) duration parsing and `m:ss` formatting.

use regex::Regex;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?").expect("valid duration pattern")
});

/// Convert a duration such as `PT1H2M3S` into whole seconds.
///
/// Missing components count as zero. Input with no recognizable duration
/// yields zero rather than an error.
pub fn parse_duration_seconds(encoded: &str) -> u64 {
    let Some(caps) = ISO_DURATION.captures(encoded) else {
        return 0;
    };

    let component = |index: usize| -> u64 {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(86_400)
        .saturating_add(component(2).saturating_mul(3_600))
        .saturating_add(component(3).saturating_mul(60))
        .saturating_add(component(4))
}

/// Render seconds as `minutes:seconds`, seconds zero-padded to two digits.
pub fn format_duration(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
