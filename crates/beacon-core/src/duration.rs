//! Duration strings: `"500ms"`, `"10s"`, `"2m"`, `"1h"`, or bare seconds.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Parse a duration string like "5s", "500ms", "1m", "1h".
///
/// A bare integer is read as seconds.
pub fn parse_duration(s: &str) -> ConfigResult<Duration> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());

    let number = |digits: &str| digits.trim().parse::<u64>().map_err(|_| invalid());

    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        Some(Duration::from_millis(number(ms)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        Some(Duration::from_secs(number(secs)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        number(mins)?.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        number(hours)?.checked_mul(3600).map(Duration::from_secs)
    } else {
        Some(Duration::from_secs(number(s)?))
    };

    parsed.ok_or_else(invalid)
}

/// Render a duration in the shortest unit that represents it exactly.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 != 0 {
        format!("{millis}ms")
    } else {
        let secs = d.as_secs();
        if secs != 0 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs != 0 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        }
    }
}
