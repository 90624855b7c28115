//! Human-readable relative timestamps ("about 2 hours ago").

use chrono::{DateTime, Utc};

const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Distance between `then` and `now` in words, suffixed with "ago" (or
/// prefixed with "in" for timestamps in the future).
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    let words = distance_in_words(seconds.abs());
    if seconds < 0 {
        format!("in {words}")
    } else {
        format!("{words} ago")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn rounded_div(value: i64, by: i64) -> i64 {
    (value + by / 2) / by
}

fn distance_in_words(seconds: i64) -> String {
    let minutes = rounded_div(seconds, 60);

    match minutes {
        0 => "less than a minute".to_string(),
        m if m < 45 => plural(m, "minute"),
        m if m < 90 => "about 1 hour".to_string(),
        m if m < MINUTES_IN_DAY => format!("about {}", plural(rounded_div(m, 60), "hour")),
        m if m < 2_520 => "1 day".to_string(),
        m if m < MINUTES_IN_MONTH => plural(rounded_div(m, MINUTES_IN_DAY), "day"),
        m if m < MINUTES_IN_TWO_MONTHS => {
            format!("about {}", plural(rounded_div(m, MINUTES_IN_MONTH), "month"))
        }
        m => {
            let months = m / MINUTES_IN_MONTH;
            if months < 12 {
                return plural(rounded_div(m, MINUTES_IN_MONTH), "month");
            }
            let years = months / 12;
            match months % 12 {
                r if r < 3 => format!("about {}", plural(years, "year")),
                r if r < 9 => format!("over {}", plural(years, "year")),
                _ => format!("almost {}", plural(years + 1, "year")),
            }
        }
    }
}
