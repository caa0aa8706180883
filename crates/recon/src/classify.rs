use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::WeatherConfig;
use crate::model::{ClassifiedWeather, WeatherCategory};
use crate::sky::SkyCondition;

static SEVEN_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{7}").unwrap());
static REMOTE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(.*?)\]\s*([0-9]{7})").unwrap());

/// Run boundaries in seconds since midnight.
#[derive(Debug, Clone, Copy)]
pub struct RunWindow {
    pub start: i64,
    pub end: i64,
}

/// One classification rule: when `select` returns the code's digits, the
/// entry belongs to `category`.
struct ClassifyRule {
    category: WeatherCategory,
    select: fn(&str, i64, RunWindow) -> Option<&str>,
}

/// Evaluated top to bottom; the first rule that selects a code wins.
const RULES: &[ClassifyRule] = &[
    ClassifyRule { category: WeatherCategory::Preliminary, select: before_run },
    ClassifyRule { category: WeatherCategory::PostRun, select: after_run },
    ClassifyRule { category: WeatherCategory::Remote, select: bracketed },
    ClassifyRule { category: WeatherCategory::Local, select: first_code },
];

fn first_code(raw: &str, _t: i64, _run: RunWindow) -> Option<&str> {
    SEVEN_DIGITS.find(raw).map(|m| m.as_str())
}

fn before_run(raw: &str, t: i64, run: RunWindow) -> Option<&str> {
    (t < run.start).then(|| first_code(raw, t, run)).flatten()
}

fn after_run(raw: &str, t: i64, run: RunWindow) -> Option<&str> {
    (t > run.end).then(|| first_code(raw, t, run)).flatten()
}

/// `[BR] 0010000`: a code relayed from another site.
fn bracketed(raw: &str, _t: i64, _run: RunWindow) -> Option<&str> {
    REMOTE_CODE
        .captures(raw)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Decide the category of a single (already wrap-shifted) entry.
pub fn categorize(raw: &str, t: i64, run: RunWindow) -> Option<(WeatherCategory, &str)> {
    RULES
        .iter()
        .find_map(|rule| (rule.select)(raw, t, run).map(|code| (rule.category, code)))
}

/// Partition raw weather strings into preliminary, post-run, remote and local
/// codes. Timestamps in the configured wrap window are shifted back one day
/// before they are compared against the run.
pub fn classify_weather(
    raw: BTreeMap<i64, String>,
    run: RunWindow,
    config: &WeatherConfig,
) -> ClassifiedWeather {
    let mut out = ClassifiedWeather::default();

    for (timestamp, entry) in raw {
        let t = config.shift(timestamp);
        let entry = entry.trim();

        let Some((category, digits)) = categorize(entry, t, run) else {
            log::warn!("entry at time={t} does not contain a valid 7-digit code: {entry:?}");
            out.unrecognized += 1;
            continue;
        };

        let code = match SkyCondition::from_digits(digits) {
            Ok(code) => code,
            Err(e) => {
                log::warn!("entry at time={t} dropped: {e}");
                out.unrecognized += 1;
                continue;
            }
        };

        if category == WeatherCategory::Local && digits.len() != entry.len() {
            log::debug!("local entry at time={t} carries extra text: {entry:?}");
        }

        let target = match category {
            WeatherCategory::Preliminary => &mut out.preliminary,
            WeatherCategory::PostRun => &mut out.postrun,
            WeatherCategory::Remote => &mut out.remote,
            WeatherCategory::Local => &mut out.local,
        };
        target.insert(t, code);
    }

    log::info!(
        "weather: {} local, {} remote, {} preliminary, {} post-run, {} unrecognized",
        out.local.len(),
        out.remote.len(),
        out.preliminary.len(),
        out.postrun.len(),
        out.unrecognized
    );

    out
}
