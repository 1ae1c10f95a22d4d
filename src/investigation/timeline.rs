//! Timeline reconstruction from location and witness claims.
//!
//! Events are keyed by (time key, location). Two characters independently
//! placing something at the same key confirm it; two events at the same time
//! but different locations dispute each other.

use std::cmp::Ordering;

use super::rules;
use super::types::{ClaimType, TimelineEvent, TrackedStatement};

/// Normalised key for a time token.
///
/// Clock times become `HH:MM` on a 24-hour clock. A bare clock time with no
/// am/pm is read as evening, since testimony is about the night of the crime.
/// Anything else (e.g. `"that night"`) is its own key.
pub fn time_key(token: &str) -> String {
    match minutes_of(token) {
        Some(m) => format!("{:02}:{:02}", m / 60, m % 60),
        None => token.trim().to_lowercase(),
    }
}

fn word_hour(word: &str) -> Option<u32> {
    const WORDS: [&str; 12] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
        "twelve",
    ];
    WORDS.iter().position(|w| *w == word).map(|i| i as u32 + 1)
}

/// Minutes since midnight, when the token is a clock time.
fn minutes_of(token: &str) -> Option<u32> {
    let t = token.trim().to_lowercase();
    if t == "midnight" {
        return Some(0);
    }

    let (body, meridiem) = if let Some(stem) = t.strip_suffix("am") {
        (stem.trim(), Some(false))
    } else if let Some(stem) = t.strip_suffix("pm") {
        (stem.trim(), Some(true))
    } else {
        (t.as_str(), None)
    };

    let (hour, minute) = if let Some(word) = body.strip_suffix("o'clock").or_else(|| body.strip_suffix("oclock")) {
        (word_hour(word.trim())?, 0)
    } else if let Some((h, m)) = body.split_once(':') {
        (h.trim().parse::<u32>().ok()?, m.trim().parse::<u32>().ok()?)
    } else {
        (body.parse::<u32>().ok()?, 0)
    };
    if hour > 23 || minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(true) if hour < 12 => hour + 12,
        Some(false) if hour == 12 => 0,
        None if (1..12).contains(&hour) => hour + 12,
        _ => hour,
    };
    Some(hour * 60 + minute)
}

/// Chronological order for the night: evening first, small hours after midnight.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    fn rank(key: &str) -> (u8, u32) {
        match minutes_of(key) {
            // before 6am belongs to the end of the night
            Some(m) if m < 6 * 60 => (0, m + 24 * 60),
            Some(m) => (0, m),
            None => (1, 0),
        }
    }
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Rebuild the timeline from every statement, in chronological order.
pub fn build_timeline(statements: &[TrackedStatement]) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = Vec::new();

    for stmt in statements {
        for claim in &stmt.claims {
            if claim.negated {
                continue;
            }
            let time = claim
                .timestamp
                .clone()
                .or_else(|| rules::primary_time(&stmt.entities.times));
            let Some(time) = time else { continue };

            let (location, description) = match claim.claim_type {
                ClaimType::Location => {
                    let Some(place) = claim.object.clone() else { continue };
                    let text = format!("{} was in the {}", stmt.character_name, place);
                    (place, text)
                }
                ClaimType::Witness => {
                    let Some(place) = stmt.entities.places.iter().next().cloned() else {
                        continue;
                    };
                    let verb = if claim.predicate == "heard" { "heard" } else { "saw" };
                    let what = claim.object.as_deref().unwrap_or("something");
                    (place, format!("{} {} {}", stmt.character_name, verb, what))
                }
                _ => continue,
            };

            let key = time_key(&time);
            match events.iter_mut().find(|e| e.time == key && e.location == location) {
                Some(event) => {
                    if !event.sources.contains(&stmt.character_id) {
                        event.sources.push(stmt.character_id.clone());
                    }
                    if !event.statement_ids.contains(&stmt.id) {
                        event.statement_ids.push(stmt.id.clone());
                    }
                }
                None => events.push(TimelineEvent {
                    time: key,
                    location,
                    description,
                    sources: vec![stmt.character_id.clone()],
                    statement_ids: vec![stmt.id.clone()],
                    confirmed: false,
                    disputed: false,
                }),
            }
        }
    }

    let flags: Vec<(bool, bool)> = events
        .iter()
        .map(|e| {
            let confirmed = e.sources.len() >= 2;
            let disputed = events.iter().filter(|o| o.time == e.time).count() >= 2;
            (confirmed, disputed)
        })
        .collect();
    for (event, (confirmed, disputed)) in events.iter_mut().zip(flags) {
        event.confirmed = confirmed;
        event.disputed = disputed;
    }

    events.sort_by(|a, b| compare_keys(&a.time, &b.time).then_with(|| a.location.cmp(&b.location)));
    events
}
