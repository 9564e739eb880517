//! Stock status classification.
//!
//! Raw card labels (`"În stoc"`, `"Ultimele 3 produse"`, `"Livrare în 5 zile"`)
//! are normalized to an accent-free snake_case key and matched against a fixed
//! rule table. First match wins.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::product::{Availability, StockInfo};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

const ACCENTS: [(char, char); 5] = [('ă', 'a'), ('â', 'a'), ('î', 'i'), ('ș', 's'), ('ț', 't')];

/// How a rule compares against the normalized key
#[derive(Debug, Clone, Copy)]
enum Match {
    Exact(&'static str),
    Prefix(&'static str),
}

/// Numeric payload extracted by a rule
#[derive(Debug, Clone, Copy)]
enum Payload {
    None,
    DeliveryDays,
    ItemsLeft,
    FixedItemsLeft(u32),
}

struct Rule {
    matcher: Match,
    availability: Availability,
    payload: Payload,
}

const RULES: &[Rule] = &[
    Rule {
        matcher: Match::Exact("in_stoc"),
        availability: Availability::Available,
        payload: Payload::None,
    },
    Rule {
        matcher: Match::Exact("in_stoc_furnizor"),
        availability: Availability::Available,
        payload: Payload::None,
    },
    Rule {
        matcher: Match::Exact("indisponibil"),
        availability: Availability::Unavailable,
        payload: Payload::None,
    },
    Rule {
        matcher: Match::Exact("stoc_epuizat"),
        availability: Availability::Unavailable,
        payload: Payload::None,
    },
    Rule {
        matcher: Match::Prefix("livrare_in"),
        availability: Availability::Available,
        payload: Payload::DeliveryDays,
    },
    Rule {
        matcher: Match::Prefix("ultimele"),
        availability: Availability::Available,
        payload: Payload::ItemsLeft,
    },
    Rule {
        matcher: Match::Exact("ultimul_produs_in_stoc"),
        availability: Availability::Available,
        payload: Payload::FixedItemsLeft(1),
    },
    Rule {
        matcher: Match::Exact("stoc_limitat"),
        availability: Availability::Limited,
        payload: Payload::None,
    },
    Rule {
        matcher: Match::Prefix("precomanda"),
        availability: Availability::PreOrder,
        payload: Payload::None,
    },
];

/// Normalize raw availability text into the key the rule table matches on
pub fn normalize(raw: &str) -> String {
    let lowered: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            ACCENTS
                .iter()
                .find(|(accented, _)| *accented == c)
                .map_or(c, |(_, plain)| *plain)
        })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Classify raw stock text.
///
/// `None` in gives `None` out. Unrecognized text is logged and also yields
/// `None`; it never fails the product it belongs to.
pub fn parse_stock_status(raw: Option<&str>) -> Option<StockInfo> {
    let raw = raw?;
    let key = normalize(raw);

    let classified = classify(&key);
    if classified.is_none() {
        warn!("Unrecognized stock status '{}' (normalized '{}')", raw.trim(), key);
    }
    classified
}

/// Rule-table lookup on an already normalized key
pub fn classify(key: &str) -> Option<StockInfo> {
    RULES.iter().find_map(|rule| {
        let rest = match rule.matcher {
            Match::Exact(expected) => (key == expected).then_some(""),
            Match::Prefix(prefix) => key.strip_prefix(prefix),
        }?;

        let info = StockInfo::new(rule.availability);
        Some(match rule.payload {
            Payload::None => info,
            Payload::DeliveryDays => info.with_delivery_days(first_number(rest)),
            Payload::ItemsLeft => info.with_items_left(first_number(rest)),
            Payload::FixedItemsLeft(n) => info.with_items_left(Some(n)),
        })
    })
}

fn first_number(text: &str) -> Option<u32> {
    DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}
