use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Position;

pub const MIN_AGE: u8 = 16;
pub const MAX_AGE: u8 = 50;

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("invalid regex: number"));
static RE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+").expect("invalid regex: word"));
static RE_PAREN_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*(\d+)\s*\)").expect("invalid regex: parenthesized int"));
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("invalid regex: date")
});

const THOUSAND_WORDS: &[&str] = &["k", "mil", "th", "tsd", "thousand", "miles"];
const MILLION_WORDS: &[&str] = &[
    "m", "mill", "mio", "mln", "million", "millions", "millones",
];

/// Raw position labels as the source site emits them, in English, Spanish and
/// German. Matching is whole-word, so adding a locale is a table change.
pub const POSITION_LABELS: &[(&str, Position)] = &[
    ("goalkeeper", Position::Goalkeeper),
    ("keeper", Position::Goalkeeper),
    ("portero", Position::Goalkeeper),
    ("guardameta", Position::Goalkeeper),
    ("torwart", Position::Goalkeeper),
    ("defender", Position::Defender),
    ("defence", Position::Defender),
    ("centre-back", Position::Defender),
    ("center-back", Position::Defender),
    ("left-back", Position::Defender),
    ("right-back", Position::Defender),
    ("full-back", Position::Defender),
    ("sweeper", Position::Defender),
    ("defensa", Position::Defender),
    ("defensa central", Position::Defender),
    ("central", Position::Defender),
    ("lateral", Position::Defender),
    ("lateral izquierdo", Position::Defender),
    ("lateral derecho", Position::Defender),
    ("abwehr", Position::Defender),
    ("verteidiger", Position::Defender),
    ("innenverteidiger", Position::Defender),
    ("linker verteidiger", Position::Defender),
    ("rechter verteidiger", Position::Defender),
    ("midfield", Position::Midfielder),
    ("midfielder", Position::Midfielder),
    ("central midfield", Position::Midfielder),
    ("defensive midfield", Position::Midfielder),
    ("attacking midfield", Position::Midfielder),
    ("left midfield", Position::Midfielder),
    ("right midfield", Position::Midfielder),
    ("mediocentro", Position::Midfielder),
    ("mediocentro ofensivo", Position::Midfielder),
    ("mediocentro defensivo", Position::Midfielder),
    ("centrocampista", Position::Midfielder),
    ("mediapunta", Position::Midfielder),
    ("pivote", Position::Midfielder),
    ("interior izquierdo", Position::Midfielder),
    ("interior derecho", Position::Midfielder),
    ("mittelfeld", Position::Midfielder),
    ("zentrales mittelfeld", Position::Midfielder),
    ("defensives mittelfeld", Position::Midfielder),
    ("offensives mittelfeld", Position::Midfielder),
    ("forward", Position::Forward),
    ("striker", Position::Forward),
    ("second striker", Position::Forward),
    ("winger", Position::Forward),
    ("left winger", Position::Forward),
    ("right winger", Position::Forward),
    ("attack", Position::Forward),
    ("attacker", Position::Forward),
    ("centre-forward", Position::Forward),
    ("center-forward", Position::Forward),
    ("delantero", Position::Forward),
    ("delantero centro", Position::Forward),
    ("extremo", Position::Forward),
    ("extremo izquierdo", Position::Forward),
    ("extremo derecho", Position::Forward),
    ("sturm", Position::Forward),
    ("angriff", Position::Forward),
    ("mittelstürmer", Position::Forward),
    ("linksaußen", Position::Forward),
    ("rechtsaußen", Position::Forward),
];

// Longest labels first so "central midfield" wins over "central".
static POSITION_TABLE: LazyLock<Vec<(Vec<&'static str>, Position)>> = LazyLock::new(|| {
    let mut table: Vec<_> = POSITION_LABELS
        .iter()
        .map(|&(label, position)| (label.split_whitespace().collect::<Vec<_>>(), position))
        .collect();
    table.sort_by(|(a, _), (b, _)| {
        b.len()
            .cmp(&a.len())
            .then_with(|| b.concat().len().cmp(&a.concat().len()))
    });
    table
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    Thousand,
    Million,
}

/// How far ahead of the reference date a contract-expiry date may lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractWindow {
    pub years_ahead: i32,
}

impl Default for ContractWindow {
    fn default() -> Self {
        Self { years_ahead: 5 }
    }
}

impl ContractWindow {
    /// Strictly after `today`, and no later than the end of `today.year() + years_ahead`.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date > today && date.year() <= today.year() + self.years_ahead
    }
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All valid day/month/year dates in `text`, in order of appearance.
pub fn find_dates(text: &str) -> impl Iterator<Item = NaiveDate> + '_ {
    RE_DATE.captures_iter(text).filter_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Parses a market value such as `"1,50 mill. €"`, `"600 mil €"` or `"€1.50m"`
/// into millions, rounded to two decimals. Anything without digits is `0.0`.
///
/// Separators are resolved by order: when both `,` and `.` appear the last
/// one is the decimal separator. A lone separator is read as decimal, so
/// `"1,500"` is 1.5, not 1500. This is ambiguous by nature and only the
/// formats the site actually emits are covered.
///
/// The rule is sometimes stated as "comma before period means the comma is
/// decimal". Read literally that inverts real formats: in `"1.234,50"` and
/// `"1,234.50"` it is the later separator that is decimal, so position wins
/// here, not which character comes first.
pub fn parse_market_value(text: &str) -> f64 {
    let cleaned = text.to_lowercase().replace(['€', '$', '£'], " ");

    let Some(number) = RE_NUMBER.find(&cleaned) else {
        return 0.0;
    };
    let Some(value) = parse_localized_number(number.as_str()) else {
        return 0.0;
    };

    let scaled = match detect_scale(&cleaned[..number.start()])
        .or_else(|| detect_scale(&cleaned[number.end()..]))
    {
        Some(Scale::Thousand) => value / 1000.0,
        Some(Scale::Million) | None => value,
    };

    round_to_cents(scaled)
}

fn parse_localized_number(token: &str) -> Option<f64> {
    let token = token.trim_end_matches(['.', ',']);

    let decimal_at = match (token.rfind(','), token.rfind('.')) {
        (Some(comma), Some(dot)) => Some(comma.max(dot)),
        (Some(comma), None) if token.matches(',').count() == 1 => Some(comma),
        (None, Some(dot)) if token.matches('.').count() == 1 => Some(dot),
        _ => None,
    };

    let normalized: String = token
        .char_indices()
        .filter_map(|(i, c)| {
            if c.is_ascii_digit() {
                Some(c)
            } else if Some(i) == decimal_at {
                Some('.')
            } else {
                None
            }
        })
        .collect();

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn detect_scale(text: &str) -> Option<Scale> {
    RE_WORD.find_iter(text).find_map(|word| {
        let word = word.as_str();
        if MILLION_WORDS.contains(&word) {
            Some(Scale::Million)
        } else if THOUSAND_WORDS.contains(&word) {
            Some(Scale::Thousand)
        } else {
            None
        }
    })
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Maps a raw position label onto its canonical category, `Unknown` when
/// no table label occurs in it as a whole word sequence.
pub fn normalize_position(text: &str) -> Position {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
        .filter(|t| !t.is_empty() && *t != "-")
        .collect();

    POSITION_TABLE
        .iter()
        .find(|(label, _)| {
            tokens.len() >= label.len()
                && tokens
                    .windows(label.len())
                    .any(|window| window.iter().zip(label).all(|(a, b)| a == b))
        })
        .map(|(_, position)| *position)
        .unwrap_or(Position::Unknown)
}

/// Whether `text` holds an integer in parentheses, as in `"(28)"`. Labels
/// such as `"(C)"` do not count.
pub fn has_parenthesized_number(text: &str) -> bool {
    RE_PAREN_INT.is_match(text)
}

/// Extracts an age from text like `"12/01/1997 (28)"`.
///
/// A parenthesized number decides the result when present. Otherwise the
/// first date is read as a birth date and aged against `today`. Ages outside
/// [`MIN_AGE`]..=[`MAX_AGE`] are `None`.
pub fn extract_age(text: &str, today: NaiveDate) -> Option<u8> {
    let years: u32 = match RE_PAREN_INT.captures(text) {
        Some(caps) => caps[1].parse().ok()?,
        None => {
            let birth = find_dates(text).next()?;
            today.years_since(birth)?
        }
    };

    u8::try_from(years)
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
}

/// The first date across `fragments` that falls inside `window`. Signing
/// dates and birth dates lie in the past and are skipped.
pub fn extract_contract_expiry<'a>(
    fragments: impl IntoIterator<Item = &'a str>,
    window: &ContractWindow,
    today: NaiveDate,
) -> Option<NaiveDate> {
    fragments
        .into_iter()
        .flat_map(|fragment| find_dates(fragment))
        .find(|date| window.contains(*date, today))
}
