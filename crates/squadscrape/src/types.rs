use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column names of the tabular view of a dataset, in [`PlayerRecord::cells`] order.
pub const COLUMNS: [&str; 5] = [
    "name",
    "position",
    "age",
    "market_value",
    "contract_expiry",
];

#[derive(Debug, thiserror::Error)]
#[error(
    "Invalid position '{0}'. Accepted values: 'goalkeeper', 'defender', 'midfielder', 'forward', 'unknown'"
)]
pub struct PositionParseError(String);

/// Canonical position category. Raw site labels are mapped onto these by
/// [`crate::parser::normalize_position`] and never leak past extraction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unknown,
}

impl Position {
    pub const CANONICAL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
            Position::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Position::Unknown
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "goalkeeper" | "gk" => Ok(Position::Goalkeeper),
            "defender" | "df" => Ok(Position::Defender),
            "midfielder" | "mf" => Ok(Position::Midfielder),
            "forward" | "fw" => Ok(Position::Forward),
            "unknown" => Ok(Position::Unknown),
            _ => Err(PositionParseError(s.to_string())),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One player row of a squad dataset.
///
/// `age` is `None` when the source had no usable age; `market_value` is in
/// millions and uses `0.0` for "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerRecord {
    pub name: String,
    pub position: Position,
    pub age: Option<u8>,
    pub market_value: f64,
    pub contract_expiry: Option<NaiveDate>,
}

impl PlayerRecord {
    /// Cell values in [`COLUMNS`] order; absent values render as an empty string.
    pub fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.position.to_string(),
            self.age.map(|a| a.to_string()).unwrap_or_default(),
            format!("{:.2}", self.market_value),
            self.contract_expiry
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ]
    }
}

impl Display for PlayerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<28} {:<11}", self.name, self.position)?;
        match self.age {
            Some(age) => write!(f, " {:>3}", age)?,
            None => write!(f, "   -")?,
        }
        write!(f, " {:>7.2}M", self.market_value)?;
        match self.contract_expiry {
            Some(date) => write!(f, "  until {}", date),
            None => write!(f, "  until -"),
        }
    }
}
