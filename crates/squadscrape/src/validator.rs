use std::collections::HashSet;

use crate::types::PlayerRecord;

use serde::{Deserialize, Serialize};

/// Quality thresholds a scraped dataset has to meet before it is served.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub min_rows: usize,
    /// Share of records that must carry an age, in `0.0..=1.0`.
    pub min_age_ratio: f64,
    /// Distinct canonical positions required. `Unknown` never counts.
    pub min_distinct_positions: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_rows: 10,
            min_age_ratio: 0.80,
            min_distinct_positions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("only {found} player(s), at least {required} required")]
    TooFewRows { found: usize, required: usize },
    #[error("only {with_age}/{total} player(s) have a valid age, ratio {required:.2} required")]
    LowAgeCoverage {
        with_age: usize,
        total: usize,
        required: f64,
    },
    #[error("only {found} position(s) represented, at least {required} required")]
    TooFewPositions { found: usize, required: usize },
}

impl ValidationPolicy {
    /// Every threshold the dataset misses, or `Ok` when all hold.
    pub fn check(&self, records: &[PlayerRecord]) -> Result<(), Vec<Rejection>> {
        let mut rejections = Vec::new();
        let total = records.len();

        if total < self.min_rows {
            rejections.push(Rejection::TooFewRows {
                found: total,
                required: self.min_rows,
            });
        }

        let with_age = records.iter().filter(|r| r.age.is_some()).count();
        let ratio = if total == 0 {
            0.0
        } else {
            with_age as f64 / total as f64
        };
        if ratio < self.min_age_ratio {
            rejections.push(Rejection::LowAgeCoverage {
                with_age,
                total,
                required: self.min_age_ratio,
            });
        }

        let positions: HashSet<_> = records
            .iter()
            .map(|r| r.position)
            .filter(|p| p.is_known())
            .collect();
        if positions.len() < self.min_distinct_positions {
            rejections.push(Rejection::TooFewPositions {
                found: positions.len(),
                required: self.min_distinct_positions,
            });
        }

        if rejections.is_empty() {
            Ok(())
        } else {
            Err(rejections)
        }
    }

    pub fn is_acceptable(&self, records: &[PlayerRecord]) -> bool {
        self.check(records).is_ok()
    }
}

/// Validation gate with the default thresholds.
pub fn is_acceptable(records: &[PlayerRecord]) -> bool {
    ValidationPolicy::default().is_acceptable(records)
}
