use crate::types::{PlayerRecord, Position};

#[derive(Debug, Default)]
pub struct SquadFilter {
    pub position: Option<Position>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl SquadFilter {
    /// Keeps matching records in order. Any age bound drops records without an age.
    pub fn apply(self, mut records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
        if let Some(position) = self.position {
            records.retain(|r| r.position == position);
        }
        if let Some(min) = self.min_age {
            records.retain(|r| r.age.is_some_and(|a| a >= min));
        }
        if let Some(max) = self.max_age {
            records.retain(|r| r.age.is_some_and(|a| a <= max));
        }
        if let Some(min) = self.min_value {
            records.retain(|r| r.market_value >= min);
        }
        if let Some(max) = self.max_value {
            records.retain(|r| r.market_value <= max);
        }
        records
    }

    pub fn validate(self) -> Result<Self, String> {
        if let Some(min) = self.min_age
            && let Some(max) = self.max_age
            && min > max
        {
            return Err(format!(
                "Minimum age ({min}) cannot be greater than maximum age ({max})"
            ));
        }
        for value in [self.min_value, self.max_value].into_iter().flatten() {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("Market value bound ({value}) must be a non-negative number"));
            }
        }
        if let Some(min) = self.min_value
            && let Some(max) = self.max_value
            && min > max
        {
            return Err(format!(
                "Minimum value ({min}) cannot be greater than maximum value ({max})"
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, PartialEq)]
pub struct SquadStats {
    pub players: usize,
    pub total_value: f64,
    pub average_age: Option<f64>,
    pub goalkeepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
    pub unknown: usize,
}

impl SquadStats {
    pub fn from_records(records: &[PlayerRecord]) -> SquadStats {
        let count = |position: Position| records.iter().filter(|r| r.position == position).count();
        let ages: Vec<f64> = records.iter().filter_map(|r| r.age).map(f64::from).collect();

        SquadStats {
            players: records.len(),
            total_value: records.iter().map(|r| r.market_value).sum(),
            average_age: (!ages.is_empty()).then(|| ages.iter().sum::<f64>() / ages.len() as f64),
            goalkeepers: count(Position::Goalkeeper),
            defenders: count(Position::Defender),
            midfielders: count(Position::Midfielder),
            forwards: count(Position::Forward),
            unknown: count(Position::Unknown),
        }
    }
}

impl std::fmt::Display for SquadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Players:      {}", self.players)?;
        writeln!(f, "  Total value:  {:.2}M", self.total_value)?;
        match self.average_age {
            Some(age) => writeln!(f, "  Average age:  {:.1}", age)?,
            None => writeln!(f, "  Average age:  -")?,
        }
        writeln!(f, "  Goalkeepers:  {}", self.goalkeepers)?;
        writeln!(f, "  Defenders:    {}", self.defenders)?;
        writeln!(f, "  Midfielders:  {}", self.midfielders)?;
        writeln!(f, "  Forwards:     {}", self.forwards)?;
        if self.unknown > 0 {
            writeln!(f, "  Unknown:      {}", self.unknown)?;
        }
        Ok(())
    }
}
