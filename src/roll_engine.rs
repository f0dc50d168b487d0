// roll_engine.rs
use crate::error::{Result, RollerError};
use crate::table_view::{ColumnId, FilterSet, Table};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::sync::OnceLock;

fn range_shape() -> &'static Regex {
    static RANGE_SHAPE: OnceLock<Regex> = OnceLock::new();
    RANGE_SHAPE.get_or_init(|| Regex::new(r"^\s*(\S+?)\s*-\s*(\S+)\s*$").expect("range pattern compiles"))
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

pub struct RollEngine {
    rng: StdRng,
}

impl RollEngine {
    /// Seeds once from the wall clock so separate runs roll differently.
    pub fn from_wall_clock() -> Self {
        let now = Utc::now();
        let seed = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros()) as u64;
        tracing::debug!(seed, "seeded roll engine");
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws one description consistent with `filters`.
    pub fn roll(&mut self, table: &Table, description: &ColumnId, filters: &FilterSet) -> Result<String> {
        let pool = table.visible_values(description, filters)?;
        self.pick(description.name(), &pool)
    }

    /// Uniform draw from `pool`. A lone entry that declares an integer range
    /// (`min-max`) is rolled as a number in that range instead.
    pub fn pick(&mut self, column: &str, pool: &[String]) -> Result<String> {
        match pool {
            [] => Err(RollerError::EmptyPool {
                column: column.to_string(),
            }),
            [only] => match self.draw_range(only)? {
                Some(value) => Ok(value.to_string()),
                None => Ok(only.clone()),
            },
            _ => {
                let index = self.rng.random_range(0..pool.len());
                tracing::debug!(index, pool = pool.len(), "drew from pool");
                Ok(pool[index].clone())
            }
        }
    }

    /// `Ok(None)` when `text` is not written as a range at all. A range needs
    /// at least one all-digit side; both sides must then be integers with
    /// `min <= max`.
    pub fn draw_range(&mut self, text: &str) -> Result<Option<i64>> {
        let Some(caps) = range_shape().captures(text) else {
            return Ok(None);
        };
        let (low, high) = (&caps[1], &caps[2]);
        if !is_digits(low) && !is_digits(high) {
            return Ok(None);
        }

        let malformed = || {
            RollerError::MalformedSource(format!(
                "single-row value '{}' does not conform to the required \"int-int\" format",
                text
            ))
        };
        let min: i64 = low.parse().map_err(|_| malformed())?;
        let max: i64 = high.parse().map_err(|_| malformed())?;
        if min > max {
            return Err(malformed());
        }

        let value = self.rng.random_range(min..=max);
        tracing::debug!(min, max, value, "rolled range");
        Ok(Some(value))
    }
}
