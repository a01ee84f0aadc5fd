//! Penalty weights.

/// Weight of each violation kind in the fitness penalty.
///
/// # Defaults
///
/// ```
/// use u_timetable::fitness::PenaltyWeights;
///
/// let w = PenaltyWeights::default();
/// assert_eq!((w.hard_conflict, w.gap, w.capacity_overflow, w.unmet_hours), (100, 10, 5, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyWeights {
    /// Per colliding dimension of a double-booked cell.
    pub hard_conflict: u64,
    /// Per idle hole in an attendance stream's day.
    pub gap: u64,
    /// Per placement whose headcount exceeds its room capacity.
    pub capacity_overflow: u64,
    /// Per outstanding half-session in the remaining-hours ledger.
    pub unmet_hours: u64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            hard_conflict: 100,
            gap: 10,
            capacity_overflow: 5,
            unmet_hours: 2,
        }
    }
}

impl PenaltyWeights {
    pub fn with_hard_conflict(mut self, weight: u64) -> Self {
        self.hard_conflict = weight;
        self
    }

    pub fn with_gap(mut self, weight: u64) -> Self {
        self.gap = weight;
        self
    }

    pub fn with_capacity_overflow(mut self, weight: u64) -> Self {
        self.capacity_overflow = weight;
        self
    }

    pub fn with_unmet_hours(mut self, weight: u64) -> Self {
        self.unmet_hours = weight;
        self
    }

    /// Every weight must be positive, otherwise a zero penalty would no
    /// longer imply a violation-free timetable.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("hard_conflict", self.hard_conflict),
            ("gap", self.gap),
            ("capacity_overflow", self.capacity_overflow),
            ("unmet_hours", self.unmet_hours),
        ];
        for (name, weight) in named {
            if weight == 0 {
                return Err(format!("penalty weight {name} must be positive"));
            }
        }
        Ok(())
    }
}
