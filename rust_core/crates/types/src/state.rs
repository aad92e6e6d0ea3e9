/// Swing classification of a bar.
///
/// The first six variants are the states a bar can be classified in. The
/// two meta variants only index the engine's level table and remember where
/// a breakout started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TrendState {
    /// Secondary rally
    SRally,
    /// Natural rally
    Rally,
    /// Upward trend
    UpTrend,
    /// Downward trend
    DownTrend,
    /// Natural reaction
    Reaction,
    /// Secondary reaction
    SReaction,
    /// Meta level remembering the last rally top
    MRally,
    /// Meta level remembering the last reaction bottom
    MReaction,
}

impl TrendState {
    /// Number of entries in a level table indexed by state.
    pub const COUNT: usize = 8;

    /// All states in level-table order.
    pub const ALL: [TrendState; Self::COUNT] = [
        TrendState::SRally,
        TrendState::Rally,
        TrendState::UpTrend,
        TrendState::DownTrend,
        TrendState::Reaction,
        TrendState::SReaction,
        TrendState::MRally,
        TrendState::MReaction,
    ];

    /// Position of the state in a level table.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            TrendState::SRally => 0,
            TrendState::Rally => 1,
            TrendState::UpTrend => 2,
            TrendState::DownTrend => 3,
            TrendState::Reaction => 4,
            TrendState::SReaction => 5,
            TrendState::MRally => 6,
            TrendState::MReaction => 7,
        }
    }

    /// Rally, uptrend, downtrend or reaction.
    #[must_use]
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            TrendState::Rally | TrendState::UpTrend | TrendState::DownTrend | TrendState::Reaction
        )
    }

    /// Secondary rally or secondary reaction.
    #[must_use]
    pub fn is_secondary(self) -> bool {
        matches!(self, TrendState::SRally | TrendState::SReaction)
    }

    /// Rally or uptrend.
    #[must_use]
    pub fn is_up(self) -> bool {
        matches!(self, TrendState::Rally | TrendState::UpTrend)
    }

    /// Reaction or downtrend.
    #[must_use]
    pub fn is_down(self) -> bool {
        matches!(self, TrendState::Reaction | TrendState::DownTrend)
    }

    /// Short label used in reports.
    #[must_use]
    pub fn abbrev(self) -> &'static str {
        match self {
            TrendState::SRally => "SRa",
            TrendState::Rally => "NRa",
            TrendState::UpTrend => "UT",
            TrendState::DownTrend => "DT",
            TrendState::Reaction => "NRe",
            TrendState::SReaction => "SRe",
            TrendState::MRally => "MRa",
            TrendState::MReaction => "MRe",
        }
    }
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// True when moving from `prev` to `crt` reverses direction between
/// primary states.
#[must_use]
pub fn is_reversal(prev: Option<TrendState>, crt: Option<TrendState>) -> bool {
    match (prev, crt) {
        (Some(p), Some(c)) => (p.is_down() && c.is_up()) || (p.is_up() && c.is_down()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_table_order() {
        for (i, state) in TrendState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
    }

    #[test]
    fn test_direction_groups() {
        assert!(TrendState::Rally.is_up());
        assert!(!TrendState::SRally.is_up());
        assert!(!TrendState::MRally.is_primary());
        assert!(TrendState::DownTrend.is_primary());
    }

    #[test]
    fn test_reversal() {
        use TrendState::*;
        assert!(is_reversal(Some(Reaction), Some(UpTrend)));
        assert!(is_reversal(Some(UpTrend), Some(DownTrend)));
        assert!(!is_reversal(Some(Rally), Some(UpTrend)));
        assert!(!is_reversal(Some(SRally), Some(Reaction)));
        assert!(!is_reversal(None, Some(Reaction)));
    }

    #[test]
    fn test_abbrev() {
        assert_eq!(TrendState::Rally.to_string(), "NRa");
        assert_eq!(TrendState::SReaction.to_string(), "SRe");
    }
}
