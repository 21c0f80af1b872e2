use super::MAX_DIFFICULTY;

/// Leading-zero matcher for the current difficulty.
///
/// A hash meets the target when its first `zeros` characters are `'0'` and
/// it is strictly longer than that zero run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyTarget {
    zeros: u32,
    prefix: String,
}

impl DifficultyTarget {
    pub fn new(zeros: u32) -> Self {
        Self {
            zeros,
            prefix: "0".repeat(zeros as usize),
        }
    }

    pub fn zeros(&self) -> u32 {
        self.zeros
    }

    pub fn is_met_by(&self, hash: &str) -> bool {
        hash.len() > self.prefix.len() && hash.starts_with(&self.prefix)
    }
}

/// Outcome of one controller step, reported alongside each admitted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Increased,
    Decreased,
    Unchanged,
}

/// One-step controller driven by how long the last block took to mine.
/// Returns the new difficulty; never steps below zero or above `MAX_DIFFICULTY`.
pub fn adjust(difficulty: u32, generation_secs: u64) -> (u32, Adjustment) {
    if generation_secs < 1 && difficulty < MAX_DIFFICULTY {
        (difficulty + 1, Adjustment::Increased)
    } else if generation_secs > 1 || difficulty >= MAX_DIFFICULTY {
        match difficulty.checked_sub(1) {
            Some(lower) => (lower, Adjustment::Decreased),
            None => (0, Adjustment::Unchanged),
        }
    } else {
        (difficulty, Adjustment::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::{Adjustment, DifficultyTarget, adjust};

    #[test]
    fn target_requires_zero_run_plus_one_char() {
        let t = DifficultyTarget::new(2);
        assert!(t.is_met_by("00a1"));
        assert!(t.is_met_by("000"));
        assert!(!t.is_met_by("00"));
        assert!(!t.is_met_by("0a00"));

        let any = DifficultyTarget::new(0);
        assert!(any.is_met_by("f"));
        assert!(!any.is_met_by(""));
    }

    #[test]
    fn fast_blocks_raise_difficulty_up_to_four() {
        assert_eq!(adjust(0, 0), (1, Adjustment::Increased));
        assert_eq!(adjust(3, 0), (4, Adjustment::Increased));
        assert_eq!(adjust(4, 0), (3, Adjustment::Decreased));
    }

    #[test]
    fn slow_blocks_lower_difficulty_but_not_below_zero() {
        assert_eq!(adjust(2, 2), (1, Adjustment::Decreased));
        assert_eq!(adjust(0, 5), (0, Adjustment::Unchanged));
    }

    #[test]
    fn one_second_blocks_hold_steady() {
        assert_eq!(adjust(2, 1), (2, Adjustment::Unchanged));
        assert_eq!(adjust(4, 1), (3, Adjustment::Decreased));
    }
}
