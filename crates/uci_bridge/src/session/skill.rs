//! Engine skill level
//!
//! The engine accepts a skill level between 1 and 20. Requests outside that
//! range are coerced to the nearest bound; the caller learns about the
//! coercion through the returned [`SkillClamp`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weakest accepted skill level
pub const MIN_SKILL_LEVEL: u8 = 1;
/// Strongest accepted skill level
pub const MAX_SKILL_LEVEL: u8 = 20;

/// A skill level guaranteed to lie in `[1, 20]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SkillLevel(u8);

/// Record of an out-of-range request that was coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillClamp {
    pub requested: i64,
    pub applied: SkillLevel,
}

impl SkillLevel {
    /// Clamp an arbitrary request into range
    ///
    /// Returns the effective level and, when the request was out of range,
    /// a [`SkillClamp`] describing the coercion.
    ///
    /// # Examples
    ///
    /// ```
    /// use uci_bridge::SkillLevel;
    ///
    /// let (level, clamp) = SkillLevel::clamp(25);
    /// assert_eq!(level.get(), 20);
    /// assert!(clamp.is_some());
    ///
    /// let (level, clamp) = SkillLevel::clamp(12);
    /// assert_eq!(level.get(), 12);
    /// assert!(clamp.is_none());
    /// ```
    pub fn clamp(requested: i64) -> (SkillLevel, Option<SkillClamp>) {
        let bounded = requested.clamp(i64::from(MIN_SKILL_LEVEL), i64::from(MAX_SKILL_LEVEL));
        // bounded is within 1..=20 so the cast is lossless
        let level = SkillLevel(bounded as u8);
        let clamp = (bounded != requested).then_some(SkillClamp {
            requested,
            applied: level,
        });
        (level, clamp)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel(10)
    }
}

impl TryFrom<i64> for SkillLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match SkillLevel::clamp(value) {
            (level, None) => Ok(level),
            (_, Some(_)) => Err(format!(
                "skill level {} outside {}..={}",
                value, MIN_SKILL_LEVEL, MAX_SKILL_LEVEL
            )),
        }
    }
}

impl From<SkillLevel> for u8 {
    fn from(level: SkillLevel) -> Self {
        level.0
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds_are_kept() {
        assert_eq!(SkillLevel::clamp(1), (SkillLevel(1), None));
        assert_eq!(SkillLevel::clamp(20), (SkillLevel(20), None));
    }

    #[test]
    fn test_out_of_range_reports_clamp() {
        let (level, clamp) = SkillLevel::clamp(0);
        assert_eq!(level.get(), 1);
        assert_eq!(
            clamp,
            Some(SkillClamp {
                requested: 0,
                applied: SkillLevel(1)
            })
        );
    }

    #[test]
    fn test_default_is_ten() {
        assert_eq!(SkillLevel::default().get(), 10);
    }

    proptest! {
        #[test]
        fn clamp_always_lands_in_range(requested in any::<i64>()) {
            let (level, clamp) = SkillLevel::clamp(requested);
            prop_assert!((MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level.get()));
            prop_assert_eq!(i64::from(level.get()), requested.clamp(1, 20));
            prop_assert_eq!(clamp.is_some(), !(1..=20).contains(&requested));
        }
    }
}
