use serde::{Deserialize, Serialize};

/// Year the recency penalty is measured against when nothing else is configured.
pub const DEFAULT_CURRENT_YEAR: i32 = 2024;

const LEVEL_WEIGHT: i64 = 1000;
const YEAR_WEIGHT: i64 = 400;
const STALENESS_WEIGHT: i64 = 30;

/// Parameters of the per-skill scoring function.
///
/// `current_year` is a configured value, not the wall clock. Stored scores only
/// change when it is moved forward and the skills are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub current_year: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            current_year: DEFAULT_CURRENT_YEAR,
        }
    }
}

impl ScoringPolicy {
    /// Score of a skill a job opening asks for. No recency penalty applies.
    pub fn required_skill_score(&self, level: i32, years_of_experience: i32) -> Option<i32> {
        let base = base_score(level, years_of_experience)?;
        i32::try_from(base).ok()
    }

    /// Score of a skill a candidate holds, penalised by how long ago it was last used.
    pub fn candidate_skill_score(
        &self,
        level: i32,
        years_of_experience: i32,
        last_used_year: i32,
    ) -> Option<i32> {
        let base = base_score(level, years_of_experience)?;
        let penalty = recency_penalty(base, self.current_year, last_used_year);
        i32::try_from(base - penalty).ok()
    }
}

/// `(level + 1) * 1000 + years * 400`, or `None` while years of experience is zero.
pub fn base_score(level: i32, years_of_experience: i32) -> Option<i64> {
    if years_of_experience == 0 {
        return None;
    }
    Some((i64::from(level) + 1) * LEVEL_WEIGHT + i64::from(years_of_experience) * YEAR_WEIGHT)
}

/// Quadratic staleness penalty, capped at a third of the base score.
pub fn recency_penalty(base: i64, current_year: i32, last_used_year: i32) -> i64 {
    let idle = i64::from(current_year) - i64::from(last_used_year);
    let cap = base / 3;
    (idle * idle * STALENESS_WEIGHT).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_basic_skill() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.candidate_skill_score(0, 1, 2024), Some(1400));
    }

    #[test]
    fn test_fresh_advanced_skill() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.candidate_skill_score(2, 4, 2024), Some(4600));
    }

    #[test]
    fn test_required_skill_has_no_penalty() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.required_skill_score(1, 2), Some(2800));
        assert_eq!(policy.required_skill_score(5, 1), Some(6400));
    }

    #[test]
    fn test_small_gap_penalty() {
        let policy = ScoringPolicy::default();
        // base 2400, (2024 - 2021)^2 * 30 = 270
        assert_eq!(policy.candidate_skill_score(1, 1, 2021), Some(2130));
    }

    #[test]
    fn test_penalty_is_capped_at_a_third() {
        let policy = ScoringPolicy::default();
        // base 5000, uncapped penalty would be 16^2 * 30 = 7680, cap is 1666
        assert_eq!(policy.candidate_skill_score(2, 5, 2008), Some(3334));
    }

    #[test]
    fn test_score_never_below_two_thirds_of_base() {
        let policy = ScoringPolicy::default();
        for level in 0..=2 {
            for years in 1..=15 {
                let base = base_score(level, years).unwrap();
                let floor = (2 * base + 2) / 3;
                for last_used in 1951..=2024 {
                    let score = policy
                        .candidate_skill_score(level, years, last_used)
                        .unwrap();
                    assert!(
                        i64::from(score) >= floor,
                        "level {level} years {years} last_used {last_used}: {score} < {floor}"
                    );
                    assert!(recency_penalty(base, 2024, last_used) <= base / 3);
                }
            }
        }
    }

    #[test]
    fn test_zero_years_is_unscorable() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.candidate_skill_score(2, 0, 2024), None);
        assert_eq!(policy.required_skill_score(1, 0), None);
    }

    #[test]
    fn test_current_year_is_a_parameter() {
        let policy = ScoringPolicy { current_year: 2026 };
        // base 1400, (2026 - 2024)^2 * 30 = 120
        assert_eq!(policy.candidate_skill_score(0, 1, 2024), Some(1280));
    }
}
