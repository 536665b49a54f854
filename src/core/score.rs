use serde::Serialize;
use std::fmt;

use super::counters::DailyCounters;

pub const WATER_GOAL: u32 = 8;
pub const HEALTHY_MEAL_GOAL: u32 = 3;
pub const EXERCISE_GOAL: u32 = 3;

const WATER_WEIGHT: f64 = 30.0;
const MEAL_WEIGHT: f64 = 25.0;
const UNHEALTHY_PENALTY: f64 = 5.0;
const UNHEALTHY_PENALTY_CAP: f64 = 15.0;
const EXERCISE_WEIGHT: f64 = 45.0;

/// Wellness score in `[0, 100]`. Pure; never fails.
pub fn compute_score(counters: &DailyCounters) -> u8 {
    ScoreBreakdown::from_counters(counters).total
}

/// The three score components alongside the rounded total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub water: f64,
    pub meals: f64,
    pub exercise: f64,
    pub total: u8,
}

impl ScoreBreakdown {
    pub fn from_counters(counters: &DailyCounters) -> Self {
        let water = proportion(counters.water_glasses, WATER_GOAL, WATER_WEIGHT);
        let meals = proportion(counters.healthy_meals, HEALTHY_MEAL_GOAL, MEAL_WEIGHT)
            - (f64::from(counters.unhealthy_meals) * UNHEALTHY_PENALTY).min(UNHEALTHY_PENALTY_CAP);
        let exercise = proportion(
            u32::try_from(counters.exercises_completed()).unwrap_or(u32::MAX),
            EXERCISE_GOAL,
            EXERCISE_WEIGHT,
        );

        let total = (water + meals + exercise).round().clamp(0.0, 100.0) as u8;

        Self {
            water,
            meals,
            exercise,
            total,
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.total)
    }
}

fn proportion(count: u32, goal: u32, weight: f64) -> f64 {
    (f64::from(count) / f64::from(goal) * weight).min(weight)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    Excellent,
    Good,
    GettingThere,
    NeedsWork,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => ScoreBand::Excellent,
            60..=79 => ScoreBand::Good,
            40..=59 => ScoreBand::GettingThere,
            _ => ScoreBand::NeedsWork,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent! Keep it up!",
            ScoreBand::Good => "Good progress!",
            ScoreBand::GettingThere => "Getting there!",
            ScoreBand::NeedsWork => "Let's improve together!",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub title: &'static str,
    pub description: &'static str,
    pub completed: bool,
}

pub fn achievements(counters: &DailyCounters, score: u8) -> Vec<Achievement> {
    vec![
        Achievement {
            title: "Hydration Hero",
            description: "Drink 8 glasses of water daily",
            completed: counters.water_glasses >= WATER_GOAL,
        },
        Achievement {
            title: "Nutrition Champion",
            description: "Eat 3 healthy meals daily",
            completed: counters.healthy_meals >= HEALTHY_MEAL_GOAL,
        },
        Achievement {
            title: "Wellness Warrior",
            description: "Score 80+ on wellness tracker",
            completed: score >= 80,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(water: u32, healthy: u32, unhealthy: u32, completed: &[u32]) -> DailyCounters {
        DailyCounters {
            water_glasses: water,
            healthy_meals: healthy,
            unhealthy_meals: unhealthy,
            completed_exercise_ids: completed.iter().copied().collect(),
        }
    }

    #[test]
    fn test_all_goals_met_is_100() {
        assert_eq!(compute_score(&counters(8, 3, 0, &[1, 2, 3])), 100);
        assert_eq!(compute_score(&counters(20, 9, 0, &[1, 2, 3, 4, 5])), 100);
    }

    #[test]
    fn test_nothing_done_with_junk_food_is_0() {
        assert_eq!(compute_score(&counters(0, 0, 3, &[])), 0);
        assert_eq!(compute_score(&counters(0, 0, 50, &[])), 0);
    }

    #[test]
    fn test_empty_day_is_0() {
        assert_eq!(compute_score(&DailyCounters::default()), 0);
    }

    #[test]
    fn test_mixed_day_breakdown() {
        let breakdown = ScoreBreakdown::from_counters(&counters(4, 1, 1, &[9]));
        assert!((breakdown.water - 15.0).abs() < 1e-9);
        assert!((breakdown.meals - (25.0 / 3.0 - 5.0)).abs() < 1e-9);
        assert!((breakdown.exercise - 15.0).abs() < 1e-9);
        assert_eq!(breakdown.total, 33);
    }

    #[test]
    fn test_penalty_is_capped() {
        let three = compute_score(&counters(8, 3, 3, &[1, 2, 3]));
        let ten = compute_score(&counters(8, 3, 10, &[1, 2, 3]));
        assert_eq!(three, 85);
        assert_eq!(three, ten);
    }

    #[test]
    fn test_deterministic() {
        let c = counters(5, 2, 1, &[1, 4]);
        assert_eq!(compute_score(&c), compute_score(&c));
    }

    #[test]
    fn test_monotonic() {
        let mut previous = 0;
        for water in 0..12 {
            let score = compute_score(&counters(water, 1, 1, &[1]));
            assert!(score >= previous);
            previous = score;
        }

        let mut previous = 100;
        for unhealthy in 0..6 {
            let score = compute_score(&counters(8, 3, unhealthy, &[1, 2, 3]));
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_bands() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(40), ScoreBand::GettingThere);
        assert_eq!(ScoreBand::from_score(0), ScoreBand::NeedsWork);
        assert_eq!(ScoreBand::NeedsWork.message(), "Let's improve together!");
    }

    #[test]
    fn test_achievements() {
        let c = counters(8, 2, 0, &[]);
        let list = achievements(&c, compute_score(&c));
        assert!(list[0].completed);
        assert!(!list[1].completed);
        assert!(!list[2].completed);
    }
}
