use serde::Serialize;

use super::counters::{CounterStore, DailyCounters};
use super::score::{achievements, Achievement, ScoreBand, ScoreBreakdown};
use super::storage::KeyValueStore;

/// Everything the daily tracking view shows, derived from the stored
/// counters on demand.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub counters: DailyCounters,
    pub exercises_completed: usize,
    pub score: ScoreBreakdown,
    pub band: ScoreBand,
    pub achievements: Vec<Achievement>,
}

impl DailySummary {
    pub fn from_counters(counters: DailyCounters) -> Self {
        let score = ScoreBreakdown::from_counters(&counters);
        let achievements = achievements(&counters, score.total);

        Self {
            exercises_completed: counters.exercises_completed(),
            band: score.band(),
            score,
            achievements,
            counters,
        }
    }

    pub fn collect<S: KeyValueStore>(counters: &CounterStore<'_, S>) -> Self {
        Self::from_counters(counters.snapshot())
    }

    pub fn achievements_completed(&self) -> usize {
        self.achievements.iter().filter(|a| a.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counters::CounterKind;
    use crate::core::storage::InMemoryStore;

    #[test]
    fn test_collect_reflects_store() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);
        for _ in 0..4 {
            counters.increment(CounterKind::Water).unwrap();
        }
        counters.increment(CounterKind::HealthyMeals).unwrap();
        counters.increment(CounterKind::UnhealthyMeals).unwrap();
        counters.toggle_exercise_completion(1).unwrap();

        let summary = DailySummary::collect(&counters);
        assert_eq!(summary.score.total, 33);
        assert_eq!(summary.band, ScoreBand::NeedsWork);
        assert_eq!(summary.exercises_completed, 1);
        assert_eq!(summary.achievements_completed(), 0);
    }

    #[test]
    fn test_recomputes_after_changes() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);
        let before = DailySummary::collect(&counters).score.total;

        counters.set(CounterKind::Water, 8).unwrap();
        let after = DailySummary::collect(&counters);
        assert_eq!(before, 0);
        assert_eq!(after.score.total, 30);
        assert!(after.achievements[0].completed);
    }
}
