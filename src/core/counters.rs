use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::error::{GlowupError, Result};
use super::storage::KeyValueStore;

pub const COMPLETED_EXERCISES_KEY: &str = "completedExercises";

/// The plain numeric counters tracked per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Water,
    HealthyMeals,
    UnhealthyMeals,
}

impl CounterKind {
    pub const ALL: [CounterKind; 3] = [
        CounterKind::Water,
        CounterKind::HealthyMeals,
        CounterKind::UnhealthyMeals,
    ];

    /// Storage key for this counter.
    pub fn key(self) -> &'static str {
        match self {
            CounterKind::Water => "waterGlasses",
            CounterKind::HealthyMeals => "healthyMeals",
            CounterKind::UnhealthyMeals => "unhealthyMeals",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKind::Water => write!(f, "water"),
            CounterKind::HealthyMeals => write!(f, "healthy"),
            CounterKind::UnhealthyMeals => write!(f, "unhealthy"),
        }
    }
}

impl FromStr for CounterKind {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "water" | "waterglasses" => Ok(CounterKind::Water),
            "healthy" | "healthymeals" => Ok(CounterKind::HealthyMeals),
            "unhealthy" | "unhealthymeals" => Ok(CounterKind::UnhealthyMeals),
            _ => Err(GlowupError::Parse(format!("unknown counter: {}", s))),
        }
    }
}

/// Snapshot of everything tracked for the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounters {
    pub water_glasses: u32,
    pub healthy_meals: u32,
    pub unhealthy_meals: u32,
    pub completed_exercise_ids: BTreeSet<u32>,
}

impl DailyCounters {
    pub fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Water => self.water_glasses,
            CounterKind::HealthyMeals => self.healthy_meals,
            CounterKind::UnhealthyMeals => self.unhealthy_meals,
        }
    }

    pub fn exercises_completed(&self) -> usize {
        self.completed_exercise_ids.len()
    }
}

/// Counter view over a key/value store. Every mutation is written through
/// before returning. Counters never roll over on their own; only `reset*`
/// clears them.
pub struct CounterStore<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> CounterStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn get(&self, kind: CounterKind) -> u32 {
        self.store.get_u32(kind.key())
    }

    pub fn set(&mut self, kind: CounterKind, value: u32) -> Result<()> {
        self.store.set_u32(kind.key(), value)?;
        debug!(counter = %kind, value, "counter set");
        Ok(())
    }

    /// Returns the new value.
    pub fn increment(&mut self, kind: CounterKind) -> Result<u32> {
        let value = self.get(kind).saturating_add(1);
        self.set(kind, value)?;
        Ok(value)
    }

    /// Floored at zero. Returns the new value.
    pub fn decrement(&mut self, kind: CounterKind) -> Result<u32> {
        let value = self.get(kind).saturating_sub(1);
        self.set(kind, value)?;
        Ok(value)
    }

    /// Completed exercise ids in the order they were completed.
    pub fn completed_exercises(&self) -> Vec<u32> {
        let mut seen = BTreeSet::new();
        self.store
            .get_json::<Vec<u32>>(COMPLETED_EXERCISES_KEY)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn is_completed(&self, exercise_id: u32) -> bool {
        self.completed_exercises().contains(&exercise_id)
    }

    /// Adds the id if absent, removes it if present. Returns whether the
    /// exercise is now marked completed.
    pub fn toggle_exercise_completion(&mut self, exercise_id: u32) -> Result<bool> {
        let mut completed = self.completed_exercises();
        let now_completed = match completed.iter().position(|id| *id == exercise_id) {
            Some(index) => {
                completed.remove(index);
                false
            }
            None => {
                completed.push(exercise_id);
                true
            }
        };

        self.store.set_json(COMPLETED_EXERCISES_KEY, &completed)?;
        debug!(exercise_id, now_completed, "toggled exercise completion");
        Ok(now_completed)
    }

    pub fn snapshot(&self) -> DailyCounters {
        DailyCounters {
            water_glasses: self.get(CounterKind::Water),
            healthy_meals: self.get(CounterKind::HealthyMeals),
            unhealthy_meals: self.get(CounterKind::UnhealthyMeals),
            completed_exercise_ids: self.completed_exercises().into_iter().collect(),
        }
    }

    pub fn reset_water(&mut self) -> Result<()> {
        self.set(CounterKind::Water, 0)
    }

    pub fn reset_meals(&mut self) -> Result<()> {
        self.set(CounterKind::HealthyMeals, 0)?;
        self.set(CounterKind::UnhealthyMeals, 0)
    }

    /// Zero every counter and clear the completion set.
    pub fn reset(&mut self) -> Result<()> {
        for kind in CounterKind::ALL {
            self.set(kind, 0)?;
        }
        self.store.set_json(COMPLETED_EXERCISES_KEY, &Vec::<u32>::new())?;
        debug!("daily counters reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::InMemoryStore;

    #[test]
    fn test_defaults_to_zero() {
        let mut kv = InMemoryStore::new();
        let counters = CounterStore::new(&mut kv);
        assert_eq!(counters.snapshot(), DailyCounters::default());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);

        assert_eq!(counters.increment(CounterKind::Water).unwrap(), 1);
        assert_eq!(counters.increment(CounterKind::Water).unwrap(), 2);
        assert_eq!(counters.decrement(CounterKind::Water).unwrap(), 1);
        assert_eq!(counters.get(CounterKind::HealthyMeals), 0);

        // persisted as a string-encoded integer
        assert_eq!(kv.get("waterGlasses").as_deref(), Some("1"));
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);
        assert_eq!(counters.decrement(CounterKind::UnhealthyMeals).unwrap(), 0);
        assert_eq!(counters.decrement(CounterKind::UnhealthyMeals).unwrap(), 0);
    }

    #[test]
    fn test_toggle_exercise_completion() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);

        assert!(counters.toggle_exercise_completion(3).unwrap());
        assert!(counters.toggle_exercise_completion(1).unwrap());
        assert!(counters.is_completed(3));
        assert_eq!(counters.completed_exercises(), vec![3, 1]);

        assert!(!counters.toggle_exercise_completion(3).unwrap());
        assert_eq!(counters.completed_exercises(), vec![1]);
        assert_eq!(kv.get(COMPLETED_EXERCISES_KEY).as_deref(), Some("[1]"));
    }

    #[test]
    fn test_duplicate_completions_collapse() {
        let mut kv = InMemoryStore::with_entries([(COMPLETED_EXERCISES_KEY, "[2,2,5]")]);
        let counters = CounterStore::new(&mut kv);
        assert_eq!(counters.completed_exercises(), vec![2, 5]);
        assert_eq!(counters.snapshot().exercises_completed(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);
        counters.set(CounterKind::Water, 6).unwrap();
        counters.set(CounterKind::HealthyMeals, 2).unwrap();
        counters.set(CounterKind::UnhealthyMeals, 1).unwrap();
        counters.toggle_exercise_completion(7).unwrap();

        counters.reset().unwrap();
        assert_eq!(counters.snapshot(), DailyCounters::default());
    }

    #[test]
    fn test_partial_resets() {
        let mut kv = InMemoryStore::new();
        let mut counters = CounterStore::new(&mut kv);
        counters.set(CounterKind::Water, 6).unwrap();
        counters.set(CounterKind::HealthyMeals, 2).unwrap();

        counters.reset_meals().unwrap();
        assert_eq!(counters.get(CounterKind::Water), 6);
        assert_eq!(counters.get(CounterKind::HealthyMeals), 0);

        counters.reset_water().unwrap();
        assert_eq!(counters.get(CounterKind::Water), 0);
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut kv = InMemoryStore::read_only();
        let mut counters = CounterStore::new(&mut kv);
        assert!(matches!(
            counters.increment(CounterKind::Water),
            Err(GlowupError::Storage(_))
        ));
    }

    #[test]
    fn test_counter_kind_parse() {
        assert_eq!("water".parse::<CounterKind>().unwrap(), CounterKind::Water);
        assert_eq!("Healthy".parse::<CounterKind>().unwrap(), CounterKind::HealthyMeals);
        assert!("coffee".parse::<CounterKind>().is_err());
    }
}
