use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::catalog::DifficultyLevel;
use super::error::{GlowupError, Result};
use super::reminders::ReminderTime;
use super::storage::KeyValueStore;

pub const PREFERENCES_KEY: &str = "userPreferences";

/// Every preference the app knows about. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Difficulty,
    ReminderTime,
    ExerciseReminders,
    Notifications,
    DailyReminders,
    WeeklyReports,
    ProductUpdates,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 7] = [
        PreferenceKey::Difficulty,
        PreferenceKey::ReminderTime,
        PreferenceKey::ExerciseReminders,
        PreferenceKey::Notifications,
        PreferenceKey::DailyReminders,
        PreferenceKey::WeeklyReports,
        PreferenceKey::ProductUpdates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::Difficulty => "difficulty",
            PreferenceKey::ReminderTime => "reminder-time",
            PreferenceKey::ExerciseReminders => "exercise-reminders",
            PreferenceKey::Notifications => "notifications",
            PreferenceKey::DailyReminders => "daily-reminders",
            PreferenceKey::WeeklyReports => "weekly-reports",
            PreferenceKey::ProductUpdates => "product-updates",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized || key.as_str().replace('-', "") == normalized)
            .ok_or_else(|| GlowupError::UnknownPreference(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub difficulty: DifficultyLevel,
    pub reminder_time: Option<ReminderTime>,
    pub exercise_reminders: bool,
    pub notifications: bool,
    pub daily_reminders: bool,
    pub weekly_reports: bool,
    pub product_updates: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            difficulty: DifficultyLevel::Intermediate,
            reminder_time: None,
            exercise_reminders: false,
            notifications: true,
            daily_reminders: true,
            weekly_reports: false,
            product_updates: true,
        }
    }
}

impl Preferences {
    /// Parses `raw` according to `key` and stores it in the record.
    pub fn set(&mut self, key: PreferenceKey, raw: &str) -> Result<()> {
        match key {
            PreferenceKey::Difficulty => self.difficulty = raw.parse()?,
            PreferenceKey::ReminderTime => {
                self.reminder_time = match raw.trim().to_lowercase().as_str() {
                    "" | "off" | "none" => None,
                    _ => Some(raw.parse()?),
                }
            }
            PreferenceKey::ExerciseReminders => self.exercise_reminders = parse_flag(key, raw)?,
            PreferenceKey::Notifications => self.notifications = parse_flag(key, raw)?,
            PreferenceKey::DailyReminders => self.daily_reminders = parse_flag(key, raw)?,
            PreferenceKey::WeeklyReports => self.weekly_reports = parse_flag(key, raw)?,
            PreferenceKey::ProductUpdates => self.product_updates = parse_flag(key, raw)?,
        }
        Ok(())
    }

    pub fn get(&self, key: PreferenceKey) -> String {
        match key {
            PreferenceKey::Difficulty => self.difficulty.to_string(),
            PreferenceKey::ReminderTime => self
                .reminder_time
                .map_or_else(|| "off".to_string(), |t| t.to_string()),
            PreferenceKey::ExerciseReminders => self.exercise_reminders.to_string(),
            PreferenceKey::Notifications => self.notifications.to_string(),
            PreferenceKey::DailyReminders => self.daily_reminders.to_string(),
            PreferenceKey::WeeklyReports => self.weekly_reports.to_string(),
            PreferenceKey::ProductUpdates => self.product_updates.to_string(),
        }
    }

    /// Whether a daily exercise reminder should be armed.
    pub fn wants_daily_reminder(&self) -> Option<ReminderTime> {
        if self.exercise_reminders {
            self.reminder_time
        } else {
            None
        }
    }
}

fn parse_flag(key: PreferenceKey, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(GlowupError::invalid_value(key.as_str(), raw)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifficultySettings {
    pub preferred: DifficultyLevel,
    pub available: Vec<DifficultyLevel>,
}

/// Preferences view over a key/value store. Missing or unreadable records
/// fall back to defaults.
pub struct PreferenceStore<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> PreferenceStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Preferences {
        self.store.get_json(PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn save(&mut self, preferences: &Preferences) -> Result<()> {
        self.store.set_json(PREFERENCES_KEY, preferences)?;
        debug!("preferences saved");
        Ok(())
    }

    /// Parses both the key and the value before anything is written.
    pub fn set(&mut self, key: &str, value: &str) -> Result<Preferences> {
        let key: PreferenceKey = key.parse()?;
        let mut preferences = self.load();
        preferences.set(key, value)?;
        self.save(&preferences)?;
        Ok(preferences)
    }

    pub fn difficulty_settings(&self) -> DifficultySettings {
        DifficultySettings {
            preferred: self.load().difficulty,
            available: DifficultyLevel::ALL.to_vec(),
        }
    }

    pub fn update_difficulty(&mut self, level: DifficultyLevel) -> Result<DifficultyLevel> {
        let mut preferences = self.load();
        preferences.difficulty = level;
        self.save(&preferences)?;
        Ok(level)
    }
}
