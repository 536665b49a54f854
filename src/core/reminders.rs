//! Reminder schedule entries and notification delivery.
//!
//! The core only records what should fire and when. Waiting for the fire
//! time is the caller's job (see `crate::scheduler`).

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{GlowupError, Result};
use super::storage::KeyValueStore;

pub const REMINDERS_KEY: &str = "scheduledReminders";
pub const DAILY_REMINDER_NAME: &str = "Daily Facial Exercise";

pub const MOTIVATION_MESSAGES: [&str; 5] = [
    "🌟 You're glowing! Keep up the great work!",
    "💆 Time to pamper yourself with a facial exercise",
    "✨ Your skin will thank you for staying consistent!",
    "🧘 A few minutes of self-care can make a big difference",
    "💖 You deserve this moment of wellness",
];

/// Wall-clock time of day, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ReminderTime)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ReminderTime {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GlowupError::invalid_value("reminder time", s);
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hours: u32 = hours.parse().map_err(|_| invalid())?;
        let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
        ReminderTime::new(hours, minutes).ok_or_else(invalid)
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for ReminderTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReminderTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Next moment strictly after `now` at which `time` occurs: today if still
/// ahead, otherwise tomorrow.
pub fn next_fire_time(time: ReminderTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(time.time());
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Exercise,
    Motivation,
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderKind::Exercise => write!(f, "exercise"),
            ReminderKind::Motivation => write!(f, "motivation"),
        }
    }
}

impl FromStr for ReminderKind {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "exercise" => Ok(ReminderKind::Exercise),
            "motivation" => Ok(ReminderKind::Motivation),
            _ => Err(GlowupError::invalid_value("reminder kind", s)),
        }
    }
}

/// A reminder handed to whoever owns the timers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub id: Uuid,
    pub time: ReminderTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    /// Local wall-clock fire time.
    pub scheduled_for: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    /// Re-armed for the following day after firing.
    #[serde(default)]
    pub daily: bool,
}

impl ScheduledReminder {
    fn new(time: ReminderTime, kind: ReminderKind, exercise_name: Option<String>, daily: bool, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            exercise_name,
            scheduled_for: next_fire_time(time, now),
            kind,
            daily,
        }
    }

    pub fn notification(&self) -> Notification {
        match self.kind {
            ReminderKind::Exercise => Notification::exercise_reminder(self.exercise_name.as_deref()),
            ReminderKind::Motivation => Notification::motivation(self.scheduled_for.ordinal() as usize),
        }
    }
}

/// Reminder list persisted under a single key.
pub struct ReminderBook<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> ReminderBook<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<ScheduledReminder> {
        let mut reminders = self.load();
        reminders.sort_by_key(|r| r.scheduled_for);
        reminders
    }

    pub fn schedule_exercise(
        &mut self,
        time: ReminderTime,
        exercise_name: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ScheduledReminder> {
        let reminder = ScheduledReminder::new(
            time,
            ReminderKind::Exercise,
            exercise_name.map(str::to_string),
            false,
            now,
        );
        self.push(reminder)
    }

    /// Replaces every exercise reminder with one daily reminder.
    pub fn schedule_daily(&mut self, time: ReminderTime, now: NaiveDateTime) -> Result<ScheduledReminder> {
        self.clear(Some(ReminderKind::Exercise))?;
        let reminder = ScheduledReminder::new(
            time,
            ReminderKind::Exercise,
            Some(DAILY_REMINDER_NAME.to_string()),
            true,
            now,
        );
        self.push(reminder)
    }

    pub fn schedule_motivation(&mut self, time: ReminderTime, daily: bool, now: NaiveDateTime) -> Result<ScheduledReminder> {
        let reminder = ScheduledReminder::new(time, ReminderKind::Motivation, None, daily, now);
        self.push(reminder)
    }

    /// Drops reminders of `kind` (all when `None`). Returns how many went.
    pub fn clear(&mut self, kind: Option<ReminderKind>) -> Result<usize> {
        let reminders = self.load();
        let before = reminders.len();
        let kept: Vec<_> = reminders
            .into_iter()
            .filter(|r| kind.is_some_and(|k| r.kind != k))
            .collect();
        let removed = before - kept.len();
        self.save(&kept)?;
        debug!(removed, "cleared reminders");
        Ok(removed)
    }

    /// Earliest reminder still on the list, overdue ones included.
    pub fn next_pending(&self) -> Option<ScheduledReminder> {
        self.load().into_iter().min_by_key(|r| r.scheduled_for)
    }

    /// Removes and returns every reminder whose fire time has come. Daily
    /// reminders are put back for their next occurrence.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Result<Vec<ScheduledReminder>> {
        let (mut due, mut pending): (Vec<_>, Vec<_>) =
            self.load().into_iter().partition(|r| r.scheduled_for <= now);

        if due.is_empty() {
            return Ok(due);
        }

        for reminder in due.iter().filter(|r| r.daily) {
            let mut next = reminder.clone();
            next.scheduled_for = next_fire_time(reminder.time, now);
            pending.push(next);
        }

        self.save(&pending)?;
        due.sort_by_key(|r| r.scheduled_for);
        Ok(due)
    }

    fn push(&mut self, reminder: ScheduledReminder) -> Result<ScheduledReminder> {
        let mut reminders = self.load();
        reminders.push(reminder.clone());
        self.save(&reminders)?;
        info!(id = %reminder.id, kind = %reminder.kind, at = %reminder.scheduled_for, "reminder scheduled");
        Ok(reminder)
    }

    fn load(&self) -> Vec<ScheduledReminder> {
        self.store.get_json(REMINDERS_KEY).unwrap_or_default()
    }

    fn save(&mut self, reminders: &[ScheduledReminder]) -> Result<()> {
        self.store.set_json(REMINDERS_KEY, &reminders)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl Notification {
    pub fn exercise_reminder(exercise_name: Option<&str>) -> Self {
        let body = match exercise_name {
            Some(name) => format!("Ready for {}?", name),
            None => "Take a few minutes for your facial routine".to_string(),
        };
        Self {
            title: "🧘 Time for your skincare exercise!".to_string(),
            body,
            tag: "exercise-reminder".to_string(),
        }
    }

    pub fn motivation(seed: usize) -> Self {
        Self {
            title: "Wellness Check-in".to_string(),
            body: MOTIVATION_MESSAGES[seed % MOTIVATION_MESSAGES.len()].to_string(),
            tag: "motivation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Unsupported,
}

/// Device notification capability.
pub trait Notifier {
    fn permission(&self) -> Permission;

    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Prints notifications to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, notification: &Notification) -> Result<()> {
        println!("🔔 {}", notification.title);
        println!("   {}", notification.body);
        Ok(())
    }
}

/// A device without notification support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn notify(&self, _notification: &Notification) -> Result<()> {
        Err(GlowupError::Unsupported(
            "notifications are not available on this device".to_string(),
        ))
    }
}

/// Best-effort delivery: missing capability or permission is a silent no-op.
/// Returns whether the notification was shown.
pub fn deliver<N: Notifier + ?Sized>(notifier: &N, notification: &Notification) -> Result<bool> {
    match notifier.permission() {
        Permission::Granted => match notifier.notify(notification) {
            Ok(()) => Ok(true),
            Err(GlowupError::Unsupported(reason)) => {
                debug!(%reason, "notification skipped");
                Ok(false)
            }
            Err(e) => Err(e),
        },
        permission => {
            debug!(?permission, tag = %notification.tag, "notification skipped");
            Ok(false)
        }
    }
}
