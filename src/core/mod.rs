pub mod catalog;
pub mod counters;
pub mod error;
pub mod favorites;
pub mod preferences;
pub mod profile;
pub mod reminders;
pub mod score;
pub mod storage;
pub mod subscription;
pub mod summary;

pub use catalog::{Catalog, DifficultyLevel, Exercise, ExerciseCatalog, PriceRange, Product, ProductCatalog, ProductFilter};
pub use counters::{CounterKind, CounterStore, DailyCounters};
pub use error::{GlowupError, Result};
pub use favorites::Favorites;
pub use preferences::{PreferenceKey, PreferenceStore, Preferences};
pub use profile::{ProfileOverview, ProfileStore, UserProfile};
pub use reminders::{deliver, ConsoleNotifier, Notifier, NullNotifier, ReminderBook, ReminderKind, ReminderTime};
pub use score::{compute_score, ScoreBand, ScoreBreakdown};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
pub use subscription::{Feature, Subscription, Subscriptions, Tier};
pub use summary::DailySummary;
