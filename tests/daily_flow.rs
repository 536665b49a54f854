use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use glowup::config::Config;
use glowup::core::catalog::ProductFilter;
use glowup::core::counters::{CounterKind, CounterStore};
use glowup::core::favorites::Favorites;
use glowup::core::preferences::PreferenceStore;
use glowup::core::profile::ProfileOverview;
use glowup::core::reminders::{NullNotifier, ReminderBook, ReminderTime};
use glowup::core::storage::FileStore;
use glowup::core::subscription::{Feature, Subscriptions, Tier};
use glowup::core::summary::DailySummary;
use glowup::core::GlowupError;
use glowup::scheduler;

fn open(dir: &TempDir) -> (Config, FileStore) {
    let config = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();
    let store = FileStore::open(config.storage_file()).unwrap();
    (config, store)
}

#[test]
fn test_day_of_tracking_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let (config, mut store) = open(&dir);
        let exercises = config.exercises().unwrap();
        let first = exercises.featured(1)[0].id;

        let mut counters = CounterStore::new(&mut store);
        for _ in 0..4 {
            counters.increment(CounterKind::Water).unwrap();
        }
        counters.increment(CounterKind::HealthyMeals).unwrap();
        counters.increment(CounterKind::UnhealthyMeals).unwrap();
        assert!(counters.toggle_exercise_completion(first).unwrap());

        store.close().unwrap();
    }

    let (_, mut store) = open(&dir);
    let summary = DailySummary::collect(&CounterStore::new(&mut store));
    assert_eq!(summary.counters.water_glasses, 4);
    assert_eq!(summary.counters.healthy_meals, 1);
    assert_eq!(summary.counters.unhealthy_meals, 1);
    assert_eq!(summary.exercises_completed, 1);
    // 15 water + (8.33 - 5) meals + 15 exercise
    assert_eq!(summary.score.total, 33);
}

#[test]
fn test_browse_favorite_and_upgrade() {
    let dir = TempDir::new().unwrap();
    let (config, mut store) = open(&dir);
    let products = config.products().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();

    let serums = products.search(&ProductFilter {
        category: Some("serum".to_string()),
        ..ProductFilter::default()
    });
    assert!(!serums.is_empty());

    let mut favorites = Favorites::new(&mut store);
    for product in &serums {
        favorites.add(product.id).unwrap();
    }
    assert_eq!(favorites.favorite_products(&products).len(), serums.len());

    let mut subscriptions = Subscriptions::new(&mut store);
    assert!(!subscriptions.has_feature_access_at(Feature::PersonalizedPlans, now).unwrap());
    assert!(matches!(
        subscriptions.upgrade_at("gold", now),
        Err(GlowupError::InvalidTier(_))
    ));
    let upgraded = subscriptions.upgrade_at("premium", now).unwrap();
    assert_eq!(upgraded.tier, Tier::Premium);
    assert_eq!(upgraded.expires_at, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    assert!(subscriptions.has_feature_access_at(Feature::PersonalizedPlans, now).unwrap());

    PreferenceStore::new(&mut store).set("difficulty", "beginner").unwrap();

    let overview = ProfileOverview::load(&mut store, now).unwrap();
    assert_eq!(overview.favorites, serums.len());
    assert_eq!(overview.subscription.tier, Tier::Premium);
    assert_eq!(overview.preferences.difficulty.to_string(), "beginner");
    assert!(overview.active);
}

#[test]
fn test_reminders_persist_and_fire() {
    let dir = TempDir::new().unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();

    {
        let (_, mut store) = open(&dir);
        ReminderBook::new(&mut store)
            .schedule_daily(ReminderTime::new(9, 0).unwrap(), start)
            .unwrap();
        store.close().unwrap();
    }

    let (_, mut store) = open(&dir);
    let pending = ReminderBook::new(&mut store).list();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].scheduled_for, start + chrono::Duration::hours(23));

    // the notifier has no capability; the reminder is still consumed and re-armed
    let fired_at = start + chrono::Duration::days(1);
    assert_eq!(scheduler::run_due(&mut store, &NullNotifier, fired_at).unwrap(), 0);
    let rearmed = ReminderBook::new(&mut store).list();
    assert_eq!(rearmed.len(), 1);
    assert_eq!(rearmed[0].scheduled_for.date(), NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
}
