use anyhow::{Context, Result};
use chrono::{Local, Utc};

use glowup::config::Config;
use glowup::core::catalog::ProductFilter;
use glowup::core::counters::{CounterKind, CounterStore};
use glowup::core::favorites::Favorites;
use glowup::core::preferences::{PreferenceKey, PreferenceStore};
use glowup::core::profile::{ProfileOverview, ProfileStore};
use glowup::core::reminders::{ConsoleNotifier, Notifier, NullNotifier, Permission, ReminderBook, ReminderKind, ReminderTime};
use glowup::core::score::{EXERCISE_GOAL, HEALTHY_MEAL_GOAL, WATER_GOAL};
use glowup::core::storage::FileStore;
use glowup::core::subscription::{Feature, Subscriptions};
use glowup::core::summary::DailySummary;
use glowup::scheduler::{self, WatchOptions};

pub use commands::{
    Args, Commands, ExerciseCommands, FavoriteCommands, PrefsCommands, ProductCommands, ProfileCommands,
    RemindCommands, SubscriptionCommands, TrackCommands,
};

mod commands;

/// Configuration plus the open store for one command invocation.
pub struct Session {
    pub config: Config,
    pub store: FileStore,
}

impl Session {
    pub fn open(config: Config) -> Result<Self> {
        let store = FileStore::open(config.storage_file())
            .with_context(|| format!("Failed to open storage at {}", config.storage_file().display()))?;
        Ok(Session { config, store })
    }

    pub fn close(self) -> Result<()> {
        self.store.close().context("Failed to close storage")?;
        Ok(())
    }

    fn notifier(&self) -> Box<dyn Notifier> {
        if self.config.notifications {
            Box::new(ConsoleNotifier)
        } else {
            Box::new(NullNotifier)
        }
    }
}

pub async fn dispatch(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Today => handle_today(session),
        Commands::Track { command } => handle_track(session, command),
        Commands::Exercises { command } => handle_exercises(session, command),
        Commands::Products { command } => handle_products(session, command),
        Commands::Favorites { command } => handle_favorites(session, command),
        Commands::Subscription { command } => handle_subscription(session, command),
        Commands::Prefs { command } => handle_prefs(session, command),
        Commands::Profile { command } => handle_profile(session, command),
        Commands::Remind { command } => handle_remind(session, command).await,
    }
}

pub fn handle_today(session: &mut Session) -> Result<()> {
    let summary = DailySummary::collect(&CounterStore::new(&mut session.store));
    let counters = &summary.counters;

    println!("✨ Wellness Score: {} / 100", summary.score.total);
    println!("   {}", summary.band.message());
    println!();
    println!("💧 Water:          {}/{} glasses", counters.water_glasses, WATER_GOAL);
    println!("🥗 Healthy meals:  {}/{}", counters.healthy_meals, HEALTHY_MEAL_GOAL);
    println!("🍔 Unhealthy meals: {}", counters.unhealthy_meals);
    println!("🧘 Exercises:      {}/{}", summary.exercises_completed, EXERCISE_GOAL);
    println!();
    println!(
        "🏆 Achievements ({}/{}):",
        summary.achievements_completed(),
        summary.achievements.len()
    );
    for achievement in &summary.achievements {
        let mark = if achievement.completed { "✅" } else { "⬜" };
        println!("  {} {} - {}", mark, achievement.title, achievement.description);
    }

    let exercises = session.config.exercises()?;
    let counters = CounterStore::new(&mut session.store);
    println!();
    println!("📋 Today's exercises:");
    for exercise in exercises.featured(3) {
        let mark = if counters.is_completed(exercise.id) { "✅" } else { "  " };
        println!("  {} [{}] {} ({} min)", mark, exercise.id, exercise.name, exercise.duration_minutes);
    }

    Ok(())
}

pub fn handle_track(session: &mut Session, command: TrackCommands) -> Result<()> {
    let mut counters = CounterStore::new(&mut session.store);

    let (kind, undo) = match command {
        TrackCommands::Water { undo } => (CounterKind::Water, undo),
        TrackCommands::Healthy { undo } => (CounterKind::HealthyMeals, undo),
        TrackCommands::Unhealthy { undo } => (CounterKind::UnhealthyMeals, undo),
        TrackCommands::Set { kind, value } => {
            let kind: CounterKind = kind.parse()?;
            counters.set(kind, value)?;
            println!("✅ {} set to {}", kind, value);
            return Ok(());
        }
        TrackCommands::Reset { water, meals } => {
            if water {
                counters.reset_water()?;
                println!("🔄 Water reset");
            } else if meals {
                counters.reset_meals()?;
                println!("🔄 Meals reset");
            } else {
                counters.reset()?;
                println!("🔄 All counters and completed exercises reset");
            }
            return Ok(());
        }
    };

    let value = if undo {
        counters.decrement(kind)?
    } else {
        counters.increment(kind)?
    };
    let score = DailySummary::collect(&counters).score.total;
    println!("✅ {}: {} (score {})", kind, value, score);
    Ok(())
}

pub fn handle_exercises(session: &mut Session, command: ExerciseCommands) -> Result<()> {
    let catalog = session.config.exercises()?;

    match command {
        ExerciseCommands::List { difficulty } => {
            let exercises = match difficulty {
                Some(label) => catalog.get_by_difficulty(&label),
                None => catalog.get_all(),
            };
            if exercises.is_empty() {
                println!("No exercises found.");
                return Ok(());
            }

            let counters = CounterStore::new(&mut session.store);
            println!("🧘 Exercises ({}):", exercises.len());
            for exercise in exercises {
                let mark = if counters.is_completed(exercise.id) { "✅" } else { "  " };
                println!(
                    "  {} [{}] {} - {} min, {}",
                    mark, exercise.id, exercise.name, exercise.duration_minutes, exercise.difficulty
                );
            }
        }
        ExerciseCommands::Show { id } => {
            let exercise = catalog.get_by_id(id)?;
            let completed = CounterStore::new(&mut session.store).is_completed(id);

            println!("🧘 {} ({} min, {})", exercise.name, exercise.duration_minutes, exercise.difficulty);
            if completed {
                println!("   ✅ Completed today");
            }
            if !exercise.benefits.is_empty() {
                println!("Benefits:");
                for benefit in &exercise.benefits {
                    println!("  • {}", benefit);
                }
            }
            if !exercise.steps.is_empty() {
                println!("Steps:");
                for (i, step) in exercise.steps.iter().enumerate() {
                    println!("  {}. {}", i + 1, step);
                }
            }
        }
        ExerciseCommands::Complete { id } => {
            let exercise = catalog.get_by_id(id)?;
            let mut counters = CounterStore::new(&mut session.store);
            if counters.toggle_exercise_completion(id)? {
                println!("✅ {} completed", exercise.name);
            } else {
                println!("↩️  {} marked as not completed", exercise.name);
            }
        }
    }

    Ok(())
}

pub fn handle_products(session: &mut Session, command: ProductCommands) -> Result<()> {
    let catalog = session.config.products()?;
    let favorites = Favorites::new(&mut session.store);

    match command {
        ProductCommands::List { category, price, skin_type, search } => {
            let filter = ProductFilter {
                category,
                price: price.parse()?,
                skin_type,
                query: search,
            };
            let products = catalog.search(&filter);
            if products.is_empty() {
                println!("No products match. Categories: {}", catalog.categories().join(", "));
                return Ok(());
            }

            println!("🛍️  Products ({}):", products.len());
            for product in products {
                let heart = if favorites.is_favorite(product.id) { "❤️ " } else { "  " };
                println!(
                    "  {} [{}] {} by {} - ${:.2} ★{:.1} ({})",
                    heart, product.id, product.name, product.brand, product.price, product.rating, product.category
                );
            }
        }
        ProductCommands::Show { id } => {
            let product = catalog.get_by_id(id)?;
            println!("🛍️  {} by {}", product.name, product.brand);
            println!("   Category: {}", product.category);
            println!("   Price:    ${:.2}", product.price);
            println!("   Rating:   ★{:.1}", product.rating);
            if !product.skin_type.is_empty() {
                let types: Vec<&str> = product.skin_type.iter().map(String::as_str).collect();
                println!("   Suits:    {}", types.join(", "));
            }
            if !product.shop_url.is_empty() {
                println!("   Shop:     {}", product.shop_url);
            }
            if favorites.is_favorite(id) {
                println!("   ❤️  In your favorites");
            }
        }
    }

    Ok(())
}

pub fn handle_favorites(session: &mut Session, command: FavoriteCommands) -> Result<()> {
    let catalog = session.config.products()?;
    let mut favorites = Favorites::new(&mut session.store);

    match command {
        FavoriteCommands::List => {
            let products = favorites.favorite_products(&catalog);
            if products.is_empty() {
                println!("No favorites yet.");
                return Ok(());
            }
            println!("❤️  Favorites ({}):", products.len());
            for product in products {
                println!("  [{}] {} by {} - ${:.2}", product.id, product.name, product.brand, product.price);
            }
        }
        FavoriteCommands::Add { id } => {
            let product = catalog.get_by_id(id)?;
            if favorites.add(id)? {
                println!("❤️  Added {} to favorites", product.name);
            } else {
                println!("{} is already a favorite", product.name);
            }
        }
        FavoriteCommands::Remove { id } => {
            favorites.remove(id)?;
            println!("💔 Removed {} from favorites", id);
        }
    }

    Ok(())
}

pub fn handle_subscription(session: &mut Session, command: SubscriptionCommands) -> Result<()> {
    let now = Utc::now();
    let mut subscriptions = Subscriptions::new(&mut session.store);

    match command {
        SubscriptionCommands::Show => {
            let current = subscriptions.current_at(now)?;
            let info = current.tier.info();
            let status = if current.is_active_at(now) { "active" } else { "inactive" };
            println!("💳 {} plan ({})", info.name, status);
            println!("   Expires: {} ({} days left)", current.expires_at, current.days_remaining(now).max(0));
            println!("   Features:");
            for feature in &current.features {
                println!("     • {}", feature);
            }
        }
        SubscriptionCommands::Tiers => {
            let current = subscriptions.current_at(now)?.tier;
            for (tier, info) in Subscriptions::<FileStore>::available_tiers() {
                let marker = if tier == current { "👉" } else { "  " };
                println!("{} {} (${:.2}/month) - {}", marker, info.name, info.price, info.description);
                let features: Vec<&str> = info.features.iter().map(|f| f.as_str()).collect();
                println!("     {}", features.join(", "));
            }
        }
        SubscriptionCommands::Upgrade { tier } => {
            let upgraded = subscriptions.upgrade_at(&tier, now)?;
            println!("🎉 Now on {} until {}", upgraded.tier.info().name, upgraded.expires_at);
        }
        SubscriptionCommands::Check { feature } => {
            let feature: Feature = feature.parse()?;
            if subscriptions.has_feature_access_at(feature, now)? {
                println!("✅ {} is included in your plan", feature);
            } else {
                println!("🔒 {} requires an upgrade", feature);
            }
        }
        SubscriptionCommands::Usage => {
            let stats = subscriptions.usage_stats_at(now);
            println!("📊 Usage:");
            println!("   Exercises completed: {}", stats.exercises_completed);
            println!("   Days active:         {}", stats.days_active);
            println!("   Current streak:      {}", stats.current_streak);
            println!("   Total sessions:      {}", stats.total_sessions);
        }
    }

    Ok(())
}

pub fn handle_prefs(session: &mut Session, command: PrefsCommands) -> Result<()> {
    match command {
        PrefsCommands::Show => {
            let preferences = PreferenceStore::new(&mut session.store).load();
            println!("⚙️  Preferences:");
            for key in PreferenceKey::ALL {
                println!("   {:<20} {}", key.as_str(), preferences.get(key));
            }
        }
        PrefsCommands::Set { key, value } => {
            let preferences = PreferenceStore::new(&mut session.store).set(&key, &value)?;
            let key: PreferenceKey = key.parse()?;
            println!("✅ {} = {}", key, preferences.get(key));

            // Keep the daily exercise reminder in line with the reminder settings.
            if matches!(key, PreferenceKey::ReminderTime | PreferenceKey::ExerciseReminders) {
                let now = Local::now().naive_local();
                let mut book = ReminderBook::new(&mut session.store);
                match preferences.wants_daily_reminder() {
                    Some(time) => {
                        let reminder = book.schedule_daily(time, now)?;
                        println!("⏰ Daily reminder set for {}", reminder.scheduled_for.format("%Y-%m-%d %H:%M"));
                    }
                    None => {
                        if book.clear(Some(ReminderKind::Exercise))? > 0 {
                            println!("⏰ Daily reminder cleared");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

pub fn handle_profile(session: &mut Session, command: ProfileCommands) -> Result<()> {
    let now = Utc::now();

    match command {
        ProfileCommands::Show => {
            let overview = ProfileOverview::load(&mut session.store, now)?;
            let profile = &overview.profile;
            let name = if profile.name.is_empty() { "(no name set)" } else { profile.name.as_str() };

            println!("👤 {}", name);
            if !profile.email.is_empty() {
                println!("   Email:     {}", profile.email);
            }
            if let Some(age) = profile.age {
                println!("   Age:       {}", age);
            }
            println!("   Skin type: {}", profile.skin_type);
            if !profile.skin_concerns.is_empty() {
                println!("   Concerns:  {}", profile.skin_concerns.join(", "));
            }
            if !profile.goals.is_empty() {
                println!("   Goals:     {}", profile.goals.join(", "));
            }
            if let Some(joined) = profile.join_date {
                println!("   Joined:    {}", joined);
            }
            println!();
            println!("🌱 Your journey:");
            println!("   Days active:    {}", overview.usage.days_active);
            println!("   Exercises done: {}", overview.usage.exercises_completed);
            println!("   Favorites:      {}", overview.favorites);
            println!("   Wellness score: {} ({})", overview.score, overview.band);
            println!();
            let status = if overview.active { "active" } else { "inactive" };
            println!("💳 {} plan ({}), difficulty {}", overview.subscription.tier.info().name, status, overview.preferences.difficulty);
        }
        ProfileCommands::Set { field, value } => {
            ProfileStore::new(&mut session.store).set_at(&field, &value, now)?;
            println!("✅ Profile updated: {}", field);
        }
    }

    Ok(())
}

pub async fn handle_remind(session: &mut Session, command: RemindCommands) -> Result<()> {
    let now = Local::now().naive_local();

    match command {
        RemindCommands::Schedule { time, exercise, daily, motivation } => {
            let time: ReminderTime = time.parse()?;
            let notifier = session.notifier();
            let mut book = ReminderBook::new(&mut session.store);

            let reminder = if motivation {
                book.schedule_motivation(time, daily, now)?
            } else if daily {
                book.schedule_daily(time, now)?
            } else {
                book.schedule_exercise(time, exercise.as_deref(), now)?
            };
            println!("⏰ {} reminder at {}", reminder.kind, reminder.scheduled_for.format("%Y-%m-%d %H:%M"));

            if notifier.permission() != Permission::Granted {
                println!("   Notifications are off; the reminder will fire silently.");
            }
        }
        RemindCommands::List => {
            let reminders = ReminderBook::new(&mut session.store).list();
            if reminders.is_empty() {
                println!("No reminders scheduled.");
                return Ok(());
            }
            println!("⏰ Reminders ({}):", reminders.len());
            for reminder in reminders {
                let repeat = if reminder.daily { " (daily)" } else { "" };
                let label = reminder.exercise_name.as_deref().unwrap_or("");
                println!(
                    "  {} {}{} {}",
                    reminder.scheduled_for.format("%Y-%m-%d %H:%M"),
                    reminder.kind,
                    repeat,
                    label
                );
            }
        }
        RemindCommands::Clear { kind } => {
            let kind = kind.map(|k| k.parse::<ReminderKind>()).transpose()?;
            let removed = ReminderBook::new(&mut session.store).clear(kind)?;
            println!("🗑️  Removed {} reminder(s)", removed);
        }
        RemindCommands::Watch { once } => {
            let notifier = session.notifier();
            if once {
                let shown = scheduler::run_due(&mut session.store, notifier.as_ref(), now)?;
                println!("🔔 Delivered {} reminder(s)", shown);
                return Ok(());
            }

            println!("👀 Watching reminders (Ctrl-C to stop)...");
            let options = WatchOptions {
                stop_when_idle: true,
                ..WatchOptions::default()
            };
            tokio::select! {
                result = scheduler::watch(&mut session.store, notifier.as_ref(), options) => {
                    let shown = result?;
                    println!("🔔 Delivered {} reminder(s), nothing left to wait for", shown);
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("Stopped.");
                }
            }
        }
    }

    Ok(())
}
