use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glowup")]
#[command(about = "Daily skincare and wellness tracker")]
#[command(version)]
pub struct Args {
    /// Data directory (defaults to $GLOWUP_DATA_DIR, then the user config dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's wellness score and progress
    Today,
    /// Record water and meals
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },
    /// Browse facial exercises
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Browse skincare products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage favorite products
    Favorites {
        #[command(subcommand)]
        command: FavoriteCommands,
    },
    /// Subscription tier and feature access
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },
    /// View or change preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Schedule and deliver reminders
    Remind {
        #[command(subcommand)]
        command: RemindCommands,
    },
}

#[derive(Subcommand)]
pub enum TrackCommands {
    /// Add a glass of water
    Water {
        /// Remove one instead
        #[arg(long)]
        undo: bool,
    },
    /// Add a healthy meal
    Healthy {
        #[arg(long)]
        undo: bool,
    },
    /// Add an unhealthy meal
    Unhealthy {
        #[arg(long)]
        undo: bool,
    },
    /// Set a counter directly (water, healthy, unhealthy)
    Set {
        kind: String,
        value: u32,
    },
    /// Reset counters and completed exercises
    Reset {
        /// Only reset water
        #[arg(long, conflicts_with = "meals")]
        water: bool,
        /// Only reset meals
        #[arg(long)]
        meals: bool,
    },
}

#[derive(Subcommand)]
pub enum ExerciseCommands {
    /// List exercises
    List {
        /// beginner, intermediate, advanced (or easy, medium, hard)
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Show an exercise with its steps
    Show {
        id: u32,
    },
    /// Toggle today's completion of an exercise
    Complete {
        id: u32,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products, optionally filtered
    List {
        #[arg(long)]
        category: Option<String>,
        /// Price range: all, 10-25, 50-
        #[arg(long, default_value = "all")]
        price: String,
        #[arg(long)]
        skin_type: Option<String>,
        /// Match name or brand
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a product
    Show {
        id: u32,
    },
}

#[derive(Subcommand)]
pub enum FavoriteCommands {
    /// List favorite products
    List,
    /// Add a product to favorites
    Add {
        id: u32,
    },
    /// Remove a product from favorites
    Remove {
        id: u32,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// Show the current subscription
    Show,
    /// List available tiers
    Tiers,
    /// Switch to another tier (basic, premium, pro)
    Upgrade {
        tier: String,
    },
    /// Check access to a feature
    Check {
        feature: String,
    },
    /// Show usage statistics
    Usage,
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show all preferences
    Show,
    /// Set a preference
    Set {
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile overview
    Show,
    /// Set a profile field (name, email, age, skin-type, skin-concerns, goals)
    Set {
        field: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum RemindCommands {
    /// Schedule a reminder at HH:MM
    Schedule {
        time: String,
        /// Exercise to mention in the reminder
        #[arg(long)]
        exercise: Option<String>,
        /// Repeat every day (replaces other exercise reminders)
        #[arg(long)]
        daily: bool,
        /// Send a motivation message instead of an exercise reminder
        #[arg(long, conflicts_with = "exercise")]
        motivation: bool,
    },
    /// List scheduled reminders
    List,
    /// Remove scheduled reminders
    Clear {
        /// exercise or motivation (default: all)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Wait for reminders and deliver them
    Watch {
        /// Deliver what is due now and exit
        #[arg(long)]
        once: bool,
    },
}
