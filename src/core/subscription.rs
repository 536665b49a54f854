use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::counters::CounterStore;
use super::error::{GlowupError, Result};
use super::profile::{UserProfile, PROFILE_KEY};
use super::storage::KeyValueStore;

pub const SUBSCRIPTION_KEY: &str = "userSubscription";

const DEFAULT_TERM_DAYS: i64 = 30;
const UPGRADE_TERM_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    BasicExercises,
    ProgressTracking,
    AdvancedExercises,
    PersonalizedPlans,
    NutritionPlans,
    PrioritySupport,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::BasicExercises,
        Feature::ProgressTracking,
        Feature::AdvancedExercises,
        Feature::PersonalizedPlans,
        Feature::NutritionPlans,
        Feature::PrioritySupport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::BasicExercises => "basic-exercises",
            Feature::ProgressTracking => "progress-tracking",
            Feature::AdvancedExercises => "advanced-exercises",
            Feature::PersonalizedPlans => "personalized-plans",
            Feature::NutritionPlans => "nutrition-plans",
            Feature::PrioritySupport => "priority-support",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| GlowupError::invalid_value("feature", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Premium,
    Pro,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierInfo {
    pub name: &'static str,
    pub price: f64,
    pub features: Vec<Feature>,
    pub description: &'static str,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Premium, Tier::Pro];

    pub fn table() -> Vec<(Tier, TierInfo)> {
        Tier::ALL.into_iter().map(|tier| (tier, tier.info())).collect()
    }

    /// Fixed tier table.
    pub fn info(self) -> TierInfo {
        use Feature::*;
        match self {
            Tier::Basic => TierInfo {
                name: "Basic",
                price: 0.0,
                features: vec![BasicExercises, ProgressTracking],
                description: "Essential skincare exercises and progress tracking",
            },
            Tier::Premium => TierInfo {
                name: "Premium",
                price: 9.99,
                features: vec![BasicExercises, ProgressTracking, AdvancedExercises, PersonalizedPlans],
                description: "Advanced exercises with personalized skincare plans",
            },
            Tier::Pro => TierInfo {
                name: "Pro",
                price: 19.99,
                features: vec![
                    BasicExercises,
                    ProgressTracking,
                    AdvancedExercises,
                    PersonalizedPlans,
                    NutritionPlans,
                    PrioritySupport,
                ],
                description: "Complete wellness package with nutrition and priority support",
            },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Basic => write!(f, "basic"),
            Tier::Premium => write!(f, "premium"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Tier {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            "pro" => Ok(Tier::Pro),
            _ => Err(GlowupError::InvalidTier(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    #[serde(other)]
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub tier: Tier,
    #[serde(deserialize_with = "known_features")]
    pub features: Vec<Feature>,
    /// Calendar date; the subscription lapses at its UTC midnight.
    pub expires_at: NaiveDate,
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Feature names this build does not know are dropped rather than
/// failing the whole record.
fn known_features<'de, D>(deserializer: D) -> std::result::Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(feature) => Some(feature),
            Err(_) => {
                warn!(feature = %name, "ignoring unknown subscription feature");
                None
            }
        })
        .collect())
}

impl Subscription {
    /// Basic tier, 30 days from `now`.
    pub fn default_at(now: DateTime<Utc>) -> Self {
        Self {
            tier: Tier::Basic,
            features: Tier::Basic.info().features,
            expires_at: (now + Duration::days(DEFAULT_TERM_DAYS)).date_naive(),
            status: SubscriptionStatus::Active,
            upgraded_at: None,
            price: None,
        }
    }

    /// `tier` for one year from `now`, with the tier's full feature set.
    pub fn for_tier(tier: Tier, now: DateTime<Utc>) -> Self {
        let info = tier.info();
        Self {
            tier,
            features: info.features,
            expires_at: (now + Duration::days(UPGRADE_TERM_DAYS)).date_naive(),
            status: SubscriptionStatus::Active,
            upgraded_at: Some(now),
            price: Some(info.price),
        }
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn expires_on(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight))
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_on().is_some_and(|end| end > now)
    }

    /// Whole days until expiry, negative once lapsed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now.date_naive()).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub exercises_completed: usize,
    pub days_active: i64,
    /// Not tracked yet; always zero.
    pub current_streak: u32,
    pub total_sessions: usize,
}

/// Subscription view over a key/value store.
pub struct Subscriptions<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> Subscriptions<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn available_tiers() -> Vec<(Tier, TierInfo)> {
        Tier::table()
    }

    /// The stored subscription. `None` only when there is no record or the
    /// record has no tier; a record that cannot be read is an error and is
    /// left in place.
    pub fn stored(&self) -> Result<Option<Subscription>> {
        let Some(raw) = self.store.get(SUBSCRIPTION_KEY) else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| GlowupError::Storage(format!("stored subscription is not valid JSON: {}", e)))?;
        if value.get("tier").is_none() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| GlowupError::Storage(format!("stored subscription is unreadable: {}", e)))
    }

    /// Stored subscription, or a freshly persisted basic one when none exists.
    pub fn current_at(&mut self, now: DateTime<Utc>) -> Result<Subscription> {
        if let Some(subscription) = self.stored()? {
            return Ok(subscription);
        }

        let subscription = Subscription::default_at(now);
        self.store.set_json(SUBSCRIPTION_KEY, &subscription)?;
        info!(expires_at = %subscription.expires_at, "created default basic subscription");
        Ok(subscription)
    }

    pub fn current(&mut self) -> Result<Subscription> {
        self.current_at(Utc::now())
    }

    /// Replaces the subscription with `tier`. Any known tier is accepted,
    /// including the current or a lower one.
    pub fn upgrade_at(&mut self, tier: &str, now: DateTime<Utc>) -> Result<Subscription> {
        let tier: Tier = tier.parse()?;
        let subscription = Subscription::for_tier(tier, now);
        self.store.set_json(SUBSCRIPTION_KEY, &subscription)?;
        info!(%tier, expires_at = %subscription.expires_at, "subscription changed");
        Ok(subscription)
    }

    pub fn upgrade(&mut self, tier: &str) -> Result<Subscription> {
        self.upgrade_at(tier, Utc::now())
    }

    pub fn has_feature_access_at(&mut self, feature: Feature, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.current_at(now)?.has_feature(feature))
    }

    pub fn has_feature_access(&mut self, feature: Feature) -> Result<bool> {
        self.has_feature_access_at(feature, Utc::now())
    }

    pub fn is_active_at(&mut self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.current_at(now)?.is_active_at(now))
    }

    pub fn is_active(&mut self) -> Result<bool> {
        self.is_active_at(Utc::now())
    }

    pub fn usage_stats_at(&mut self, now: DateTime<Utc>) -> UsageStats {
        let completed = CounterStore::new(&mut *self.store).completed_exercises().len();
        let days_active = self
            .store
            .get_json::<UserProfile>(PROFILE_KEY)
            .map_or(0, |profile| profile.days_active(now.date_naive()));

        UsageStats {
            exercises_completed: completed,
            days_active,
            current_streak: 0,
            total_sessions: completed,
        }
    }
}
