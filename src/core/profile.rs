use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use super::counters::CounterStore;
use super::error::{GlowupError, Result};
use super::favorites::Favorites;
use super::preferences::{PreferenceStore, Preferences};
use super::score::{compute_score, ScoreBand};
use super::storage::KeyValueStore;
use super::subscription::{Subscription, Subscriptions, UsageStats};

pub const PROFILE_KEY: &str = "userProfile";

const MIN_AGE: u8 = 13;
const MAX_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SkinType {
    Dry,
    Oily,
    Combination,
    Sensitive,
    #[default]
    Normal,
}

impl SkinType {
    pub const ALL: [SkinType; 5] = [
        SkinType::Dry,
        SkinType::Oily,
        SkinType::Combination,
        SkinType::Sensitive,
        SkinType::Normal,
    ];
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkinType::Dry => "Dry",
            SkinType::Oily => "Oily",
            SkinType::Combination => "Combination",
            SkinType::Sensitive => "Sensitive",
            SkinType::Normal => "Normal",
        };
        f.write_str(label)
    }
}

impl FromStr for SkinType {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        SkinType::ALL
            .into_iter()
            .find(|skin| skin.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GlowupError::invalid_value("skin-type", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default)]
    pub skin_type: SkinType,
    #[serde(default)]
    pub skin_concerns: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Filled in on first load when a stored record lacks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
}

impl UserProfile {
    pub fn new(join_date: NaiveDate) -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            age: None,
            skin_type: SkinType::default(),
            skin_concerns: Vec::new(),
            goals: Vec::new(),
            join_date: Some(join_date),
        }
    }

    pub fn days_active(&self, today: NaiveDate) -> i64 {
        self.join_date
            .map_or(0, |joined| (today - joined).num_days().max(0))
    }

    pub fn set(&mut self, field: ProfileField, raw: &str) -> Result<()> {
        let value = raw.trim();
        match field {
            ProfileField::Name => {
                if value.is_empty() {
                    return Err(GlowupError::invalid_value(field.as_str(), raw));
                }
                self.name = value.to_string();
            }
            ProfileField::Email => {
                if !value.contains('@') || value.starts_with('@') || value.ends_with('@') {
                    return Err(GlowupError::invalid_value(field.as_str(), raw));
                }
                self.email = value.to_string();
            }
            ProfileField::Age => {
                let age: u8 = value
                    .parse()
                    .map_err(|_| GlowupError::invalid_value(field.as_str(), raw))?;
                if !(MIN_AGE..=MAX_AGE).contains(&age) {
                    return Err(GlowupError::invalid_value(field.as_str(), raw));
                }
                self.age = Some(age);
            }
            ProfileField::SkinType => self.skin_type = value.parse()?,
            ProfileField::SkinConcerns => self.skin_concerns = split_list(value),
            ProfileField::Goals => self.goals = split_list(value),
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    Age,
    SkinType,
    SkinConcerns,
    Goals,
}

impl ProfileField {
    pub const ALL: [ProfileField; 6] = [
        ProfileField::Name,
        ProfileField::Email,
        ProfileField::Age,
        ProfileField::SkinType,
        ProfileField::SkinConcerns,
        ProfileField::Goals,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Email => "email",
            ProfileField::Age => "age",
            ProfileField::SkinType => "skin-type",
            ProfileField::SkinConcerns => "skin-concerns",
            ProfileField::Goals => "goals",
        }
    }
}

impl FromStr for ProfileField {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        ProfileField::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized || field.as_str().replace('-', "") == normalized)
            .ok_or_else(|| GlowupError::UnknownProfileField(s.to_string()))
    }
}

pub struct ProfileStore<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> ProfileStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// The stored profile. A record that cannot be read is an error and is
    /// left untouched.
    pub fn stored(&self) -> Result<Option<UserProfile>> {
        match self.store.get(PROFILE_KEY) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| GlowupError::Storage(format!("stored profile is unreadable: {}", e))),
        }
    }

    /// Stored profile, or an empty one joined today. A missing join date is
    /// set to today. Either way the result is persisted so the join date
    /// stays fixed.
    pub fn load_at(&mut self, now: DateTime<Utc>) -> Result<UserProfile> {
        match self.stored()? {
            Some(profile) if profile.join_date.is_some() => Ok(profile),
            Some(mut profile) => {
                profile.join_date = Some(now.date_naive());
                self.save(&profile)?;
                info!(join_date = %now.date_naive(), "recorded join date for existing profile");
                Ok(profile)
            }
            None => {
                let profile = UserProfile::new(now.date_naive());
                self.save(&profile)?;
                info!(join_date = %now.date_naive(), "created new profile");
                Ok(profile)
            }
        }
    }

    pub fn load(&mut self) -> Result<UserProfile> {
        self.load_at(Utc::now())
    }

    pub fn save(&mut self, profile: &UserProfile) -> Result<()> {
        self.store.set_json(PROFILE_KEY, profile)?;
        debug!("profile saved");
        Ok(())
    }

    pub fn set_at(&mut self, field: &str, value: &str, now: DateTime<Utc>) -> Result<UserProfile> {
        let field: ProfileField = field.parse()?;
        let mut profile = self.load_at(now)?;
        profile.set(field, value)?;
        self.save(&profile)?;
        Ok(profile)
    }

    pub fn set(&mut self, field: &str, value: &str) -> Result<UserProfile> {
        self.set_at(field, value, Utc::now())
    }
}

/// Everything the profile screen shows at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileOverview {
    pub profile: UserProfile,
    pub preferences: Preferences,
    pub subscription: Subscription,
    pub active: bool,
    pub usage: UsageStats,
    pub favorites: usize,
    pub score: u8,
    pub band: ScoreBand,
}

impl ProfileOverview {
    pub fn load<S: KeyValueStore>(store: &mut S, now: DateTime<Utc>) -> Result<Self> {
        let profile = ProfileStore::new(store).load_at(now)?;
        let preferences = PreferenceStore::new(store).load();

        let mut subscriptions = Subscriptions::new(store);
        let subscription = subscriptions.current_at(now)?;
        let active = subscription.is_active_at(now);
        let usage = subscriptions.usage_stats_at(now);

        let favorites = Favorites::new(store).get_all().len();
        let score = compute_score(&CounterStore::new(store).snapshot());

        Ok(Self {
            profile,
            preferences,
            subscription,
            active,
            usage,
            favorites,
            score,
            band: ScoreBand::from_score(score),
        })
    }
}
