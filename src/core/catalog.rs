use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::error::{GlowupError, Result};

const BUNDLED_EXERCISES: &str = include_str!("../../data/exercises.json");
const BUNDLED_PRODUCTS: &str = include_str!("../../data/products.json");

/// Stored difficulty label of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Accepts both the user-facing levels and the stored labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Some(Difficulty::Easy),
            "intermediate" | "medium" => Some(Difficulty::Medium),
            "advanced" | "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// The three-tier level users pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    pub fn difficulty(self) -> Difficulty {
        match self {
            DifficultyLevel::Beginner => Difficulty::Easy,
            DifficultyLevel::Intermediate => Difficulty::Medium,
            DifficultyLevel::Advanced => Difficulty::Hard,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            _ => Err(GlowupError::invalid_value("difficulty", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(alias = "Id")]
    pub id: u32,
    pub name: String,
    #[serde(rename = "duration", alias = "durationMinutes")]
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "Id")]
    pub id: u32,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub rating: f32,
    #[serde(default)]
    pub skin_type: BTreeSet<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub shop_url: String,
}

impl Product {
    pub fn suits(&self, skin_type: &str) -> bool {
        self.skin_type.iter().any(|t| t.eq_ignore_ascii_case(skin_type))
    }
}

/// A record that can live in a [`Catalog`].
pub trait CatalogItem: Clone + DeserializeOwned {
    /// Human-readable kind, used in `NotFound` errors.
    const KIND: &'static str;

    fn id(&self) -> u32;

    fn set_id(&mut self, id: u32);

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl CatalogItem for Exercise {
    const KIND: &'static str = "Exercise";

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }
}

impl CatalogItem for Product {
    const KIND: &'static str = "Product";

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(GlowupError::Parse(format!(
                "product {} has rating {} outside 0-5",
                self.id, self.rating
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(GlowupError::Parse(format!(
                "product {} has invalid price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// Read-mostly in-memory collection. Reads hand out copies; mutations last
/// only as long as the catalog value does.
#[derive(Debug, Clone)]
pub struct Catalog<T: CatalogItem> {
    items: Vec<T>,
}

pub type ExerciseCatalog = Catalog<Exercise>;
pub type ProductCatalog = Catalog<Product>;

impl<T: CatalogItem> Catalog<T> {
    /// Validates every item and rejects duplicate ids.
    pub fn new(items: Vec<T>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(GlowupError::Parse(format!(
                    "duplicate {} id {}",
                    T::KIND.to_lowercase(),
                    item.id()
                )));
            }
            item.validate()?;
        }
        Ok(Self { items })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<T> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), items = catalog.len(), kind = T::KIND, "loaded catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_all(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn get_by_id(&self, id: u32) -> Result<T> {
        self.items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or(GlowupError::NotFound { kind: T::KIND, id })
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(item)).cloned().collect()
    }

    /// Appends `item` under the next free id and returns the stored copy.
    pub fn create(&mut self, mut item: T) -> Result<T> {
        let id = self
            .items
            .iter()
            .map(|i| i.id())
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| GlowupError::Parse(format!("no {} id left after {}", T::KIND.to_lowercase(), u32::MAX)))?;
        item.set_id(id);
        item.validate()?;
        self.items.push(item.clone());
        debug!(id, kind = T::KIND, "catalog item created");
        Ok(item)
    }

    /// Applies `change` to the item; its id cannot be changed.
    pub fn update<F>(&mut self, id: u32, change: F) -> Result<T>
    where
        F: FnOnce(&mut T),
    {
        let index = self.position(id)?;
        let mut updated = self.items[index].clone();
        change(&mut updated);
        updated.set_id(id);
        updated.validate()?;
        self.items[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete(&mut self, id: u32) -> Result<T> {
        let index = self.position(id)?;
        Ok(self.items.remove(index))
    }

    fn position(&self, id: u32) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or(GlowupError::NotFound { kind: T::KIND, id })
    }
}

impl Catalog<Exercise> {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_EXERCISES)
    }

    /// Unknown labels match nothing.
    pub fn get_by_difficulty(&self, label: &str) -> Vec<Exercise> {
        match Difficulty::from_label(label) {
            Some(difficulty) => self.filter(|e| e.difficulty == difficulty),
            None => Vec::new(),
        }
    }

    pub fn featured(&self, count: usize) -> Vec<Exercise> {
        self.items.iter().take(count).cloned().collect()
    }
}

/// Inclusive price bounds; an absent `max` is open ended.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && self.max.map_or(true, |max| price <= max)
    }
}

impl FromStr for PriceRange {
    type Err = GlowupError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PriceRange::default());
        }

        let invalid = || GlowupError::invalid_value("price range", s);
        let (min, max) = match s.split_once('-') {
            Some((min, max)) => (min.trim(), max.trim()),
            None => (s, ""),
        };
        let min: f64 = min.parse().map_err(|_| invalid())?;
        let max = if max.is_empty() {
            None
        } else {
            Some(max.parse::<f64>().map_err(|_| invalid())?)
        };

        if min < 0.0 || max.is_some_and(|max| max < min) {
            return Err(invalid());
        }
        Ok(PriceRange { min, max })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// `None` or "all" matches every category.
    pub category: Option<String>,
    pub price: PriceRange,
    pub skin_type: Option<String>,
    /// Case-insensitive substring of name or brand.
    pub query: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let category = self.category.as_deref().map_or(true, |c| {
            c.eq_ignore_ascii_case("all") || product.category.eq_ignore_ascii_case(c)
        });
        let skin = self.skin_type.as_deref().map_or(true, |t| product.suits(t));
        let query = self.query.as_deref().map_or(true, |q| {
            let q = q.to_lowercase();
            product.name.to_lowercase().contains(&q) || product.brand.to_lowercase().contains(&q)
        });

        category && skin && query && self.price.contains(product.price)
    }
}

impl Catalog<Product> {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PRODUCTS)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|p| seen.insert(p.category.clone()))
            .map(|p| p.category.clone())
            .collect()
    }

    pub fn search(&self, filter: &ProductFilter) -> Vec<Product> {
        self.filter(|p| filter.matches(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: u32, difficulty: Difficulty) -> Exercise {
        Exercise {
            id,
            name: format!("Exercise {}", id),
            duration_minutes: 5,
            difficulty,
            benefits: vec![],
            steps: vec![],
            image_url: String::new(),
        }
    }

    #[test]
    fn test_bundled_catalogs_load() {
        let exercises = ExerciseCatalog::bundled().unwrap();
        let products = ProductCatalog::bundled().unwrap();
        assert!(!exercises.is_empty());
        assert!(!products.is_empty());
    }

    #[test]
    fn test_get_by_id_not_found() {
        let catalog = ExerciseCatalog::bundled().unwrap();
        match catalog.get_by_id(42) {
            Err(GlowupError::NotFound { kind, id }) => {
                assert_eq!(kind, "Exercise");
                assert_eq!(id, 42);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_get_all_returns_copies() {
        let catalog = ExerciseCatalog::new(vec![exercise(1, Difficulty::Easy)]).unwrap();
        let mut all = catalog.get_all();
        all[0].name = "Changed".to_string();
        assert_eq!(catalog.get_by_id(1).unwrap().name, "Exercise 1");
    }

    #[test]
    fn test_get_by_difficulty_maps_levels() {
        let catalog = ExerciseCatalog::new(vec![
            exercise(1, Difficulty::Easy),
            exercise(2, Difficulty::Medium),
            exercise(3, Difficulty::Hard),
            exercise(4, Difficulty::Easy),
        ])
        .unwrap();

        let ids = |list: Vec<Exercise>| list.into_iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(catalog.get_by_difficulty("beginner")), vec![1, 4]);
        assert_eq!(ids(catalog.get_by_difficulty("Intermediate")), vec![2]);
        assert_eq!(ids(catalog.get_by_difficulty("advanced")), vec![3]);
        assert_eq!(ids(catalog.get_by_difficulty("hard")), vec![3]);
        assert!(catalog.get_by_difficulty("expert").is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = ExerciseCatalog::new(vec![exercise(1, Difficulty::Easy), exercise(1, Difficulty::Hard)]);
        assert!(matches!(result, Err(GlowupError::Parse(_))));
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let json = r#"[{"id":1,"name":"X","brand":"B","category":"Serum","price":10,"rating":7.5}]"#;
        assert!(matches!(ProductCatalog::from_json(json), Err(GlowupError::Parse(_))));
    }

    #[test]
    fn test_accepts_capitalised_id() {
        let json = r#"[{"Id":9,"name":"X","duration":3,"difficulty":"easy"}]"#;
        let catalog = ExerciseCatalog::from_json(json).unwrap();
        assert_eq!(catalog.get_by_id(9).unwrap().duration_minutes, 3);
    }

    #[test]
    fn test_create_update_delete() {
        let mut catalog = ExerciseCatalog::new(vec![exercise(1, Difficulty::Easy), exercise(5, Difficulty::Hard)]).unwrap();

        let created = catalog.create(exercise(0, Difficulty::Medium)).unwrap();
        assert_eq!(created.id, 6);

        let updated = catalog
            .update(6, |e| {
                e.name = "Renamed".to_string();
                e.id = 99;
            })
            .unwrap();
        assert_eq!(updated.id, 6);
        assert_eq!(catalog.get_by_id(6).unwrap().name, "Renamed");

        let deleted = catalog.delete(1).unwrap();
        assert_eq!(deleted.id, 1);
        assert_eq!(catalog.len(), 2);

        assert!(matches!(catalog.delete(1), Err(GlowupError::NotFound { .. })));
        assert!(matches!(catalog.update(1, |_| {}), Err(GlowupError::NotFound { .. })));
    }

    #[test]
    fn test_create_after_max_id_fails() {
        let mut catalog = Catalog::new(vec![exercise(u32::MAX, Difficulty::Hard)]).unwrap();
        assert!(matches!(
            catalog.create(exercise(0, Difficulty::Easy)),
            Err(GlowupError::Parse(_))
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_create_in_empty_catalog_starts_at_one() {
        let mut catalog = ExerciseCatalog::new(vec![]).unwrap();
        assert_eq!(catalog.create(exercise(0, Difficulty::Easy)).unwrap().id, 1);
    }

    #[test]
    fn test_price_range_parse() {
        assert_eq!("all".parse::<PriceRange>().unwrap(), PriceRange::default());
        assert_eq!(
            "25-50".parse::<PriceRange>().unwrap(),
            PriceRange { min: 25.0, max: Some(50.0) }
        );
        assert_eq!("100-".parse::<PriceRange>().unwrap(), PriceRange { min: 100.0, max: None });
        assert!("50-25".parse::<PriceRange>().is_err());
        assert!("cheap".parse::<PriceRange>().is_err());
    }

    #[test]
    fn test_product_filter() {
        let catalog = ProductCatalog::bundled().unwrap();

        let serums = catalog.search(&ProductFilter {
            category: Some("serum".to_string()),
            ..Default::default()
        });
        assert!(serums.iter().all(|p| p.category == "Serum"));
        assert!(!serums.is_empty());

        let under_25 = catalog.search(&ProductFilter {
            price: "0-25".parse().unwrap(),
            ..Default::default()
        });
        assert!(under_25.iter().all(|p| p.price <= 25.0));

        let sensitive = catalog.search(&ProductFilter {
            skin_type: Some("sensitive".to_string()),
            ..Default::default()
        });
        assert!(sensitive.iter().all(|p| p.suits("Sensitive")));

        let lumiere = catalog.search(&ProductFilter {
            query: Some("lumi".to_string()),
            ..Default::default()
        });
        assert!(lumiere.iter().all(|p| p.brand == "Lumiere"));
        assert_eq!(lumiere.len(), 2);

        let everything = catalog.search(&ProductFilter {
            category: Some("all".to_string()),
            ..Default::default()
        });
        assert_eq!(everything.len(), catalog.len());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let catalog = ProductCatalog::bundled().unwrap();
        let categories = catalog.categories();
        assert_eq!(categories[0], "Serum");
        assert_eq!(categories.iter().filter(|c| *c == "Serum").count(), 1);
    }
}
