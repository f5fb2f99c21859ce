use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Sentinel upper bound meaning "no upper limit" in a price range
pub const PRICE_UNBOUNDED: u32 = 9999;

/// Where a user currently is in the guided search flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    None,
    WaitingPriceSelection,
    WaitingPriceInput,
    PriceSet,
    WaitingTypeSelection,
    WaitingCustomTypeInput,
    TypeSet,
    AreaInput,
}

/// Which search dimension the user picked from the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Area,
    Type,
    Price,
    Popular,
    #[default]
    None,
}

/// How a price range was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Exact,
    Range,
    MinOnly,
    MaxOnly,
    Approximate,
    Preset,
}

/// Normalized per-person budget in TWD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
    pub kind: PriceKind,
}

impl PriceRange {
    pub fn is_unbounded(&self) -> bool {
        self.max >= PRICE_UNBOUNDED
    }

    /// Map the budget onto the places API's 0-4 price level taxonomy.
    ///
    /// Only used to annotate results; the search itself never filters on it.
    pub fn price_levels(&self) -> RangeInclusive<u8> {
        let low = price_level_for(self.min);
        let high = if self.is_unbounded() { 4 } else { price_level_for(self.max) };
        low..=high.max(low)
    }
}

fn price_level_for(amount: u32) -> u8 {
    match amount {
        0..=150 => 1,
        151..=400 => 2,
        401..=1000 => 3,
        _ => 4,
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{} 元以上", self.min)
        } else if self.min == 0 {
            write!(f, "{} 元以下", self.max)
        } else {
            write!(f, "{}-{} 元", self.min, self.max)
        }
    }
}

/// Preset cuisine categories offered by the type menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Japanese,
    Chinese,
    Italian,
    HotPot,
    Barbecue,
    Custom,
}

impl Category {
    pub const PRESETS: [Category; 5] = [
        Category::Japanese,
        Category::Chinese,
        Category::Italian,
        Category::HotPot,
        Category::Barbecue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Japanese => "japanese",
            Category::Chinese => "chinese",
            Category::Italian => "italian",
            Category::HotPot => "hot_pot",
            Category::Barbecue => "barbecue",
            Category::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "japanese" => Some(Category::Japanese),
            "chinese" => Some(Category::Chinese),
            "italian" => Some(Category::Italian),
            "hot_pot" => Some(Category::HotPot),
            "barbecue" => Some(Category::Barbecue),
            "custom" => Some(Category::Custom),
            _ => None,
        }
    }

    /// Search keyword used when a preset button is tapped
    pub fn default_keyword(&self) -> &'static str {
        match self {
            Category::Japanese => "日式料理",
            Category::Chinese => "中式料理",
            Category::Italian => "義式料理",
            Category::HotPot => "火鍋",
            Category::Barbecue => "燒烤",
            Category::Custom => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantType {
    pub category: Category,
    pub keyword: String,
}

impl RestaurantType {
    pub fn custom(keyword: impl Into<String>) -> Self {
        Self {
            category: Category::Custom,
            keyword: keyword.into(),
        }
    }
}

/// City/district pair typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaInput {
    pub city: String,
    pub district: String,
}

/// In-progress search configuration for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(default)]
    pub step: Step,
    #[serde(rename = "searchType", default)]
    pub search_type: SearchType,
    #[serde(rename = "priceRange", default)]
    pub price_range: Option<PriceRange>,
    #[serde(rename = "restaurantType", default)]
    pub restaurant_type: Option<RestaurantType>,
    #[serde(rename = "locationInputArea", default)]
    pub location_input_area: Option<AreaInput>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl UserSession {
    /// Fresh session; the store stamps `expires_at` on write
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            step: Step::None,
            search_type: SearchType::None,
            price_range: None,
            restaurant_type: None,
            location_input_area: None,
            created_at: now,
            expires_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn has_filters(&self) -> bool {
        self.price_range.is_some() || self.restaurant_type.is_some()
    }
}

/// A nearby place normalized from the external search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    #[serde(rename = "ratingCount")]
    pub rating_count: Option<u32>,
    #[serde(rename = "priceLevel")]
    pub price_level: Option<u8>,
    #[serde(rename = "photoReference")]
    pub photo_reference: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    #[serde(flatten)]
    pub place: PlaceCandidate,
    pub score: f64,
    #[serde(rename = "distanceM")]
    pub distance_m: f64,
}

/// Ranking parameters
#[derive(Debug, Clone, Copy)]
pub struct RankingSettings {
    pub radius_m: u32,
    pub min_review_count: u32,
    pub limit: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            radius_m: 1000,
            min_review_count: 5,
            limit: 5,
        }
    }
}
