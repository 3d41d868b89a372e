// Core structs: PriceRecord, Retailer, shopping lists, alerts, engine results
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Product categories as they appear in the flyers. Anything a retailer
/// labels outside this set lands in `Sonstiges`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Obst & Gemüse")]
    ObstGemuese,
    #[serde(rename = "Fleisch & Wurst")]
    FleischWurst,
    #[serde(rename = "Milchprodukte")]
    Milchprodukte,
    #[serde(rename = "Brot & Backwaren")]
    BrotBackwaren,
    #[serde(rename = "Getränke")]
    Getraenke,
    #[serde(rename = "Süßigkeiten & Snacks")]
    SuessigkeitenSnacks,
    #[serde(rename = "Tiefkühl")]
    Tiefkuehl,
    #[serde(rename = "Haushalt")]
    Haushalt,
    #[serde(rename = "Drogerie")]
    Drogerie,
    #[serde(rename = "Sonstiges")]
    Sonstiges,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::ObstGemuese,
        Category::FleischWurst,
        Category::Milchprodukte,
        Category::BrotBackwaren,
        Category::Getraenke,
        Category::SuessigkeitenSnacks,
        Category::Tiefkuehl,
        Category::Haushalt,
        Category::Drogerie,
        Category::Sonstiges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ObstGemuese => "Obst & Gemüse",
            Category::FleischWurst => "Fleisch & Wurst",
            Category::Milchprodukte => "Milchprodukte",
            Category::BrotBackwaren => "Brot & Backwaren",
            Category::Getraenke => "Getränke",
            Category::SuessigkeitenSnacks => "Süßigkeiten & Snacks",
            Category::Tiefkuehl => "Tiefkühl",
            Category::Haushalt => "Haushalt",
            Category::Drogerie => "Drogerie",
            Category::Sonstiges => "Sonstiges",
        }
    }

    /// Unknown labels fall back to `Sonstiges` rather than failing.
    pub fn parse(label: &str) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or(Category::Sonstiges)
    }
}

/// One retailer's current offer for one product, as extracted from a flyer.
/// Engine code treats these as immutable snapshots and never writes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<String>,
    pub category: Category,
    pub retailer_id: String,
    pub retailer_name: String,
    pub prospekt_url: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub extracted_at: DateTime<Utc>,
}

impl PriceRecord {
    /// A record is current when `now` falls inside its validity window.
    /// An absent bound is open-ended.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }

    /// Regular (non-sale) price: the crossed-out price where the flyer
    /// shows one, the sale price itself otherwise.
    pub fn list_price(&self) -> f64 {
        self.original_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retailer {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub website_url: String,
    pub prospekt_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    pub plz: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `checked` is user bookkeeping only; the optimizer ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub product_name: String,
    pub quantity: u32,
    pub checked: bool,
}

/// A watch on a product name. `retailer_ids` restricts the alert to a
/// subset of retailers; empty means all active ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: String,
    pub product_name: String,
    pub target_price: f64,
    pub current_price: Option<f64>,
    pub retailer_ids: Vec<String>,
    pub is_active: bool,
    pub triggered: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of comparing one product across retailers.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub results: Vec<PriceRecord>,
    pub cheapest: Option<PriceRecord>,
}

/// One line of an optimized plan. Price fields are absent for items no
/// retailer currently offers.
#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    pub product_name: String,
    pub quantity: u32,
    pub price: Option<f64>,
    pub total_price: Option<f64>,
    pub original_price: Option<f64>,
}

/// Items assigned to one retailer. `retailer_id` is `None` for the
/// "Nicht gefunden" group that collects unmatched items.
#[derive(Debug, Clone, Serialize)]
pub struct RetailerGroup {
    pub retailer_id: Option<String>,
    pub retailer_name: String,
    pub items: Vec<PlanItem>,
    pub subtotal: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizedPlan {
    pub retailer_groups: Vec<RetailerGroup>,
    pub total_cost: f64,
    pub potential_savings: f64,
    pub retailer_count: usize,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
    #[error("not found")]
    NotFound,
}

#[derive(Debug, Error, PartialEq)]
pub enum OptimizeError {
    #[error("invalid quantity for '{product_name}': must be at least 1")]
    InvalidQuantity { product_name: String },
}
