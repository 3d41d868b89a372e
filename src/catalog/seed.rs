// Demo data for a fresh install, mirroring a typical flyer week.
use crate::catalog::sqlite::SqliteCatalog;
use crate::model::{
    CatalogError, Category, PriceAlert, PriceRecord, Retailer, ShoppingList, ShoppingListItem,
};
use crate::utils::{generate_id, round_to_cents};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const DEFAULT_RETAILERS: [(&str, &str, &str); 8] = [
    (
        "Aldi Nord",
        "https://www.aldi-nord.de",
        "https://www.aldi-nord.de/angebote.html",
    ),
    (
        "Aldi Süd",
        "https://www.aldi-sued.de",
        "https://www.aldi-sued.de/de/angebote.html",
    ),
    (
        "REWE",
        "https://www.rewe.de",
        "https://www.rewe.de/angebote/nationale-angebote/",
    ),
    (
        "Edeka",
        "https://www.edeka.de",
        "https://www.edeka.de/eh/angebote.jsp",
    ),
    (
        "Lidl",
        "https://www.lidl.de",
        "https://www.lidl.de/c/billiger-montag/a10006065",
    ),
    (
        "Kaufland",
        "https://www.kaufland.de",
        "https://www.kaufland.de/angebote/aktuelle-woche.html",
    ),
    ("Penny", "https://www.penny.de", "https://www.penny.de/angebote"),
    (
        "Netto",
        "https://www.netto-online.de",
        "https://www.netto-online.de/angebote",
    ),
];

const THIS_WEEK_OFFERS: [(&str, Category, f64); 23] = [
    ("Bio Äpfel", Category::ObstGemuese, 1.99),
    ("Bananen", Category::ObstGemuese, 1.49),
    ("Tomaten", Category::ObstGemuese, 2.49),
    ("Hackfleisch gemischt 500g", Category::FleischWurst, 4.99),
    ("Hähnchenbrust 400g", Category::FleischWurst, 5.99),
    ("Wurst Aufschnitt", Category::FleischWurst, 2.29),
    ("Vollmilch 1L", Category::Milchprodukte, 1.19),
    ("Butter 250g", Category::Milchprodukte, 2.49),
    ("Gouda Käse", Category::Milchprodukte, 2.99),
    ("Joghurt Natur", Category::Milchprodukte, 0.99),
    ("Vollkornbrot", Category::BrotBackwaren, 1.89),
    ("Brötchen 6er", Category::BrotBackwaren, 1.29),
    ("Cola 1.5L", Category::Getraenke, 1.29),
    ("Mineralwasser 6x1.5L", Category::Getraenke, 2.99),
    ("Orangensaft 1L", Category::Getraenke, 1.99),
    ("Schokolade 100g", Category::SuessigkeitenSnacks, 1.29),
    ("Chips 175g", Category::SuessigkeitenSnacks, 1.99),
    ("Tiefkühl Pizza", Category::Tiefkuehl, 2.49),
    ("Tiefkühl Gemüse 450g", Category::Tiefkuehl, 1.79),
    ("Waschmittel 1L", Category::Haushalt, 4.99),
    ("Toilettenpapier 8er", Category::Haushalt, 3.49),
    ("Shampoo 250ml", Category::Drogerie, 2.49),
    ("Zahnpasta", Category::Drogerie, 1.29),
];

const NEXT_WEEK_OFFERS: [(&str, Category, f64); 5] = [
    ("Erdbeeren 500g", Category::ObstGemuese, 2.99),
    ("Lachs Filet 200g", Category::FleischWurst, 6.99),
    ("Mozzarella", Category::Milchprodukte, 1.49),
    ("Croissants 4er", Category::BrotBackwaren, 1.99),
    ("Bier 6x0.5L", Category::Getraenke, 4.99),
];

/// Populates an empty catalog with the default retailer set, one flyer
/// week of demo offers per retailer, and a starter list and alert.
/// Returns false without touching anything when retailers already exist.
pub fn seed_if_empty(catalog: &SqliteCatalog) -> Result<bool, CatalogError> {
    if !catalog.list_retailers()?.is_empty() {
        return Ok(false);
    }

    let mut rng = rand::rng();
    let now = Utc::now();

    for (name, website_url, prospekt_url) in DEFAULT_RETAILERS {
        let retailer = Retailer {
            id: generate_id(),
            name: name.to_string(),
            logo_url: None,
            website_url: website_url.to_string(),
            prospekt_url: prospekt_url.to_string(),
            is_active: true,
            created_at: now,
        };
        catalog.save_retailer(&retailer)?;
        seed_offers_for_retailer(catalog, &retailer, &mut rng, now)?;
    }

    let list = ShoppingList {
        id: generate_id(),
        name: "Wocheneinkauf".to_string(),
        plz: None,
        created_at: now,
        updated_at: now,
    };
    catalog.save_list(&list)?;
    for (product_name, quantity) in [("Butter", 1), ("Vollmilch", 2), ("Vollkornbrot", 1)] {
        catalog.add_list_item(
            &list.id,
            &ShoppingListItem {
                product_name: product_name.to_string(),
                quantity,
                checked: false,
            },
        )?;
    }

    catalog.save_alert(&PriceAlert {
        id: generate_id(),
        product_name: "Butter".to_string(),
        target_price: 2.3,
        current_price: None,
        retailer_ids: Vec::new(),
        is_active: true,
        triggered: false,
        created_at: now,
    })?;

    Ok(true)
}

/// One flyer week per retailer: the shared product set with a per-store
/// price spread, plus a handful of offers already announced for next week.
fn seed_offers_for_retailer(
    catalog: &SqliteCatalog,
    retailer: &Retailer,
    rng: &mut impl Rng,
    now: DateTime<Utc>,
) -> Result<(), CatalogError> {
    catalog.delete_records_for_retailer(&retailer.id)?;

    let week = Duration::days(7);
    for (name, category, base_price) in THIS_WEEK_OFFERS {
        let record = demo_record(retailer, name, category, base_price, now, now + week, rng);
        catalog.save_record(&record)?;
    }
    for (name, category, base_price) in NEXT_WEEK_OFFERS {
        let record = demo_record(
            retailer,
            name,
            category,
            base_price,
            now + week,
            now + week + week,
            rng,
        );
        catalog.save_record(&record)?;
    }

    Ok(())
}

fn demo_record(
    retailer: &Retailer,
    name: &str,
    category: Category,
    base_price: f64,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    rng: &mut impl Rng,
) -> PriceRecord {
    let price = round_to_cents(base_price * rng.random_range(0.85..1.15));
    let original_price = if rng.random_bool(0.5) {
        Some(round_to_cents(price * rng.random_range(1.1..1.3)))
    } else {
        None
    };

    PriceRecord {
        id: generate_id(),
        name: name.to_string(),
        price,
        original_price,
        unit: None,
        price_per_unit: None,
        category,
        retailer_id: retailer.id.clone(),
        retailer_name: retailer.name.clone(),
        prospekt_url: Some(retailer.prospekt_url.clone()),
        valid_from: Some(valid_from),
        valid_until: Some(valid_until),
        extracted_at: Utc::now(),
    }
}
