mod catalog;
mod config;
mod engine;
mod matcher;
mod model;
mod normalizer;
mod utils;

use catalog::seed::seed_if_empty;
use catalog::{RecordFilters, SqliteCatalog};
use chrono::{DateTime, Utc};
use config::{AppConfig, load_config};
use engine::{alerts, comparison, optimizer};
use futures::future::join_all;
use matcher::find_matches;
use model::{PriceRecord, ShoppingList};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            warn!("Config load error: {}. Falling back to defaults.", e);
            Arc::new(AppConfig::default())
        }
    };

    // Initialize the catalog (SQLite) with async access (wrapped in a Mutex)
    let catalog_store = match SqliteCatalog::new(&config.db_path) {
        Ok(c) => Arc::new(Mutex::new(c)),
        Err(e) => {
            error!("Failed to initialize catalog: {:?}", e);
            return;
        }
    };

    // A fresh install gets the default retailers plus one demo flyer week
    {
        let guard = catalog_store.lock().await;
        match seed_if_empty(&guard) {
            Ok(true) => info!("Seeded default retailers and demo offers"),
            Ok(false) => {}
            Err(e) => warn!("Seeding failed: {:?}", e),
        }
    }

    if let Some(plz) = &config.settings.plz {
        info!("Flyer region: {}", plz);
    }

    info!("🚀 ProspektScout started!");

    // Main processing loop
    loop {
        run_cycle(catalog_store.clone(), config.clone()).await;

        info!(
            "Waiting for timer ({}s) or shutdown...",
            config.check_interval_seconds
        );
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested.");
                break;
            }
        }
    }
}

/// One pass over a consistent catalog snapshot: re-evaluates all active
/// price alerts, then recomputes the plan for every stored shopping list.
/// The snapshot is taken once, so a flyer refresh running concurrently
/// can never be observed half-applied.
async fn run_cycle(catalog_store: Arc<Mutex<SqliteCatalog>>, config: Arc<AppConfig>) {
    let now = Utc::now();

    let (records, active_ids) = {
        let guard = catalog_store.lock().await;
        let records = match guard.list_active_records(&RecordFilters::default(), now) {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to read catalog: {:?}", e);
                return;
            }
        };
        let active_ids = match guard.list_active_retailer_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to read retailers: {:?}", e);
                return;
            }
        };
        (records, active_ids)
    };

    let scope = config.settings.restrict(active_ids);
    info!(
        "Catalog snapshot: {} current offers from {} retailers",
        records.len(),
        scope.len()
    );

    check_alerts(&catalog_store, &records, &scope, now).await;

    let lists = match catalog_store.lock().await.list_shopping_lists() {
        Ok(lists) => lists,
        Err(e) => {
            warn!("Failed to read shopping lists: {:?}", e);
            return;
        }
    };

    // Process all lists concurrently against the shared snapshot
    let records = Arc::new(records);
    let scope = Arc::new(scope);
    let tasks: Vec<_> = lists
        .into_iter()
        .map(|list| {
            optimize_list(
                list,
                catalog_store.clone(),
                records.clone(),
                scope.clone(),
                now,
            )
        })
        .collect();
    join_all(tasks).await;
}

async fn check_alerts(
    catalog_store: &Arc<Mutex<SqliteCatalog>>,
    records: &[PriceRecord],
    scope: &HashSet<String>,
    now: DateTime<Utc>,
) {
    let alert_list = match catalog_store.lock().await.list_alerts() {
        Ok(alerts) => alerts,
        Err(e) => {
            warn!("Failed to read alerts: {:?}", e);
            return;
        }
    };

    for alert in alert_list.iter().filter(|a| a.is_active) {
        let updated = alerts::evaluate(alert, records, scope, now);

        if updated.triggered && !alert.triggered {
            let matches = find_matches(&alert.product_name, records, scope, now);
            let spread = comparison::compare_across_retailers(&matches);
            info!(
                "💰 Price alert hit: '{}' at {:.2} € (target {:.2} €, spread {:.2} € across {} retailers)",
                updated.product_name,
                updated.current_price.unwrap_or_default(),
                updated.target_price,
                spread.savings(),
                spread.results.len()
            );
        }

        if updated.current_price != alert.current_price || updated.triggered != alert.triggered {
            if let Err(e) = catalog_store.lock().await.update_alert(&updated) {
                warn!("Alert write-back failed: {:?}", e);
            }
        }
    }
}

async fn optimize_list(
    list: ShoppingList,
    catalog_store: Arc<Mutex<SqliteCatalog>>,
    records: Arc<Vec<PriceRecord>>,
    scope: Arc<HashSet<String>>,
    now: DateTime<Utc>,
) {
    let items = match catalog_store.lock().await.list_items(&list.id) {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to read items for list '{}': {:?}", list.name, e);
            return;
        }
    };
    if items.is_empty() {
        return;
    }

    match optimizer::optimize(&items, &records, &scope, now) {
        Ok(plan) => {
            info!(
                "List '{}': {:.2} € at {} retailers, {:.2} € below regular prices",
                list.name, plan.total_cost, plan.retailer_count, plan.potential_savings
            );
            for group in &plan.retailer_groups {
                info!(
                    "  {} ({} items): {:.2} €",
                    group.retailer_name,
                    group.items.len(),
                    group.subtotal
                );
            }
        }
        Err(e) => warn!("List '{}' is not optimizable: {}", list.name, e),
    }
}
