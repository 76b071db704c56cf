//! # Resolver Datastore Entry Point
//!
//! Builds the datastore from the configuration in `DATASTORE_CONFIG`, starts
//! the scheduled list reload and the event consumer, and runs until Ctrl-C.

use datastore::{
    ChannelEvents, Datastore, RefreshScheduler, RefreshService, SchedulerConfig, SharedRegion,
    SqliteListStore, StoreConfig, StoreEvent,
};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("  Resolver Datastore                              ");
    println!("=================================================");
    println!();

    let config = match StoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let (events, rx) = ChannelEvents::new();
    let store = Datastore::new(config.clone())?.with_events(Arc::new(events));
    let region = SharedRegion::new(store);
    println!("✓ Datastore initialized");

    println!("Tables:");
    for stats in region.read().table_stats() {
        println!(
            "  - {:<10} (capacity: {}, live: {})",
            stats.name, stats.capacity, stats.live
        );
    }
    println!("  - OverTime: {} buckets of {}s", config.overtime_slots, config.overtime_interval_secs);
    println!("  - Privacy level: {:?}", config.privacy_level);
    println!();

    tokio::spawn(consume_events(region.clone(), rx));

    match SqliteListStore::open(&config.list_db_path) {
        Ok(lists) => {
            println!("✓ List database: {}", config.list_db_path.display());
            let service = RefreshService::new(region.clone(), Arc::new(lists));
            let scheduler = Arc::new(RefreshScheduler::new(
                service,
                SchedulerConfig::from(&config),
            ));
            tokio::spawn(scheduler.start());
        }
        Err(e) => {
            warn!("List reloads disabled: {}", e);
            println!("✗ List database unavailable, reloads disabled");
        }
    }
    println!();

    tokio::signal::ctrl_c().await?;

    let summary = region.read().summary();
    info!("Final summary: {}", summary.to_json());

    println!("=================================================");
    println!("  Resolver Datastore Shut Down");
    println!("=================================================");

    Ok(())
}

/// Drain datastore events. Hostname resolution and per-client regex reloads
/// are owned by other components; here they are only traced.
async fn consume_events(region: SharedRegion, mut rx: UnboundedReceiver<StoreEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            StoreEvent::ResolveNewHostnames => {
                let store = region.read();
                debug!(
                    "{} client(s) and {} upstream(s) awaiting hostname resolution",
                    store.clients_needing_resolution().len(),
                    store.upstreams_needing_resolution().len()
                );
            }
            StoreEvent::ReloadClientRegex(client) => {
                debug!("Client {} needs its regex filters re-evaluated", client);
            }
        }
    }
}
