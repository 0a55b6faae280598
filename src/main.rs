use clap::Parser;
use log::{error, info};
use poolwatch::config::Config;
use poolwatch::watcher::Watcher;
use std::sync::atomic::Ordering;

fn main() {
    // Parse command-line arguments (with env-var fallbacks)
    let config = Config::parse();

    // Initialize logging based on verbosity
    if config.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    info!("Starting pool watcher");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let watcher = match Watcher::new(config) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Failed to initialize watcher: {}", e);
            std::process::exit(1);
        }
    };

    // Set up signal handling for graceful shutdown (SIGINT)
    let shutdown = watcher.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, shutting down gracefully...");
        shutdown.store(true, Ordering::SeqCst);
    })
    .expect("Error setting SIGINT handler for graceful shutdown");

    info!("Pool watcher is running. Press Ctrl+C to stop.");

    if let Err(e) = watcher.run() {
        error!("Watcher failed: {}", e);
        std::process::exit(1);
    }

    info!("Pool watcher shutdown complete");
}
