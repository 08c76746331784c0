mod data;
mod rotation;
mod server;
mod service;
mod solver;
mod store;
mod validator;

use log::{info, warn};
use std::sync::Arc;
use store::InMemoryStore;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // optional fixture file with classes and teachers; demo roster otherwise
    let store = match std::env::args().nth(1) {
        Some(path) => match load_fixture(&path) {
            Ok(fixture) => {
                info!("Seeded store from {path}");
                InMemoryStore::from_fixture(fixture)
            }
            Err(err) => {
                warn!("Could not load fixture {path}: {err}; using demo roster");
                InMemoryStore::demo()
            }
        },
        None => InMemoryStore::demo(),
    };

    server::run_server(Arc::new(store)).await;
}

fn load_fixture(path: &str) -> Result<store::Fixture, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}
