//! Scaffold console binary.

use std::sync::Arc;

use calendar::{DatePicker, YearMonth};
use chrono::Utc;
use scaffold_console::{config::Config, demo, init_tracing, spawn_state_logger};
use user_store::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        latency_scale = config.latency_scale,
        seed_users = config.seed_users,
        "Starting scaffold console"
    );

    let store = Arc::new(UserStore::new(config.transport()));
    let logger = spawn_state_logger(&store);

    demo::run_store_demo(store.as_ref()).await;

    let today = Utc::now().date_naive();
    let month = match config.calendar_month {
        Some(month) => month,
        None => YearMonth::containing(&today)?,
    };
    let mut picker = DatePicker::new(&month.first_day())?;
    print!("{}", demo::run_picker_demo(&mut picker));

    drop(store);
    logger.await?;

    Ok(())
}
