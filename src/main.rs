use guidance_service::integration::{self, init_logger};
use guidance_service::state::AppState;
use log::info;

fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cfg = integration::Config::default();
    AppState::init(&cfg)?;

    info!("Database '{}' is migrated and ready", cfg.db.url());
    Ok(())
}
