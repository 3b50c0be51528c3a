use anyhow::Result;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use agromapa::api::AgroStatsClient;
use agromapa::controller::DashboardController;
use agromapa::models::Config;
use agromapa::ui::DashboardApp;

#[tokio::main]
async fn main() -> Result<()> {
    // Keep logging quiet while the TUI owns the terminal.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::ERROR)
        .with_env_filter("agromapa=error")
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            eprintln!("❌ Error de configuración: {e}");
            std::process::exit(1);
        }
    };

    let client = match AgroStatsClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to build API client: {e}");
            eprintln!("❌ URL de API inválida ({}): {e}", config.api_base_url);
            std::process::exit(1);
        }
    };

    let controller = DashboardController::new(client);
    let mut app = DashboardApp::new(controller);
    app.run().await?;

    println!("¡Hasta pronto!");
    Ok(())
}
