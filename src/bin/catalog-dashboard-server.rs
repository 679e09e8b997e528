/// Catalog Dashboard Server
///
/// Loads the catalog once at startup and serves the filter-and-aggregate
/// dashboard over HTTP and WebSocket.

use catalog_dashboard::server::run_server;
use catalog_dashboard::{Config, DashboardContext};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = match std::env::var("PORT").map(|p| p.parse()) {
        Err(_) => 8080,
        Ok(Ok(port)) => port,
        Ok(Err(e)) => {
            log::error!("PORT must be a number: {}", e);
            std::process::exit(2);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    // No partial dashboard is served if the initial load fails
    let dashboard = match DashboardContext::from_config(&config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            log::error!("Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    run_server(&host, port, dashboard).await
}
