use std::sync::Arc;

use modular_mcp_server::config::Config;
use modular_mcp_server::logging::init_logging;
use modular_mcp_server::modules::ModuleRouter;
use modular_mcp_server::{build_app, services, stdio, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let transport = args.next().unwrap_or_else(|| "http".to_string());
    let modules = Arc::new(ModuleRouter::discover(&services::registered()));

    match transport.as_str() {
        "stdio" => {
            let module = args.next().unwrap_or_else(|| "random".to_string());
            let server = modules
                .get(&module)
                .ok_or_else(|| format!("unknown module: {module}"))?;
            info!(module, "starting stdio transport");
            stdio::run(server).await?;
        }
        "http" => {
            let config = Config::from_env()?;
            let state = AppState::new(modules, &config.public_url, config.bind_port);
            let app = build_app(state);

            let addr = config.bind_socket()?;
            info!(%addr, public_url = %config.public_url, "starting http transport");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        other => {
            return Err(format!("unknown transport: {other} (expected stdio or http)").into());
        }
    }

    Ok(())
}
