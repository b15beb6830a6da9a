//! OncoFlux Desk - serviço da recepção
//!
//! Recebe o registro diário de fluxo e serve o dashboard da diretoria em JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use oncoflux_db::OncoFlux;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod routes;

use config::DeskConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = DeskConfig::from_env().context("Configuração inválida")?;
    init_tracing(config.log_json);

    let store = oncoflux_db::open_store(&config.store)
        .await
        .context("Falha ao abrir o repositório de registros")?;
    let app = routes::router(Arc::new(OncoFlux::new(store)));

    info!("OncoFlux ouvindo em {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Falha no servidor HTTP")?;

    info!("Servidor encerrado");
    Ok(())
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao aguardar sinal de encerramento: {}", e);
    }
}
