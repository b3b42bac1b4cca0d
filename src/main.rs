use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use showroom_pos::config::{EnvironmentConfig, StorageBackend};
use showroom_pos::database::{create_pool, run_migrations};
use showroom_pos::repositories::{MemoryPersistence, PgPersistence, Persistence};
use showroom_pos::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;

    // Configurar logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚗 Showroom POS - API de concesionario");
    info!("======================================");
    info!("🌍 Entorno: {}", config.environment);

    // Inicializar persistencia
    let store: Arc<dyn Persistence> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            if config.run_migrations {
                run_migrations(&pool).await?;
            }
            Arc::new(PgPersistence::new(pool))
        }
        StorageBackend::Memory => {
            warn!("⚠️ Persistencia en memoria: los datos se pierden al reiniciar");
            Arc::new(MemoryPersistence::new())
        }
    };

    let addr = config.server_url();
    let refresh_secs = config.metrics_refresh_secs;
    let bootstrap_admin = config.bootstrap_admin.clone();
    let state = AppState::new(store, config);

    if let Some((username, password)) = bootstrap_admin {
        state.auth.ensure_admin(&username, &password).await?;
    }

    if refresh_secs > 0 {
        info!("📊 Refresco de métricas cada {}s", refresh_secs);
        state
            .dashboard
            .clone()
            .spawn_metrics_refresher(Duration::from_secs(refresh_secs));
    }

    let app = create_app(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/auth/login · GET /api/auth/profile · POST /api/auth/register");
    info!("   /api/vehicles · /api/spare-parts · /api/customers · /api/suppliers");
    info!("   /api/repairs · /api/transactions · /api/dashboard");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
