use crate::cache::{CacheStore, RefreshCoordinator, RefreshPolicy};
use crate::config::Config;
use crate::geocode::{ZipCodeStackClient, ZipDomain};
use crate::logging::fmt_duration;
use crate::state::AppState;
use crate::weather::{ForecastDomain, WeatherGovClient};
use crate::web::create_router;
use anyhow::Context;
use sqlx::ConnectOptions;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    db_pool: SqlitePool,
    app_state: AppState,
}

impl App {
    /// Create a new App instance with all necessary components initialized
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        if let Some(parent) = config.database_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        let acquire_timeout = Duration::from_secs(4);
        let db_pool = SqlitePoolOptions::new()
            .min_connections(0)
            .max_connections(4)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(60 * 2))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            path = %config.database_path.display(),
            max_connections = 4,
            acquire_timeout = fmt_duration(acquire_timeout),
            "database pool established"
        );

        let weather_client = WeatherGovClient::new(
            &config.weather_api_base_url,
            config.forecast_http_timeout,
            &config.weather_user_agent,
        )
        .context("Failed to create weather.gov client")?;

        if config.zipcodestack_api_key.is_none() {
            warn!("ZIPCODESTACK_API_KEY is not set; ZIP lookups will be rejected upstream");
        }
        let zip_client = ZipCodeStackClient::new(
            &config.zip_api_url,
            config.zipcodestack_api_key.clone(),
            config.zip_http_timeout,
            &config.weather_user_agent,
        )
        .context("Failed to create ZipCodeStack client")?;

        let forecasts = RefreshCoordinator::<ForecastDomain>::new(
            CacheStore::new(db_pool.clone()),
            Arc::new(weather_client),
            RefreshPolicy {
                ttl: config.forecast_cache_ttl,
                serve_stale_on_error: config.serve_stale_on_error,
            },
        );
        let geocodes = RefreshCoordinator::<ZipDomain>::new(
            CacheStore::new(db_pool.clone()),
            Arc::new(zip_client),
            RefreshPolicy {
                ttl: config.zip_cache_ttl,
                serve_stale_on_error: config.serve_stale_on_error,
            },
        );

        info!(
            forecast_ttl = fmt_duration(config.forecast_cache_ttl),
            forecast_timeout = fmt_duration(config.forecast_http_timeout),
            zip_ttl = fmt_duration(config.zip_cache_ttl),
            zip_timeout = fmt_duration(config.zip_http_timeout),
            serve_stale_on_error = config.serve_stale_on_error,
            "lookup domains configured"
        );

        let app_state = AppState::new(db_pool.clone(), forecasts, geocodes);

        Ok(App {
            config,
            db_pool,
            app_state,
        })
    }

    /// Serve HTTP until a shutdown signal, then drain within the shutdown timeout.
    pub async fn run(self) -> ExitCode {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %addr, error = ?e, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(addr = %addr, "web server listening");

        let shutdown = Arc::new(Notify::new());
        let router = create_router(self.app_state, self.config.request_timeout());
        let mut server = tokio::spawn({
            let shutdown = shutdown.clone();
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .into_future()
        });

        tokio::select! {
            result = &mut server => {
                error!(result = ?result, "web server exited unexpectedly");
                self.db_pool.close().await;
                return ExitCode::FAILURE;
            }
            () = shutdown_signal() => {}
        }

        info!(
            timeout = fmt_duration(self.config.shutdown_timeout),
            "shutdown signal received, draining connections"
        );
        shutdown.notify_one();

        let code = match tokio::time::timeout(self.config.shutdown_timeout, server).await {
            Ok(Ok(Ok(()))) => {
                info!("web server stopped");
                ExitCode::SUCCESS
            }
            Ok(Ok(Err(e))) => {
                error!(error = ?e, "web server failed during shutdown");
                ExitCode::FAILURE
            }
            Ok(Err(e)) => {
                error!(error = ?e, "web server task panicked");
                ExitCode::FAILURE
            }
            Err(_) => {
                warn!("graceful shutdown timed out");
                ExitCode::FAILURE
            }
        };

        self.db_pool.close().await;
        code
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
