use clap::Parser;
use seat_planner::utils::{logger, validation::Validate};
use seat_planner::{run_server, AppState, ServerConfig};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // 初始化日誌
    logger::init_server_logger(config.verbose, config.log_json);

    tracing::info!("🚀 Starting seat-planner v{}", env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("Server config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let result = match config.socket_addr() {
        Ok(addr) => {
            run_server(
                addr,
                AppState {
                    monitor: config.monitor,
                    ..AppState::default()
                },
            )
            .await
        }
        Err(e) => Err(e),
    };

    let handle = match result {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(
                "❌ Failed to start server: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    };

    tracing::info!("🌐 Listening on http://{}", handle.local_addr());

    shutdown_signal().await;
    tracing::info!("🛑 Shutting down...");
    handle.stop().await;
}

/// Ctrl-C 或容器停止時送出的 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
