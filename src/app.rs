use crate::codec::ImageCodec;
use crate::config::Config;
use crate::detection::{StubFaceDetector, StubObjectDetector};
use crate::server::HttpServer;
use crate::service::DetectionService;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

/// Assembles the service from configuration and serves it until Ctrl+C or
/// SIGTERM.
pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let codec = ImageCodec::new(config.detection.max_upload_bytes);
    let detection_service = Arc::new(DetectionService::new(
        codec,
        StubFaceDetector,
        StubObjectDetector::new(config.detection.stub_object_label.clone()),
    ));

    let server = match HttpServer::new(detection_service, &config.server).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize http server: {:?}", e);
            return Err(e.into());
        }
    };

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Err(e)) => tracing::error!("Server exited with error: {:?}", e),
        Err(e) => tracing::error!("Server task failed: {:?}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
