//! Translate termination requests into a [`CancellationFlag`].
//!
//! A dedicated thread runs a single-threaded tokio runtime that waits for
//! Ctrl+C or SIGTERM. When one arrives it sets the flag and exits; the
//! generation loop notices at the next candidate boundary, finalizes every
//! output and the process exits cleanly.

use crate::cancel::CancellationFlag;
use crate::error::{GenError, Result};
use std::thread::JoinHandle;

/// Spawn the listener thread.
///
/// On unix both SIGINT and SIGTERM handlers are registered before this
/// returns, so a signal sent right afterwards is not lost. Elsewhere only
/// Ctrl+C is watched, from the listener thread.
pub fn install(flag: CancellationFlag) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .map_err(GenError::Signal)?;

    #[cfg(unix)]
    let (mut sigint, mut sigterm) = {
        use tokio::signal::unix::{signal as listen, SignalKind};
        let _guard = runtime.enter();
        (
            listen(SignalKind::interrupt()).map_err(GenError::Signal)?,
            listen(SignalKind::terminate()).map_err(GenError::Signal)?,
        )
    };

    std::thread::Builder::new()
        .name("omnigen-signal".into())
        .spawn(move || {
            runtime.block_on(async move {
                #[cfg(unix)]
                let (interrupt, terminate) = (
                    async move {
                        sigint.recv().await;
                    },
                    async move {
                        sigterm.recv().await;
                    },
                );

                #[cfg(not(unix))]
                let interrupt = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("Ctrl+C handler unavailable: {}", e);
                        std::future::pending::<()>().await;
                    }
                };

                #[cfg(not(unix))]
                let terminate = std::future::pending::<()>();

                tokio::select! {
                    () = interrupt => tracing::info!("Received Ctrl+C signal"),
                    () = terminate => tracing::info!("Received SIGTERM signal"),
                }
            });
            tracing::info!("Stop requested, finishing current candidate");
            flag.cancel();
        })
        .map_err(GenError::Signal)
}
