//! # OS termination signals.
//!
//! [`shutdown_signal`] completes when the process is asked to terminate:
//! - **Unix**: `SIGINT`, `SIGTERM` or `SIGQUIT`
//! - **Other platforms**: Ctrl-C via [`tokio::signal::ctrl_c`]
//!
//! Listeners are installed per call and dropped when the future completes.

/// Waits for a termination signal and returns its name for logging.
#[cfg(unix)]
pub(crate) async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name for logging.
#[cfg(not(unix))]
pub(crate) async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl_c")
}
