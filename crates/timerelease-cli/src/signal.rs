use std::future::Future;
use std::thread::JoinHandle;
use timerelease_puzzle::solver::CancellationToken;
use tracing::warn;

/// Returns a token that is cancelled when the process receives Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    if let Err(e) = cancel_when(token.clone(), async { tokio::signal::ctrl_c().await }) {
        warn!(error = %e, "could not watch for Ctrl-C; the solve cannot be interrupted");
    }
    token
}

/// Cancels `token` once `signal` resolves successfully.
///
/// The signal is awaited on a dedicated thread so the squaring loop keeps
/// the calling thread to itself.
pub fn cancel_when<F>(token: CancellationToken, signal: F) -> std::io::Result<JoinHandle<()>>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    std::thread::Builder::new()
        .name("signal-watch".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "signal runtime unavailable");
                    return;
                }
            };

            match runtime.block_on(signal) {
                Ok(()) => {
                    warn!("interrupted, cancelling");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "signal listener failed"),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_cancels_token() {
        let token = CancellationToken::new();
        let handle = cancel_when(token.clone(), async { Ok(()) }).unwrap();
        handle.join().unwrap();

        assert!(token.is_cancelled());
    }

    #[test]
    fn test_failed_listener_leaves_token_alone() {
        let token = CancellationToken::new();
        let handle = cancel_when(token.clone(), async {
            Err(std::io::Error::other("no signal support"))
        })
        .unwrap();
        handle.join().unwrap();

        assert!(!token.is_cancelled());
    }
}
