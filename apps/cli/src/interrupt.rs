use std::future::Future;
use std::io;
use std::thread;

use outprinter_printing::CancelToken;
use tracing::{debug, warn};

/// Sets `token` when Ctrl-C arrives; the job stops before its next page.
pub fn cancel_on_ctrl_c(token: &CancelToken) {
    let token = token.clone();
    let spawned = thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    debug!("interrupt handling unavailable: {err}");
                    return;
                }
            };
            runtime.block_on(cancel_on(tokio::signal::ctrl_c(), token));
        });
    if let Err(err) = spawned {
        debug!("failed to start the interrupt listener: {err}");
    }
}

/// Waits for `signal` and cancels `token` once it fires.
async fn cancel_on<F>(signal: F, token: CancelToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            warn!("interrupted; stopping after the current page");
            token.cancel();
        }
        Err(err) => debug!("failed to listen for Ctrl-C: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn signal_cancels_the_token() {
        let token = CancelToken::new();
        block_on(cancel_on(ready(Ok(())), token.clone()));
        assert!(token.is_cancelled());
    }

    #[test]
    fn listener_failure_leaves_the_job_running() {
        let token = CancelToken::new();
        let failed = ready(Err(io::Error::new(io::ErrorKind::Other, "no signal handler")));
        block_on(cancel_on(failed, token.clone()));
        assert!(!token.is_cancelled());
    }
}
