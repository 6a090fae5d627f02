//! Driving one future to completion from synchronous code.
//!
//! At most one runtime drives the future. If the calling thread already sits
//! inside a tokio runtime, that runtime is reused when it can be blocked
//! (multi-thread flavor). A current-thread runtime cannot be blocked from
//! inside, so the future gets a throwaway runtime on a scoped helper thread.
//! With no runtime at all, a throwaway runtime is built on the calling thread.
//! Throwaway runtimes are dropped before returning.

use crate::errors::AdapterError;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tracing::debug;

/// Run `future` to completion on the calling thread and return its result.
///
/// Errors of the future propagate unchanged. Failing to start a runtime, or a
/// panic inside the future, surfaces as an [`AdapterError`] converted into `E`.
pub fn run_sync<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: From<AdapterError> + Send,
{
    let guarded = AssertUnwindSafe(future).catch_unwind();

    let caught = match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            debug!("driving future on the active multi-thread runtime");
            tokio::task::block_in_place(|| handle.block_on(guarded))
        }
        Ok(_) => {
            debug!("current-thread runtime active, driving future on a helper thread");
            std::thread::scope(|scope| {
                scope
                    .spawn(move || block_on_fresh_runtime(guarded))
                    .join()
            })
            .map_err(|payload| AdapterError::Panicked(panic_message(payload.as_ref())))??
        }
        Err(_) => {
            debug!("no active runtime, driving future on a throwaway runtime");
            block_on_fresh_runtime(guarded)?
        }
    };

    match caught {
        Ok(result) => result,
        Err(payload) => Err(AdapterError::Panicked(panic_message(payload.as_ref())).into()),
    }
}

fn block_on_fresh_runtime<G: Future>(future: G) -> Result<G::Output, AdapterError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let output = runtime.block_on(future);
    // Dropping waits for the runtime's blocking tasks, so no work outlives the call
    drop(runtime);
    Ok(output)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PluginError;
    use std::time::Duration;

    async fn warm_up(value: u32) -> Result<u32, PluginError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let doubled = tokio::task::spawn_blocking(move || value * 2)
            .await
            .map_err(|e| PluginError::new(e.to_string()))?;
        Ok(doubled)
    }

    #[test]
    fn test_runs_without_active_runtime() {
        assert!(Handle::try_current().is_err());
        assert_eq!(run_sync(warm_up(21)), Ok(42));
    }

    #[test]
    fn test_sequential_calls_do_not_leak_runtime() {
        let first = run_sync(warm_up(1));
        assert!(Handle::try_current().is_err());
        let second = run_sync(warm_up(1));
        assert_eq!(first, second);
        assert!(Handle::try_current().is_err());
    }

    #[test]
    fn test_future_error_propagates() {
        let result: Result<(), PluginError> =
            run_sync(async { Err(PluginError::new("warmup failed")) });
        assert_eq!(result, Err(PluginError::new("warmup failed")));
    }

    #[test]
    fn test_panic_becomes_adapter_error() {
        let result: Result<(), PluginError> = run_sync(async {
            if true {
                panic!("index exploded");
            }
            Ok(())
        });
        let err = result.unwrap_err();
        assert_eq!(err.message(), "async task panicked: index exploded");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reuses_active_multi_thread_runtime() {
        assert_eq!(run_sync(warm_up(4)), Ok(8));
        assert_eq!(run_sync(warm_up(5)), Ok(10));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_inside_current_thread_runtime() {
        assert_eq!(run_sync(warm_up(6)), Ok(12));
        assert_eq!(run_sync(warm_up(7)), Ok(14));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&17_u8), "unknown panic");
    }
}
