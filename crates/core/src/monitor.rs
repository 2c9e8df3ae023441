//! Periodic expiry checks
//!
//! The monitor is runtime-agnostic: it is handed a stream of ticks and a
//! local spawner. In the browser that is a gloo `IntervalStream` and
//! `wasm_bindgen_futures::spawn_local`; natively a channel or tokio interval
//! and `tokio::task::spawn_local`.

use crate::manager::SessionManager;
use futures::future::{AbortHandle, LocalBoxFuture, abortable};
use futures::{FutureExt, Stream, StreamExt};
use std::rc::Rc;
use tracing::debug;

/// Runs [`SessionManager::check`] on every tick until stopped or dropped.
///
/// Each tick spawns its own check, so the tick loop never waits on a token
/// request; a tick that lands while one is in flight is skipped by the
/// manager. Stopping the monitor does not cancel checks already spawned.
#[derive(Debug)]
pub struct ExpiryMonitor {
    abort: AbortHandle,
}

impl ExpiryMonitor {
    pub fn start<T, F>(manager: SessionManager, ticks: T, spawn: F) -> Self
    where
        T: Stream<Item = ()> + 'static,
        F: Fn(LocalBoxFuture<'static, ()>) + 'static,
    {
        let spawn = Rc::new(spawn);
        let spawn_check = Rc::clone(&spawn);

        let (tick_loop, abort) = abortable(async move {
            let mut ticks = std::pin::pin!(ticks);
            while ticks.next().await.is_some() {
                let manager = manager.clone();
                spawn_check(
                    async move {
                        let outcome = manager.check().await;
                        debug!(?outcome, "Expiry check finished");
                    }
                    .boxed_local(),
                );
            }
            debug!("Expiry monitor tick stream ended");
        });

        spawn(
            async move {
                let _ = tick_loop.await;
            }
            .boxed_local(),
        );

        Self { abort }
    }

    /// Stop issuing checks. Idempotent.
    pub fn stop(&self) {
        if !self.abort.is_aborted() {
            debug!("Stopping expiry monitor");
            self.abort.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.abort.is_aborted()
    }
}

impl Drop for ExpiryMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
