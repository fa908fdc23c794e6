//! Timer seam used between polling attempts.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current task for a while without blocking the event loop.
#[async_trait(?Send)]
pub trait Sleep {
    /// Resolve after `duration` has elapsed.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeps on a browser `setTimeout`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooSleep;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl Sleep for GlooSleep {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}

/// The platform's default sleeper.
#[cfg(not(target_arch = "wasm32"))]
pub type DefaultSleep = TokioSleep;

/// The platform's default sleeper.
#[cfg(target_arch = "wasm32")]
pub type DefaultSleep = GlooSleep;
