//! Core environment context trait for the Stratowatch engine.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the host so the refresh pipeline can run against
/// both production (tokio) and scripted test environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and the system clock
/// - **Tests**: a virtual-clock context whose `sleep` advances manually
///
/// # Determinism
///
/// All methods that would normally introduce non-determinism (time) are
/// controlled by the implementation, so a refresh schedule can be replayed
/// exactly in tests.
#[async_trait]
pub trait HostContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for fetch-duration measurements and timer bookkeeping.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used for "last updated" displays.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In tests: advances a virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
