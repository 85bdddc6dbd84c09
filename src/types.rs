// src/types.rs

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the collaborator traits (`Builder`, `Runner`,
/// `Notifier`), so they stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// When the application is started after a build.
///
/// - `Immediate`: right after every successful build.
/// - `OnDemand`: not by the rebuild loop; the proxy starts it on the first
///   connection that arrives after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    Immediate,
    #[default]
    OnDemand,
}

/// Latest build result, published to the proxy after every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// A build is in progress (also the state before the first build).
    Building,
    Succeeded,
    /// Build failed with the builder's diagnostic text.
    Failed(String),
}
