//! Concrete chat providers.

mod daemon;
mod hosted;

pub use daemon::LocalDaemonClient;
pub use hosted::HostedApiClient;
