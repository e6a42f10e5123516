use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber: `RUST_LOG` if set, `default_directive` otherwise.
///
/// Returns an error rather than panicking when a subscriber is already installed,
/// so embedding applications and tests can call it unconditionally.
pub fn init_tracing(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
