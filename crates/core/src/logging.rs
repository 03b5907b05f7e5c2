//! Tracing subscriber setup for hosts
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the host. [`init`] is a convenience for hosts without their own.

use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber
///
/// `RUST_LOG` takes precedence when set; otherwise `cadence` crates log at
/// `debug` (when `debug` is true) or `info`. Calling this more than once, or
/// after another subscriber was installed, does nothing.
pub fn init(debug: bool) {
    let fallback = if debug {
        "cadence_core=debug,cadence_clock=debug"
    } else {
        "cadence_core=info,cadence_clock=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init(true);
        super::init(false);
        tracing::debug!("still logging");
    }
}
