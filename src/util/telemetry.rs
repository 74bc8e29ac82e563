//! Tracing setup for scheduler diagnostics.
//!
//! The scheduler emits `trace` events for timer arming/firing and intake, and
//! `debug` events for each dispatch decision (batch size, active workers,
//! remaining queue depth). Gate them with the standard `RUST_LOG` directive
//! syntax, e.g. `RUST_LOG=microbatch=debug`.

/// Install a default env-filtered subscriber for scheduler diagnostics.
///
/// Callers that already install their own subscriber can skip this; if a
/// global dispatcher is set, this is a no-op. With no `RUST_LOG` set, only
/// this crate's `debug`-level dispatch events are enabled.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("microbatch=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        assert!(tracing::dispatcher::has_been_set());
    }
}
