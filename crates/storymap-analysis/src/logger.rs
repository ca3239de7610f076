//! Logging setup for hosts embedding the build.
//!
//! Build components log through `tracing` with a `scope` field (see
//! [`BuildContext`](storymap_graph::BuildContext)); these helpers install a
//! compact formatter for them.
//!
//! # Example
//!
//! ```rust,no_run
//! use storymap_analysis::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("Starting build");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "storymap_graph=debug,storymap_analysis=debug";
const QUIET_FILTER: &str = "storymap_graph=error,storymap_analysis=error";
const DEFAULT_FILTER: &str = "storymap_graph=info,storymap_analysis=info";

/// Initialize the tracing subscriber.
///
/// The level is picked in this order:
/// 1. `verbose`: DEBUG for the storymap crates
/// 2. `quiet`: ERROR only
/// 3. `RUST_LOG`
/// 4. INFO for the storymap crates
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    install(filter, no_color);
}

/// Initialize the subscriber with an explicit filter directive such as
/// `"storymap_analysis=trace"`. Invalid directives fall back to the default.
pub fn init_logger_with_filter(filter: &str, no_color: bool) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter, no_color);
}

fn install(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    // Ignore the error: a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logger(true, false, true);
        init_logger(false, true, true);
        init_logger_with_filter("not a [valid filter", true);
        tracing::debug!("still logging");
    }
}
