use std::sync::atomic::{AtomicBool, Ordering};

use crate::trace::DebugTracer;

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Turn process-wide debug output on or off.
///
/// When on, every [`run_all`](crate::run_all) call, and every
/// [`Runner`](crate::Runner) without an explicit `.debug(..)`, prints a
/// line per evaluated condition and per action to stdout. Off at startup and
/// read at the start of each run.
pub fn enable_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

#[must_use]
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Stdout tracer for one run: the per-run override if set, else the global
/// toggle as it stands now.
pub(crate) fn debug_sink(debug: Option<bool>) -> Option<DebugTracer> {
    debug.unwrap_or_else(debug_enabled).then(DebugTracer::stdout)
}
