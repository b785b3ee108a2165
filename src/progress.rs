//! Progress side-channel
//!
//! The compiler reports imported modules and transpilation progress through a
//! [`Progress`] sink. Sinks only observe: nothing they do can change the
//! emitted C++.

use crate::frontend::module::ModuleReport;

/// Receives progress events from a compilation. Every method defaults to a no-op.
pub trait Progress {
    /// A non-entry module was loaded and namespaced.
    fn module_imported(&self, _module: &ModuleReport) {}

    /// `done` of `total` source lines have been transpiled.
    fn transpile_progress(&self, _done: usize, _total: usize) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Forwards events to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn module_imported(&self, module: &ModuleReport) {
        tracing::info!(
            module = %module.name,
            functions = module.functions,
            variables = module.variables,
            "imported module"
        );
    }

    fn transpile_progress(&self, done: usize, total: usize) {
        if done == total {
            tracing::info!(lines = total, "transpiled");
        }
    }
}

/// Percentage of `done` over `total`, rounded to two decimals. An empty job is complete.
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let ratio = done.min(total) as f64 / total as f64;
    (ratio * 10_000.0).round() / 100.0
}
