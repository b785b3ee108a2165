//! Console progress output
//!
//! Everything goes to stderr so `pypp emit` output on stdout stays clean.

use std::cell::Cell;
use std::io::{self, Write};

use crate::frontend::module::ModuleReport;
use crate::progress::{Progress, percent};

/// Width of the progress bar in characters.
pub const BAR_WIDTH: usize = 60;

/// Prints import notices and a redrawn `[>>>   ] 42.5%` bar.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last_filled: Cell<Option<usize>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for ConsoleProgress {
    fn module_imported(&self, module: &ModuleReport) {
        eprintln!(
            "Imported {} ({} funcs, {} vars)",
            module.name, module.functions, module.variables
        );
    }

    fn transpile_progress(&self, done: usize, total: usize) {
        let filled = filled_width(done, total);
        if done < total && self.last_filled.get() == Some(filled) {
            return;
        }
        self.last_filled.set(Some(filled));

        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r{}", render_bar(done, total));
        if done >= total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

fn filled_width(done: usize, total: usize) -> usize {
    if total == 0 {
        return BAR_WIDTH;
    }
    (done.min(total) * BAR_WIDTH + total / 2) / total
}

/// Render the bar for `done` of `total`.
pub fn render_bar(done: usize, total: usize) -> String {
    let filled = filled_width(done, total);
    format!(
        "[{}{}] {}%",
        ">".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        percent(done, total)
    )
}
