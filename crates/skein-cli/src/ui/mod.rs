//! Terminal output helpers.
//!
//! Status lines go to stderr so that stdout only carries command results
//! (such as the `skein check` report).

mod format;
mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};

static COLORS: AtomicBool = AtomicBool::new(false);

/// Decide once whether status lines are colored.
///
/// Respects `--no-color`, `NO_COLOR` and `FORCE_COLOR`.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && crate::logger::should_use_colors();
    COLORS.store(enabled, Ordering::Relaxed);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
