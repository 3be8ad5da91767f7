//! Human-readable sizes, durations and the build summary.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;

use super::colors_enabled;

/// Format a byte count with binary units.
///
/// ```
/// use skein_cli::ui::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

/// Format a duration for display.
///
/// ```
/// use std::time::Duration;
/// use skein_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print a table of written files to stderr.
///
/// `rows` are `(file name, size in bytes, origin)`.
pub fn print_build_summary(rows: &[(String, u64, String)], elapsed: Duration) {
    let width = (Term::stderr().size().1 as usize).clamp(20, 80);
    let rule = "─".repeat(width);
    let colors = colors_enabled();

    if colors {
        eprintln!("\n{}", "Build Summary".bold().underline());
    } else {
        eprintln!("\nBuild Summary");
    }
    eprintln!("{rule}");

    for (name, size, origin) in rows {
        let size = format_size(*size);
        if colors {
            eprintln!(
                "  {} {} {} {}",
                "▸".blue(),
                name.bright_white().bold(),
                size.dimmed(),
                format!("({origin})").dimmed()
            );
        } else {
            eprintln!("  ▸ {name} {size} ({origin})");
        }
    }

    eprintln!("{rule}");
    let total = format_size(rows.iter().map(|(_, size, _)| size).sum());
    let elapsed = format_duration(elapsed);
    if colors {
        eprintln!("  {} {} in {}", "Total:".bold(), total.green(), elapsed.green());
    } else {
        eprintln!("  Total: {total} in {elapsed}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(59_999)), "60.00s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
