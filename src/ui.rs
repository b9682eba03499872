/// User interface and status output utilities
///
/// This module handles:
/// - Prefixed status lines
/// - Colored error and success markers
use std::io::Write;

/// Print the "wikistats: " prefix for status messages
fn print_status_header() {
    print!("wikistats: ");
}

/// Write a marker in color when stdout is a terminal, plain otherwise
fn print_marker(marker: &str, fg: term::color::Color) {
    let Some(mut t) = term::stdout() else {
        print!("{}", marker);
        return;
    };
    let colored = t.fg(fg).is_ok();
    let _ = write!(t, "{}", marker);
    if colored {
        let _ = t.reset();
    }
}

/// Print a status message with "wikistats: " prefix
pub fn status(s: &str) {
    print_status_header();
    println!("{}", s);
}

/// Print a status line with a green marker, e.g. "wikistats: created OPS/Weekly"
pub fn success(marker: &str, s: &str) {
    print_status_header();
    print_marker(marker, term::color::BRIGHT_GREEN);
    println!(" {}", s);
}

/// Print an error message with colored "error" prefix
pub fn print_error(msg: &str) {
    println!();
    print_marker("error", term::color::BRIGHT_RED);
    println!(": {}", msg);
    println!();
}
