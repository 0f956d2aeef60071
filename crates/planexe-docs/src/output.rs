//! Colored terminal output.

use console::{Style, Term};

/// Status line printer: green for success, yellow for progress and
/// warnings, red for errors.
pub(crate) struct Output {
    out: Term,
    err: Term,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow().bold(),
            red: Style::new().red(),
        }
    }

    /// Print an uncolored message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.out.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.out.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a progress or warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.out.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red) to stderr.
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a follow-up hint for an error to stderr.
    pub(crate) fn hint(&self, msg: &str) {
        let _ = self.err.write_line(msg);
    }
}
