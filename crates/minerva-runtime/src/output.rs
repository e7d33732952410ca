//! Output channel
//!
//! Every observable write the evaluator makes — `print`/`show`, plot
//! rendering, recoverable-error reports — goes through one `Output` sink.
//! The default sink writes to stdout; tests swap in a capturing sink and
//! assert on the collected lines.

#[derive(Debug)]
pub enum Output {
    Stdout,
    Capture(Vec<String>),
}

impl Output {
    pub fn stdout() -> Self {
        Output::Stdout
    }

    /// Sink that collects lines instead of printing them.
    pub fn capture() -> Self {
        Output::Capture(Vec::new())
    }

    /// Writes one line of script-visible output.
    pub fn line(&mut self, text: impl Into<String>) {
        match self {
            Output::Stdout => println!("{}", text.into()),
            Output::Capture(lines) => lines.push(text.into()),
        }
    }

    /// Reports a recoverable error. Evaluation continues after these; only
    /// `RuntimeError` values abort a run.
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.line(format!("Error: {}", message.as_ref()));
    }

    /// Reports a warning (e.g. a CSV cell substituted with zero).
    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.line(format!("Warning: {}", message.as_ref()));
    }

    /// Captured lines; empty for the stdout sink.
    pub fn lines(&self) -> &[String] {
        match self {
            Output::Stdout => &[],
            Output::Capture(lines) => lines,
        }
    }

    /// True if any captured line contains the needle. Stdout sinks always
    /// answer false; tests use the capture sink.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Default for Output {
    fn default() -> Self {
        Output::Stdout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_collects_lines_in_order() {
        let mut out = Output::capture();
        out.line("first");
        out.error("broken");
        out.warning("odd");
        assert_eq!(out.lines(), ["first", "Error: broken", "Warning: odd"]);
        assert!(out.contains("broken"));
        assert!(!out.contains("absent"));
    }
}
