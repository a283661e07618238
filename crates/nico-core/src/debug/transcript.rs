//! Text output of debug commands

/// Sink for the human-readable output of debug commands
///
/// Every result and every error of a command ends up here as one line.
pub trait Transcript {
    /// Append a complete line
    fn line(&mut self, text: &str);

    /// Report transient progress
    ///
    /// Consecutive progress reports may replace each other on screen; the
    /// default just appends a line.
    fn progress(&mut self, text: &str) {
        self.line(text);
    }
}

impl Transcript for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

impl<T: Transcript + ?Sized> Transcript for &mut T {
    fn line(&mut self, text: &str) {
        (**self).line(text)
    }

    fn progress(&mut self, text: &str) {
        (**self).progress(text)
    }
}

/// `"s"` unless `count` is exactly one
pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
