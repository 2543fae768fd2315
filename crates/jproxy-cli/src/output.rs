//! Shared colored output for CLI commands.
//!
//! Uses `termcolor`. Respects `NO_COLOR` and the `--color` flag.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from the CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer over any `WriteColor` sink.
pub struct StyledOutput<W: WriteColor = StandardStream> {
    out: W,
}

impl StyledOutput<StandardStream> {
    /// Styled stdout with the given color choice.
    pub fn stdout(choice: ColorChoice) -> Self {
        Self {
            out: StandardStream::stdout(choice),
        }
    }
}

impl<W: WriteColor> StyledOutput<W> {
    /// Wrap an existing sink, e.g. a `termcolor::Buffer` in tests.
    pub fn from_writer(out: W) -> Self {
        Self { out }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.out.set_color(&spec);
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    /// Green bold text.
    pub fn success(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Green), true);
    }

    /// Red bold text.
    pub fn error(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Red), true);
    }

    /// Yellow bold text.
    pub fn warning(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Yellow), true);
    }

    /// Cyan text.
    pub fn info(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Cyan), false);
    }

    /// Bold text.
    pub fn bold(&mut self, text: &str) {
        self.write_styled(text, None, true);
    }

    /// Plain text (no color).
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
    }

    /// Newline.
    pub fn newline(&mut self) {
        let _ = writeln!(self.out);
    }

    /// Flush the sink.
    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn test_no_color_buffer_is_plain() {
        let mut out = StyledOutput::from_writer(Buffer::no_color());
        out.success("ok");
        out.plain(" done");
        out.newline();
        let text = String::from_utf8(out.into_inner().into_inner()).unwrap();
        assert_eq!(text, "ok done\n");
    }

    #[test]
    fn test_color_flag() {
        if std::env::var_os("NO_COLOR").is_none() {
            assert_eq!(resolve_color_choice(Some("never")), ColorChoice::Never);
            assert_eq!(resolve_color_choice(Some("always")), ColorChoice::Always);
            assert_eq!(resolve_color_choice(None), ColorChoice::Auto);
        }
    }
}
