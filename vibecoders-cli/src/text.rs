use std::fmt::{self, Display};

use termion::color::{AnsiValue, Bg, Fg, Reset};
use termion::style::{Bold, Italic, NoBold, NoItalic};

/// A styled span of text
///
/// Styling is limited to 256-colour ANSI values, which keeps spans `Copy`able
/// colour-wise and avoids trait objects.
#[derive(Debug, Clone)]
pub struct Fancy {
    text: String,
    fg: Option<AnsiValue>,
    bg: Option<AnsiValue>,
    bold: bool,
    italic: bool,
}

impl Fancy {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Fancy {
            text: text.into(),
            fg: None,
            bg: None,
            bold: false,
            italic: false,
        }
    }

    pub fn fg(mut self, colour: AnsiValue) -> Self {
        self.fg = Some(colour);
        self
    }

    pub fn bg(mut self, colour: AnsiValue) -> Self {
        self.bg = Some(colour);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn get_bg(&self) -> Option<AnsiValue> {
        self.bg
    }

    /// Width in columns, counted as characters
    pub fn cols(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// A copy truncated to at most `max` characters
    pub fn truncate(&self, max: usize) -> Fancy {
        Fancy {
            text: self.text.chars().take(max).collect(),
            ..self.clone()
        }
    }
}

impl Display for Fancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(colour) = self.bg {
            write!(f, "{}", Bg(colour))?;
        }
        if let Some(colour) = self.fg {
            write!(f, "{}", Fg(colour))?;
        }
        if self.bold {
            write!(f, "{}", Bold)?;
        }
        if self.italic {
            write!(f, "{}", Italic)?;
        }

        write!(f, "{}", self.text)?;

        if self.italic {
            write!(f, "{}", NoItalic)?;
        }
        if self.bold {
            write!(f, "{}", NoBold)?;
        }
        if self.fg.is_some() {
            write!(f, "{}", Fg(Reset))?;
        }
        if self.bg.is_some() {
            write!(f, "{}", Bg(Reset))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_are_wrapped_and_reset() {
        let span = Fancy::new("Test")
            .fg(AnsiValue(15))
            .bg(AnsiValue(4))
            .bold()
            .italic();

        let expected = format!(
            "{}{}{}{}{}{}{}{}{}",
            Bg(AnsiValue(4)),
            Fg(AnsiValue(15)),
            Bold,
            Italic,
            "Test",
            NoItalic,
            NoBold,
            Fg(Reset),
            Bg(Reset),
        );

        assert_eq!(span.to_string(), expected);
    }

    #[test]
    fn truncate_keeps_style() {
        let span = Fancy::new("abcdef").fg(AnsiValue(3));
        let short = span.truncate(3);
        assert_eq!(short.cols(), 3);
        assert!(short.to_string().contains("abc"));
    }
}
