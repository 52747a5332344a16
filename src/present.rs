use std::borrow::Cow;
use std::io::{self, Write};
use std::iter::Peekable;
use std::str::Chars;

use crate::render::ResultPanel;
use crate::runtime::ViewChange;

/// Prints view changes as terminal text: log lines as plain text, page chrome
/// with a `»` marker. Server-supplied text goes through [`terminal_safe`].
pub struct Presenter<W: Write> {
    out: W,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn present(&mut self, changes: &[ViewChange]) -> io::Result<()> {
        for change in changes {
            self.present_one(change)?;
        }
        self.out.flush()
    }

    fn present_one(&mut self, change: &ViewChange) -> io::Result<()> {
        match change {
            ViewChange::LogAppended(line) => writeln!(self.out, "{}", terminal_safe(line)),
            ViewChange::SessionId(id) => writeln!(self.out, "» session {}", terminal_safe(id)),
            ViewChange::SubmitControl { enabled: false, label } => {
                writeln!(self.out, "» {label}")
            }
            ViewChange::SubmitControl { enabled: true, .. } | ViewChange::ChannelState(_) => Ok(()),
            ViewChange::ResultShown(panel) => self.present_panel(panel),
            ViewChange::ResultCleared => writeln!(self.out, "» result cleared"),
            ViewChange::SubmissionFailed(message) => {
                writeln!(self.out, "» submission failed: {}", terminal_safe(message))
            }
        }
    }

    fn present_panel(&mut self, panel: &ResultPanel) -> io::Result<()> {
        writeln!(self.out, "» {}", terminal_safe(&panel.title))?;
        if let Some(warning) = &panel.warning {
            writeln!(self.out, "  {warning}")?;
        }
        for link in panel.links() {
            writeln!(self.out, "  {:<17} {}", format!("{}:", link.label), link.href)?;
        }
        Ok(())
    }
}

/// Plain-text rendering of `text` for a terminal: escape sequences and control
/// characters are dropped, and `\n`/`\r` are shown escaped so one value stays
/// on one line.
pub fn terminal_safe(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\x1b' => skip_escape(&mut chars),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push('\t'),
            ch if ch.is_control() => {}
            ch => output.push(ch),
        }
    }
    Cow::Owned(output)
}

/// Consume the rest of an escape sequence whose ESC was already read.
fn skip_escape(chars: &mut Peekable<Chars<'_>>) {
    match chars.next() {
        // CSI: parameters up to a final byte in `@..=~`.
        Some('[') => {
            for ch in chars.by_ref() {
                if ('@'..='~').contains(&ch) {
                    break;
                }
            }
        }
        // OSC, DCS, APC, PM: a string ended by BEL or ST (`ESC \`).
        Some(']' | 'P' | '_' | '^') => {
            while let Some(ch) = chars.next() {
                if ch == '\x07' {
                    break;
                }
                if ch == '\x1b' {
                    if chars.peek() == Some(&'\\') {
                        chars.next();
                    }
                    break;
                }
            }
        }
        _ => {}
    }
}
