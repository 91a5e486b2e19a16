//! Diagnostic reporter: level-tagged messages with span excerpts, rendered
//! through a colour [`Sink`]. Grounded on `core/src/ui/cli.rs`'s use of the
//! `term` crate for bold/coloured terminal output.

use std::fmt;

use term::{color, Attr, StdoutTerminal};

use super::Span;

/// Minimum number of context lines printed before/after a span, per
/// spec.md §4.1 ("a policy constant ≥ 1").
pub const REPORT_CONTEXT_LINES: usize = 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Level {
    Error,
    Warn,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warn => write!(f, "warn"),
            Level::Info => write!(f, "info"),
        }
    }
}

/// Rendering sink for diagnostics. Separated from [`Reporter`] so the
/// reporter itself stays a plain data-and-counting object (Design Notes
/// §9: "the colour styling belongs to a rendering sink, not to the
/// reporter").
pub trait Sink {
    fn write(&mut self, text: &str);
    fn set_color(&mut self, level: Level);
    fn bold(&mut self);
    fn reset(&mut self);

    fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }
}

/// Terminal sink using the `term` crate, matching `core/src/ui/cli.rs`.
pub struct TermSink {
    terminal: Option<Box<StdoutTerminal>>,
}

impl TermSink {
    pub fn new() -> Self {
        TermSink {
            terminal: term::stdout(),
        }
    }
}

impl Sink for TermSink {
    fn write(&mut self, text: &str) {
        if let Some(terminal) = &mut self.terminal {
            let _ = write!(terminal, "{}", text);
        } else {
            print!("{}", text);
        }
    }

    fn set_color(&mut self, level: Level) {
        if let Some(terminal) = &mut self.terminal {
            let color = match level {
                Level::Error => color::RED,
                Level::Warn => color::YELLOW,
                Level::Info => color::BLUE,
            };
            let _ = terminal.fg(color);
            let _ = terminal.attr(Attr::Bold);
        }
    }

    fn bold(&mut self) {
        if let Some(terminal) = &mut self.terminal {
            let _ = terminal.attr(Attr::Bold);
        }
    }

    fn reset(&mut self) {
        if let Some(terminal) = &mut self.terminal {
            let _ = terminal.reset();
        }
    }
}

/// Threaded through the pipeline by `&mut` reference (Design Notes §9);
/// only the CLI driver instantiates one.
#[derive(Default)]
pub struct Reporter {
    errors: u32,
    warns: u32,
    infos: u32,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn reset(&mut self) {
        self.errors = 0;
        self.warns = 0;
        self.infos = 0;
    }

    pub fn count(&self, level: Level) -> u32 {
        match level {
            Level::Error => self.errors,
            Level::Warn => self.warns,
            Level::Info => self.infos,
        }
    }

    fn bump(&mut self, level: Level) {
        match level {
            Level::Error => self.errors += 1,
            Level::Warn => self.warns += 1,
            Level::Info => self.infos += 1,
        }
    }

    /// Reports a message with no source position.
    pub fn report_no_span(&mut self, sink: &mut dyn Sink, level: Level, message: &str) {
        self.bump(level);
        sink.set_color(level);
        sink.write(&level.to_string());
        sink.reset();
        sink.writeln(&format!(": {}", message));
    }

    /// Reports a message anchored at `span`, with a code excerpt.
    pub fn report(&mut self, sink: &mut dyn Sink, span: Span<'_>, level: Level, message: &str) {
        self.bump(level);

        sink.set_color(level);
        sink.write(&level.to_string());
        sink.reset();
        sink.write(&format!(": {}\n  -> ", message));
        sink.bold();
        sink.write(&format!(
            "{} [{}:{}]",
            span.file.path,
            span.from.lineno + 1,
            span.from.line_index + 1
        ));
        sink.reset();
        sink.writeln("");

        self.render_excerpt(sink, span);
    }

    fn render_excerpt(&self, sink: &mut dyn Sink, span: Span<'_>) {
        let lines = &span.file.lines;
        let line_start = span.from.lineno.saturating_sub(REPORT_CONTEXT_LINES);
        let line_end = (span.to.lineno + REPORT_CONTEXT_LINES).min(lines.len().saturating_sub(1));

        let mut blank_run = false;
        for lineno in line_start..=line_end {
            let content = &lines[lineno];
            let inside = lineno >= span.from.lineno && lineno <= span.to.lineno;

            if !inside && content.trim().is_empty() {
                if blank_run {
                    continue;
                }
                blank_run = true;
                sink.writeln(" ...");
                continue;
            }
            blank_run = false;

            sink.write(&format!(" {:<4} ", lineno + 1));
            if !inside {
                sink.write(content);
            } else if lineno == span.from.lineno && lineno == span.to.lineno {
                sink.write(&content[..span.from.line_index]);
                sink.bold();
                sink.write(&content[span.from.line_index..span.to.line_index]);
                sink.reset();
                sink.write(&content[span.to.line_index..]);
            } else if lineno == span.from.lineno {
                sink.write(&content[..span.from.line_index]);
                sink.bold();
                sink.write(&content[span.from.line_index..]);
                sink.reset();
            } else if lineno == span.to.lineno {
                sink.bold();
                sink.write(&content[..span.to.line_index]);
                sink.reset();
                sink.write(&content[span.to.line_index..]);
            } else {
                sink.bold();
                sink.write(content);
                sink.reset();
            }
            sink.writeln("");
        }
    }

    /// "N error(s) generated" summary, matching the original driver output.
    pub fn summary(&self) -> String {
        format!(
            "{} {} generated",
            self.errors,
            if self.errors == 1 { "error" } else { "errors" }
        )
    }
}
