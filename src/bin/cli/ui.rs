use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;

use leakpath::report::{LeakRecord, RecordSink};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

pub struct Ui {
    palette: Palette,
    paint: bool,
}

impl Ui {
    pub fn new(theme: Theme) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = match theme {
            Theme::Plain => false,
            Theme::Auto | Theme::Light | Theme::Dark => stdout_is_tty,
        };

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        Self { palette, paint }
    }

    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>key_width$}:")),
                    self.palette.value.paint(value)
                );
            } else {
                println!("  {key:>key_width$}: {value}");
            }
        }
    }

    pub fn success(&self, message: &str) {
        let prefix = if self.paint {
            self.palette.success.paint(SUCCESS_ICON)
        } else {
            Style::new().paint(SUCCESS_ICON)
        };
        println!("{prefix} {message}");
    }

    /// Prints a record as a status line followed by its indented stack.
    pub fn record(&self, record: &LeakRecord) {
        let status = format!("TEST-UNEXPECTED-{}", record.status);
        let head = format!("{} | {}", record.test, record.subtest);
        if self.paint {
            println!(
                "{} {} {} {}",
                self.palette.fail.paint(FAIL_ICON),
                self.palette.fail.paint(status),
                self.palette.heading.paint(head),
                record.message
            );
        } else {
            println!("{FAIL_ICON} {status} {head} {}", record.message);
        }
        for line in record.stack.lines() {
            if self.paint {
                println!("    {}", self.palette.value.paint(line));
            } else {
                println!("    {line}");
            }
        }
        if let Some(time) = record.time {
            println!("    (time {time} ms)");
        }
    }

    fn heading(&self, title: &str) {
        let formatted = format!("{HEADING_ICON} {title}");
        if self.paint {
            println!("{}", self.palette.heading.paint(formatted));
        } else {
            println!("{formatted}");
        }
    }
}

/// Record sink that prints through a [`Ui`].
pub struct TextSink<'a> {
    ui: &'a Ui,
}

impl<'a> TextSink<'a> {
    pub fn new(ui: &'a Ui) -> Self {
        Self { ui }
    }
}

impl RecordSink for TextSink<'_> {
    fn emit(&mut self, record: &LeakRecord) -> leakpath::Result<()> {
        self.ui.record(record);
        Ok(())
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    success: Style,
    fail: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            success: Style::new().fg(Color::LightGreen).bold(),
            fail: Style::new().fg(Color::LightRed).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            success: Style::new().fg(Color::Green).bold(),
            fail: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            success: Style::new(),
            fail: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const FAIL_ICON: &str = "✘";
