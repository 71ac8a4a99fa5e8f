//! CLI styles and help text helpers.

use clap::builder::styling::{AnsiColor, Color, Style, Styles};

//--------------------------------------------------------------------------------------------------
// Macros
//--------------------------------------------------------------------------------------------------

/// Build an "Examples:" help section from `"command" # "description"` pairs.
#[macro_export]
macro_rules! examples {
    ($($cmd:literal # $desc:literal),* $(,)?) => {
        concat!(
            "\x1b[1;33mExamples:\x1b[0m\n",
            $("  \x1b[36m", $cmd, "\x1b[0m  ", $desc, "\n"),*
        )
    };
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

pub fn styles() -> Styles {
    let bold = |color| Style::new().bold().fg_color(Some(Color::Ansi(color)));
    let plain = |color| Style::new().fg_color(Some(Color::Ansi(color)));

    Styles::styled()
        .header(bold(AnsiColor::Yellow))
        .usage(bold(AnsiColor::Green))
        .literal(plain(AnsiColor::Cyan))
        .placeholder(plain(AnsiColor::Cyan))
        .error(bold(AnsiColor::Red))
        .invalid(bold(AnsiColor::Red))
        .valid(bold(AnsiColor::Green))
}
