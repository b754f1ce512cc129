use colored::*;
use std::process::exit;

/// Console messages for the command-line tools, written to stderr so they never
/// mix with circuit output on stdout.
///
/// Levels: 1 completion, 2 info, 3 warning, 4 error, 5 fatal error.
#[derive(Clone, Copy)]
pub struct Logger {
    level: i8,
    enabled: bool,
}

fn label(message: &str, level: i8) -> ColoredString {
    let tag = match level {
        1 => "completion",
        2 => "info",
        3 => "warning",
        4 => "error",
        5 => "fatal error",
        _ => return message.red().bold().italic(),
    };
    let text = format!("{}: {}", tag, message);
    match level {
        1 => text.bright_green(),
        2 => text.bright_cyan(),
        3 => text.bright_yellow(),
        4 => text.bright_red(),
        _ => text.red().bold(),
    }
}

impl Logger {
    pub fn new(enabled: bool, level: i8) -> Logger {
        Logger { level, enabled }
    }

    /// A logger that still reports errors but nothing below them.
    pub fn quiet() -> Logger {
        Logger::new(false, 4)
    }

    /// Prints an error whether or not the logger is enabled; levels above 3
    /// end the program with exit status 1.
    ///
    /// # Arguments
    ///
    /// * `error` - the error message
    /// * `level` - the error level, higher means more severe
    pub fn raise_error(&self, error: &str, level: i8) {
        eprintln!("{}", label(error, level));
        if level > 3 {
            exit(1);
        }
    }

    pub fn log(&self, message: &str, level: i8) {
        if level > 3 {
            self.raise_error(message, level);
        }
        if self.should_print(level) {
            eprintln!("{}", label(message, level));
        }
    }

    fn should_print(&self, level: i8) -> bool {
        self.enabled && level >= self.level
    }
}
