//! Terminal output helpers shared by all commands

use console::style;

/// Output settings passed to all commands
pub struct AppContext {
    pub quiet: bool,
}

impl AppContext {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }

    /// Errors are printed even in quiet mode.
    pub fn print_error(&self, msg: &str) {
        eprintln!("{}", style(msg).red());
    }
}
