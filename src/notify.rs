//! User-facing notifications
//!
//! Toasts, HUD messages and confirmation prompts are owned by whatever hosts
//! the library. Domain operations only talk to the [`Notifier`] trait.

use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStyle {
    Success,
    Failure,
}

/// A short status notice with an optional detail line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub style: ToastStyle,
    pub title: String,
    pub message: Option<String>,
}

impl Toast {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            style: ToastStyle::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn failure(title: impl Into<String>) -> Self {
        Self {
            style: ToastStyle::Failure,
            title: title.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A yes/no question guarding a destructive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub message: String,
    /// Label of the destructive confirm action
    pub action: String,
}

/// Host collaborator for notices and prompts
pub trait Notifier: Send + Sync {
    fn toast(&self, toast: Toast);

    /// One-line notice for background runs with no window to attach to
    fn hud(&self, message: &str);

    /// Ask before a destructive action; `false` means abort
    fn confirm(&self, confirmation: &Confirmation) -> bool;
}

/// Prints notices to the terminal and prompts on stdin
#[derive(Debug, Default, Clone)]
pub struct TerminalNotifier {
    /// Skip confirmation prompts (`--yes`)
    pub assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for TerminalNotifier {
    fn toast(&self, toast: Toast) {
        let detail = toast
            .message
            .map(|m| format!(" {}", m.dimmed()))
            .unwrap_or_default();

        match toast.style {
            ToastStyle::Success => println!("{} {}{}", "✓".green(), toast.title, detail),
            ToastStyle::Failure => eprintln!("{} {}{}", "✗".red(), toast.title, detail),
        }
    }

    fn hud(&self, message: &str) {
        println!("{}", message);
    }

    fn confirm(&self, confirmation: &Confirmation) -> bool {
        if self.assume_yes {
            return true;
        }

        println!("{}", confirmation.title.bold());
        println!("{}", confirmation.message);
        print!("{}? (y/N) ", confirmation.action.red());
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }

        input.trim().eq_ignore_ascii_case("y")
    }
}
