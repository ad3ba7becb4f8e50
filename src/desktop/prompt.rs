use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::update::{ReleaseDescriptor, UpdateDialog, UserInterface};

/// Terminal stand-in for the update dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt {
    assume_yes: bool,
}

impl ConsolePrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserInterface for ConsolePrompt {
    fn confirm_update(&self, dialog: &UpdateDialog, release: &ReleaseDescriptor) -> bool {
        println!();
        println!("{} {}", "↑".yellow(), dialog.title.bold());
        println!("  {}", dialog.message);
        println!("  {} {}", "version:".dimmed(), release.version.green());
        if let Some(name) = &release.asset_name {
            println!("  {} {}", "asset:".dimmed(), name);
        }
        println!();

        if self.assume_yes {
            return true;
        }

        print!(
            "{} [{}] {} / [{}] {}: ",
            "?".yellow().bold(),
            "y".cyan(),
            dialog.positive_label,
            "N".dimmed(),
            dialog.negative_label
        );
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }
        parse_answer(&input)
    }

    fn show_message(&self, message: &str) {
        eprintln!("{} {}", "!".red().bold(), message);
    }
}

fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
