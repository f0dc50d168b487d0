// user_interaction.rs
use crate::error::{Result, RollerError};
use crate::menu::{Menu, MenuEntry, PromptProvider};
use fuzzywuzzy::fuzz;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};

const FUZZY_THRESHOLD: u8 = 80;
const DIVIDER_WIDTH: usize = 100;

/// Prompts on the terminal with line editing and history.
pub struct ConsolePrompt {
    editor: DefaultEditor,
}

impl ConsolePrompt {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl PromptProvider for ConsolePrompt {
    fn select<'m, D>(&mut self, menu: &'m Menu<D>) -> Result<&'m MenuEntry<D>> {
        // ANSI escape codes for styling
        let bold_orange = "\x1b[1;38;5;208m";
        let reset = "\x1b[0m";
        let prompt = format!("  {}>{} ", bold_orange, reset);

        loop {
            print!("{}", render_menu(menu));
            let _ = io::stdout().flush();
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());
                    if let Some(entry) = resolve_choice(menu, &line) {
                        return Ok(entry);
                    }
                    print_insight_level_2(&format!("'{}' is not one of the choices, bro.", line.trim()));
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    return Err(RollerError::InputClosed);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn show_roll(&mut self, rolled: &str) {
        println!("{}", framed(rolled));
    }

    fn report(&mut self, problem: &RollerError) {
        println!();
        print_insight(&problem.to_string());
        if problem.is_recoverable() {
            print_insight_level_2("Pick a different path or fix the workbook.");
        }
    }

    fn show_restart(&mut self) {
        println!("{}", divider());
    }
}

pub fn divider() -> String {
    format!("\n  {}", "-".repeat(DIVIDER_WIDTH))
}

pub fn framed(rolled: &str) -> String {
    let rule = "-".repeat(rolled.chars().count());
    format!("\n  {}\n  {}\n  {}", rule, rolled, rule)
}

/// Keys are right-aligned in a five column gutter; control entries sit
/// after a blank line.
pub fn render_menu<D>(menu: &Menu<D>) -> String {
    let mut text = if menu.title().is_empty() {
        "\n  select one of the following:\n".to_string()
    } else {
        format!("\n  [{}] select one of the following:\n", menu.title())
    };

    for (index, entry) in menu.entries().iter().enumerate() {
        if menu.break_at() == Some(index) {
            text.push('\n');
        }
        text.push_str(&format!("{:>5}) {}\n", entry.key, entry.label));
    }
    text.push('\n');
    text
}

/// Exact key first, then the closest label if it is close enough.
pub fn resolve_choice<'m, D>(menu: &'m Menu<D>, input: &str) -> Option<&'m MenuEntry<D>> {
    let choice = input.trim();
    if choice.is_empty() {
        return None;
    }
    if let Some(entry) = menu.find(choice) {
        return Some(entry);
    }

    let choice = choice.to_lowercase();
    menu.entries()
        .iter()
        .map(|entry| (entry, fuzz::ratio(&choice, &entry.label.to_lowercase())))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .max_by_key(|(_, score)| *score)
        .map(|(entry, _)| entry)
}

/// Prints a message in bold orange font.
pub fn print_insight(message: &str) {
    let bold_orange = "\x1b[1;38;5;208m";
    let reset = "\x1b[0m";

    println!("  {}{}{}", bold_orange, message, reset);
}

pub fn print_insight_level_2(message: &str) {
    let orange = "\x1b[0;38;5;208m";
    let reset = "\x1b[0m";

    println!("    {}{}{}", orange, message, reset);
}
