// src/prompt.rs

//! Operator interaction
//!
//! Command flows never read the terminal directly. Every question goes
//! through the [`Prompter`] trait, so the same flow runs against a real
//! terminal, a prepared answer script, or a test double. Implementations
//! own input validation: a yes/no question only ever yields a bool, a menu
//! only ever yields an in-range choice.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Invalid answers a scripted run may burn per question before giving up.
const SCRIPT_RETRY_BUDGET: usize = 3;

/// Outcome of a numbered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Zero-based index of the chosen entry.
    Item(usize),
    /// The "all of them" entry.
    All,
    /// The explicit "none of them" escape.
    None,
}

/// Questions a command flow may ask the operator.
pub trait Prompter {
    /// Ask a yes/no question, re-prompting until the answer parses.
    fn ask_yes_no(&self, question: &str) -> Result<bool>;

    /// Ask for one line of free text.
    fn ask_line(&self, prompt: &str) -> Result<String>;

    /// Ask for one non-empty line, re-prompting on empty input.
    fn ask_nonempty(&self, prompt: &str) -> Result<String>;

    /// Present a numbered menu and return a validated choice.
    ///
    /// Entries are numbered from 1. The menu always carries a "none of
    /// them" escape as its last number; `allow_all` inserts an "all of
    /// them" entry before it. Out-of-range input repeats the prompt.
    fn ask_menu(&self, header: &str, entries: &[String], allow_all: bool) -> Result<MenuChoice>;
}

/// Index of the "all of them" menu entry, when present.
fn menu_all_index(entries: usize, allow_all: bool) -> Option<usize> {
    allow_all.then_some(entries + 1)
}

/// Index of the "none of them" escape, always the last number.
fn menu_none_index(entries: usize, allow_all: bool) -> usize {
    entries + 1 + usize::from(allow_all)
}

/// Map one numeric answer onto a menu choice, if it is in range.
fn parse_menu_answer(
    answer: &str,
    entries: usize,
    allow_all: bool,
) -> Option<MenuChoice> {
    let number: usize = answer.parse().ok()?;
    if (1..=entries).contains(&number) {
        return Some(MenuChoice::Item(number - 1));
    }
    if menu_all_index(entries, allow_all) == Some(number) {
        return Some(MenuChoice::All);
    }
    if number == menu_none_index(entries, allow_all) {
        return Some(MenuChoice::None);
    }
    None
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Prompter backed by stdin/stdout. Re-prompts indefinitely on invalid
/// input; a closed stdin aborts instead of spinning.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_answer(prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut input = String::new();
        let read = io::stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Err(Error::Aborted("standard input closed".to_string()));
        }
        Ok(input.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn ask_yes_no(&self, question: &str) -> Result<bool> {
        loop {
            let answer = Self::read_answer(&format!("{question} (y/n) "))?;
            match parse_yes_no(&answer) {
                Some(choice) => return Ok(choice),
                None => println!("Please answer y or n."),
            }
        }
    }

    fn ask_line(&self, prompt: &str) -> Result<String> {
        Self::read_answer(&format!("{prompt} "))
    }

    fn ask_nonempty(&self, prompt: &str) -> Result<String> {
        loop {
            let answer = self.ask_line(prompt)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            println!("A value is required.");
        }
    }

    fn ask_menu(&self, header: &str, entries: &[String], allow_all: bool) -> Result<MenuChoice> {
        println!("{header}");
        for (index, entry) in entries.iter().enumerate() {
            println!("  {}) {}", index + 1, entry);
        }
        if let Some(all) = menu_all_index(entries.len(), allow_all) {
            println!("  {all}) all of them");
        }
        let none = menu_none_index(entries.len(), allow_all);
        println!("  {none}) none of them");

        loop {
            let answer = Self::read_answer(&format!("Enter a number (1-{none}): "))?;
            match parse_menu_answer(&answer, entries.len(), allow_all) {
                Some(choice) => return Ok(choice),
                None => println!("Please enter a number between 1 and {none}."),
            }
        }
    }
}

/// Prompter answering from a prepared queue, for scripted runs and tests.
///
/// Invalid answers are re-tried like on a terminal, but only within a
/// bounded budget per question; a script that runs dry aborts.
#[derive(Debug)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    retry_budget: usize,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            retry_budget: SCRIPT_RETRY_BUDGET,
        }
    }

    /// Override the invalid-answer budget.
    pub fn with_retry_budget(mut self, budget: usize) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Answers not yet consumed. Lets callers assert a script ran dry.
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next_answer(&self, prompt: &str) -> Result<String> {
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Aborted(format!("no scripted answer left for: {prompt}")))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_yes_no(&self, question: &str) -> Result<bool> {
        for _ in 0..=self.retry_budget {
            if let Some(choice) = parse_yes_no(&self.next_answer(question)?) {
                return Ok(choice);
            }
        }
        Err(Error::Aborted(format!(
            "too many invalid answers for: {question}"
        )))
    }

    fn ask_line(&self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn ask_nonempty(&self, prompt: &str) -> Result<String> {
        for _ in 0..=self.retry_budget {
            let answer = self.next_answer(prompt)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
        }
        Err(Error::Aborted(format!(
            "too many invalid answers for: {prompt}"
        )))
    }

    fn ask_menu(&self, header: &str, entries: &[String], allow_all: bool) -> Result<MenuChoice> {
        for _ in 0..=self.retry_budget {
            let answer = self.next_answer(header)?;
            if let Some(choice) = parse_menu_answer(&answer, entries.len(), allow_all) {
                return Ok(choice);
            }
        }
        Err(Error::Aborted(format!(
            "too many invalid answers for: {header}"
        )))
    }
}
