//! Console seam between the pipeline and the terminal.
//!
//! The workflow consumes opaque validated strings, booleans and indices;
//! the rendering itself lives behind this trait so tests can script a
//! whole run.

use std::io::{self, BufRead, Write};

pub trait Console {
    /// Display text to the user.
    fn say(&mut self, text: &str);

    /// Ask for one line of free text; an empty answer yields `default`.
    fn ask(&mut self, prompt: &str, default: &str) -> io::Result<String>;

    /// Yes/no question with a default for a bare Enter.
    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool>;

    /// Pick one of `count` options (1-based on screen, zero-based in the
    /// result). Re-prompts on invalid input without consuming state.
    fn select(&mut self, prompt: &str, count: usize, default: usize) -> io::Result<usize>;
}

/// Stdin/stdout implementation used by the binary.
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> io::Result<String> {
        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            // EOF: treat as an interrupted session.
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim().to_string())
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, prompt: &str, default: &str) -> io::Result<String> {
        print!("{}: ", prompt);
        io::stdout().flush()?;
        let answer = self.read_line()?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {}: ", prompt, hint);
            io::stdout().flush()?;
            match self.read_line()?.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => println!("Please answer y or n (got {:?}).", other),
            }
        }
    }

    fn select(&mut self, prompt: &str, count: usize, default: usize) -> io::Result<usize> {
        loop {
            print!("{} [1-{}] (default {}): ", prompt, count, default + 1);
            io::stdout().flush()?;
            let answer = self.read_line()?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => println!("Please enter a number between 1 and {}.", count),
            }
        }
    }
}
