//! Terminal implementation of the interaction surface
//!
//! Prompts and notices go to stderr; stdout is reserved for the JSON result.
//! Without a terminal every prompt is dismissed unless `--yes` answers the
//! conflict gates.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Mutex;

use crate::services::interaction::{Interaction, Notice, NoticeLevel, PickOption, Validator};

pub struct TerminalInteraction {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
    interactive: bool,
    assume_yes: bool,
    show_progress: bool,
}

impl TerminalInteraction {
    pub fn stdio(assume_yes: bool, show_progress: bool) -> Self {
        let interactive = io::stdin().is_terminal();
        Self {
            input: Mutex::new(Box::new(io::BufReader::new(io::stdin()))),
            output: Mutex::new(Box::new(io::stderr())),
            interactive,
            assume_yes,
            show_progress,
        }
    }

    pub fn with_io(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        assume_yes: bool,
    ) -> Self {
        Self {
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
            interactive: true,
            assume_yes,
            show_progress: false,
        }
    }

    fn say(&self, text: &str) {
        if let Ok(mut out) = self.output.lock() {
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        if !self.interactive {
            return None;
        }
        if let Ok(mut out) = self.output.lock() {
            let _ = write!(out, "{} ", prompt);
            let _ = out.flush();
        }

        let mut line = String::new();
        let read = self.input.lock().ok()?.read_line(&mut line).ok()?;
        if read == 0 {
            return None;
        }
        let answer = line.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }

    /// 1-based number or a case-insensitive label
    fn choose(&self, labels: &[&str]) -> Option<usize> {
        let answer = self.ask(&format!("Choose [1-{}]:", labels.len()))?;
        if let Ok(n) = answer.parse::<usize>() {
            return (1..=labels.len()).contains(&n).then(|| n - 1);
        }
        labels.iter().position(|l| l.eq_ignore_ascii_case(&answer))
    }
}

impl Interaction for TerminalInteraction {
    fn notify(&self, notice: &Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        self.say(&format!("{}: {}", prefix, notice.message));
    }

    fn confirm(&self, message: &str, options: &[&str]) -> Option<usize> {
        if self.assume_yes {
            tracing::debug!("Auto-confirmed: {}", message);
            return Some(0);
        }
        self.say(message);
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {}", i + 1, option));
        }
        self.choose(options)
    }

    fn pick_one(&self, title: &str, options: &[PickOption]) -> Option<usize> {
        self.say(title);
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {}  {}", i + 1, option.label, option.description));
        }
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        self.choose(&labels)
    }

    fn text_input(
        &self,
        prompt: &str,
        placeholder: &str,
        validator: Validator<'_>,
    ) -> Option<String> {
        loop {
            let answer = self.ask(&format!("{} ({}):", prompt, placeholder))?;
            match validator(&answer) {
                Ok(()) => return Some(answer),
                Err(message) => self.say(&message),
            }
        }
    }

    fn progress(&self, fraction: f32, message: &str) {
        if self.show_progress {
            self.say(&format!("[{:>3.0}%] {}", fraction * 100.0, message));
        }
    }
}
