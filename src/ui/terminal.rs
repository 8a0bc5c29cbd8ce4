//! ui::terminal
//!
//! [`TerminalUi`]: the [`Ui`] drawn on stderr with crossterm.
//!
//! Every widget runs with the terminal in raw mode, restored by a guard on
//! every exit path. Keys:
//!
//! - Enter accepts, Esc and Ctrl-C interrupt
//! - Tab takes the first suggestion (text) or toggles (multi select)
//! - Up/Down move through options, typing filters them
//! - Space toggles an option in a multi select

use std::io::{self, Stderr, Write};

use chrono::{DateTime, Utc};
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

use super::prompts::{
    default_filter, ConvertFn, FilterFn, PromptError, SuggestFn, Ui, ValidateFn,
};

/// Puts the terminal back in cooked mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self, PromptError> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

enum Key {
    Accept,
    Interrupt,
    Tab,
    Up,
    Down,
    Backspace,
    ClearLine,
    Char(char),
    Other,
}

fn next_key() -> Result<Key, PromptError> {
    loop {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        {
            if kind == KeyEventKind::Release {
                continue;
            }
            let ctrl = modifiers.contains(KeyModifiers::CONTROL);
            return Ok(match code {
                KeyCode::Char('c') | KeyCode::Char('d') if ctrl => Key::Interrupt,
                KeyCode::Char('u') if ctrl => Key::ClearLine,
                KeyCode::Esc => Key::Interrupt,
                KeyCode::Enter => Key::Accept,
                KeyCode::Tab => Key::Tab,
                KeyCode::Up => Key::Up,
                KeyCode::Down => Key::Down,
                KeyCode::Backspace => Key::Backspace,
                KeyCode::Char(c) if !ctrl => Key::Char(c),
                _ => Key::Other,
            });
        }
    }
}

/// Redraws a block of lines in place.
struct Canvas {
    out: Stderr,
    drawn: u16,
}

impl Canvas {
    fn new() -> Self {
        Self {
            out: io::stderr(),
            drawn: 0,
        }
    }

    fn draw(&mut self, lines: &[String]) -> Result<(), PromptError> {
        if self.drawn > 1 {
            queue!(self.out, MoveUp(self.drawn - 1))?;
        }
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                queue!(self.out, Print("\r\n"))?;
            }
            queue!(self.out, Print(line))?;
        }
        self.out.flush()?;
        self.drawn = lines.len().max(1) as u16;
        Ok(())
    }

    /// Replace the block with a single summary line and move below it.
    fn finish(&mut self, summary: &str) -> Result<(), PromptError> {
        self.draw(&[summary.to_string()])?;
        execute!(self.out, Print("\r\n"))?;
        self.drawn = 0;
        Ok(())
    }
}

fn question(message: &str) -> String {
    format!("{} {}", "?".green(), message.bold())
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalUi {
    page_size: usize,
}

impl TerminalUi {
    /// `page_size` is the number of options shown at once.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    fn window(&self, selected: usize, len: usize) -> (usize, usize) {
        if len <= self.page_size {
            return (0, len);
        }
        let start = selected
            .saturating_sub(self.page_size / 2)
            .min(len - self.page_size);
        (start, start + self.page_size)
    }

    fn read_line(
        &self,
        message: &str,
        default: Option<&str>,
        suggest: Option<SuggestFn<'_>>,
        error: Option<&str>,
    ) -> Result<String, PromptError> {
        let _raw = RawMode::enable()?;
        let mut canvas = Canvas::new();
        let mut buffer = String::new();

        loop {
            let suggestion = match suggest {
                Some(suggest) if !buffer.is_empty() => suggest(&buffer).into_iter().next(),
                _ => None,
            };
            let mut line = question(message);
            if let Some(d) = default.filter(|d| !d.is_empty()) {
                line.push_str(&format!(" ({})", d).dark_grey().to_string());
            }
            line.push(' ');
            line.push_str(&buffer);
            if let Some(s) = &suggestion {
                if let Some(rest) = s.strip_prefix(buffer.as_str()) {
                    line.push_str(&rest.dark_grey().to_string());
                } else {
                    line.push_str(&format!("  [{s}]").dark_grey().to_string());
                }
            }
            let mut lines = vec![line];
            if let Some(e) = error {
                lines.push(format!(">> {e}").red().to_string());
            }
            canvas.draw(&lines)?;

            match next_key()? {
                Key::Interrupt => {
                    canvas.finish(&format!("{} {}", question(message), "^C".red()))?;
                    return Err(PromptError::Interrupted);
                }
                Key::Accept => {
                    let answer = if buffer.is_empty() {
                        default.unwrap_or_default().to_string()
                    } else {
                        buffer
                    };
                    canvas.finish(&format!("{} {}", question(message), answer.clone().cyan()))?;
                    return Ok(answer);
                }
                Key::Tab => {
                    if let Some(s) = suggestion {
                        buffer = s;
                    }
                }
                Key::Backspace => {
                    buffer.pop();
                }
                Key::ClearLine => buffer.clear(),
                Key::Char(c) => buffer.push(c),
                Key::Up | Key::Down | Key::Other => {}
            }
        }
    }

    fn pick(
        &self,
        message: &str,
        options: &[String],
        default: Option<&str>,
        filter: FilterFn<'_>,
        chosen: Option<&mut Vec<bool>>,
        error: Option<&str>,
    ) -> Result<Option<usize>, PromptError> {
        let _raw = RawMode::enable()?;
        let mut canvas = Canvas::new();
        let mut typed = String::new();
        let mut selected = default
            .and_then(|d| options.iter().position(|o| o == d))
            .unwrap_or(0);
        let multi = chosen.is_some();
        let mut marks = chosen;

        loop {
            let visible: Vec<usize> = (0..options.len())
                .filter(|&i| filter(&typed, &options[i]))
                .collect();
            let cursor = visible.iter().position(|&i| i == selected).unwrap_or(0);
            if let Some(&i) = visible.get(cursor) {
                selected = i;
            }

            let mut lines = vec![format!("{} {}", question(message), typed)];
            let (start, end) = self.window(cursor, visible.len());
            for &i in &visible[start..end] {
                let pointer = if i == selected { ">" } else { " " };
                let row = match marks.as_deref() {
                    Some(marks) => {
                        let check = if marks[i] { "[x]" } else { "[ ]" };
                        format!("{pointer} {check} {}", options[i])
                    }
                    None => format!("{pointer} {}", options[i]),
                };
                lines.push(if i == selected {
                    row.cyan().to_string()
                } else {
                    row
                });
            }
            if visible.is_empty() {
                lines.push("  no matching options".dark_grey().to_string());
            }
            if let Some(e) = error {
                lines.push(format!(">> {e}").red().to_string());
            }
            canvas.draw(&lines)?;

            match next_key()? {
                Key::Interrupt => {
                    canvas.finish(&format!("{} {}", question(message), "^C".red()))?;
                    return Err(PromptError::Interrupted);
                }
                Key::Accept => {
                    if multi {
                        canvas.finish(&question(message))?;
                        return Ok(None);
                    }
                    if visible.is_empty() {
                        continue;
                    }
                    let summary = format!("{} {}", question(message), options[selected].clone().cyan());
                    canvas.finish(&summary)?;
                    return Ok(Some(selected));
                }
                Key::Up => {
                    if cursor > 0 {
                        selected = visible[cursor - 1];
                    } else if let Some(&last) = visible.last() {
                        selected = last;
                    }
                }
                Key::Down => {
                    if cursor + 1 < visible.len() {
                        selected = visible[cursor + 1];
                    } else if let Some(&first) = visible.first() {
                        selected = first;
                    }
                }
                Key::Char(' ') | Key::Tab if multi => {
                    if let Some(marks) = marks.as_deref_mut() {
                        if visible.contains(&selected) {
                            marks[selected] = !marks[selected];
                        }
                    }
                }
                Key::Backspace => {
                    typed.pop();
                }
                Key::ClearLine => typed.clear(),
                Key::Char(c) => typed.push(c),
                Key::Tab | Key::Other => {}
            }
        }
    }
}

impl Ui for TerminalUi {
    fn ask_text(
        &self,
        message: &str,
        default: Option<&str>,
        suggest: Option<SuggestFn<'_>>,
    ) -> Result<String, PromptError> {
        self.read_line(message, default, suggest, None)
    }

    fn ask_date_time(
        &self,
        message: &str,
        default: Option<&str>,
        convert: ConvertFn<'_>,
    ) -> Result<Option<DateTime<Utc>>, PromptError> {
        let mut error: Option<String> = None;
        loop {
            let text = self.read_line(message, default, None, error.as_deref())?;
            match convert(text.trim()) {
                Ok(value) => return Ok(value),
                Err(e) => error = Some(e),
            }
        }
    }

    fn ask_int(&self, message: &str, default: i64) -> Result<i64, PromptError> {
        let default_text = default.to_string();
        let mut error: Option<String> = None;
        loop {
            let text = self.read_line(message, Some(&default_text), None, error.as_deref())?;
            match text.trim().parse::<i64>() {
                Ok(n) => return Ok(n),
                Err(_) => error = Some(format!("\"{}\" is not a whole number", text.trim())),
            }
        }
    }

    fn ask_from_options(
        &self,
        message: &str,
        options: &[String],
        default: Option<&str>,
        filter: Option<FilterFn<'_>>,
    ) -> Result<String, PromptError> {
        if options.is_empty() {
            return Err(PromptError::NoOptions);
        }
        let filter = filter.unwrap_or(&default_filter);
        let index = self.pick(message, options, default, filter, None, None)?;
        index
            .and_then(|i| options.get(i).cloned())
            .ok_or(PromptError::NoOptions)
    }

    fn ask_many_from_options(
        &self,
        message: &str,
        options: &[String],
        defaults: &[String],
        validate: Option<ValidateFn<'_>>,
    ) -> Result<Vec<String>, PromptError> {
        let mut marks: Vec<bool> = options.iter().map(|o| defaults.contains(o)).collect();
        let mut error: Option<String> = None;
        loop {
            self.pick(
                message,
                options,
                None,
                &default_filter,
                Some(&mut marks),
                error.as_deref(),
            )?;
            let picked: Vec<String> = options
                .iter()
                .zip(&marks)
                .filter(|(_, &m)| m)
                .map(|(o, _)| o.clone())
                .collect();
            match validate.map(|v| v(&picked)).unwrap_or(Ok(())) {
                Ok(()) => return Ok(picked),
                Err(e) => error = Some(e),
            }
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        let _raw = RawMode::enable()?;
        let mut canvas = Canvas::new();
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        canvas.draw(&[format!("{} {}", question(message), hint.dark_grey())])?;
        loop {
            let answer = match next_key()? {
                Key::Interrupt => {
                    canvas.finish(&format!("{} {}", question(message), "^C".red()))?;
                    return Err(PromptError::Interrupted);
                }
                Key::Accept => default,
                Key::Char('y') | Key::Char('Y') => true,
                Key::Char('n') | Key::Char('N') => false,
                _ => continue,
            };
            let word = if answer { "Yes" } else { "No" };
            canvas.finish(&format!("{} {}", question(message), word.cyan()))?;
            return Ok(answer);
        }
    }

    fn ask_secret(&self, message: &str) -> Result<String, PromptError> {
        let prompt = format!("{} ", question(message));
        Ok(rpassword::prompt_password(prompt)?)
    }
}
