//! ui::scripted
//!
//! [`ScriptedUi`]: a [`Ui`] that answers from a queue, for tests.
//!
//! Each prompt pops the next [`Answer`] and records what was asked. Text
//! answers go through the same conversion and validation callbacks the
//! terminal uses, so a rejected answer makes the prompt pop again.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::prompts::{
    default_filter, ConvertFn, FilterFn, PromptError, SuggestFn, Ui, ValidateFn,
};

/// A canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Typed text (text, date-time and int prompts).
    Text(String),
    /// Press Enter on an empty line or keep the preselected option.
    Default,
    /// Take the first suggestion for the given typed prefix.
    Suggestion(String),
    /// Type a filter and pick the first visible option.
    Filter(String),
    /// Pick exactly this option.
    Select(String),
    /// Pick these options.
    Many(Vec<String>),
    Confirm(bool),
    Interrupt,
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }

    pub fn select(s: impl Into<String>) -> Self {
        Answer::Select(s.into())
    }
}

/// A prompt as it was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asked {
    pub message: String,
    pub default: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedUi {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<Asked>>,
}

impl ScriptedUi {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt shown so far, in order.
    pub fn asked(&self) -> Vec<Asked> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.asked().into_iter().map(|a| a.message).collect()
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }

    fn next(
        &self,
        message: &str,
        default: Option<&str>,
        options: &[String],
    ) -> Result<Answer, PromptError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(Asked {
                message: message.to_string(),
                default: default.map(String::from),
                options: options.to_vec(),
            });
        }
        let answer = self
            .answers
            .lock()
            .map_err(|_| PromptError::IoError("script poisoned".into()))?
            .pop_front()
            .ok_or_else(|| PromptError::IoError(format!("no scripted answer for \"{message}\"")))?;
        match answer {
            Answer::Interrupt => Err(PromptError::Interrupted),
            other => Ok(other),
        }
    }
}

fn unexpected(message: &str, answer: &Answer) -> PromptError {
    PromptError::IoError(format!("unexpected answer {answer:?} for \"{message}\""))
}

impl Ui for ScriptedUi {
    fn ask_text(
        &self,
        message: &str,
        default: Option<&str>,
        suggest: Option<SuggestFn<'_>>,
    ) -> Result<String, PromptError> {
        match self.next(message, default, &[])? {
            Answer::Text(t) if t.is_empty() => Ok(default.unwrap_or_default().to_string()),
            Answer::Text(t) => Ok(t),
            Answer::Default => Ok(default.unwrap_or_default().to_string()),
            Answer::Suggestion(prefix) => Ok(suggest
                .and_then(|s| s(&prefix).into_iter().next())
                .unwrap_or(prefix)),
            other => Err(unexpected(message, &other)),
        }
    }

    fn ask_date_time(
        &self,
        message: &str,
        default: Option<&str>,
        convert: ConvertFn<'_>,
    ) -> Result<Option<DateTime<Utc>>, PromptError> {
        loop {
            let text = match self.next(message, default, &[])? {
                Answer::Text(t) if t.is_empty() => default.unwrap_or_default().to_string(),
                Answer::Text(t) => t,
                Answer::Default => default.unwrap_or_default().to_string(),
                other => return Err(unexpected(message, &other)),
            };
            if let Ok(value) = convert(text.trim()) {
                return Ok(value);
            }
        }
    }

    fn ask_int(&self, message: &str, default: i64) -> Result<i64, PromptError> {
        let default_text = default.to_string();
        loop {
            match self.next(message, Some(&default_text), &[])? {
                Answer::Default => return Ok(default),
                Answer::Text(t) => {
                    if let Ok(n) = t.trim().parse() {
                        return Ok(n);
                    }
                }
                other => return Err(unexpected(message, &other)),
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
        match self.next(message, default, options)? {
            Answer::Default => Ok(default
                .filter(|d| options.iter().any(|o| o == d))
                .unwrap_or(options[0].as_str())
                .to_string()),
            Answer::Select(s) if options.contains(&s) => Ok(s),
            Answer::Filter(typed) => options
                .iter()
                .find(|o| filter(&typed, o.as_str()))
                .cloned()
                .ok_or_else(|| PromptError::IoError(format!("no option matches \"{typed}\""))),
            other => Err(unexpected(message, &other)),
        }
    }

    fn ask_many_from_options(
        &self,
        message: &str,
        options: &[String],
        defaults: &[String],
        validate: Option<ValidateFn<'_>>,
    ) -> Result<Vec<String>, PromptError> {
        loop {
            let picked: Vec<String> = match self.next(message, None, options)? {
                Answer::Default => options
                    .iter()
                    .filter(|o| defaults.contains(o))
                    .cloned()
                    .collect(),
                Answer::Many(chosen) => options
                    .iter()
                    .filter(|o| chosen.contains(o))
                    .cloned()
                    .collect(),
                other => return Err(unexpected(message, &other)),
            };
            if validate.map(|v| v(&picked)).unwrap_or(Ok(())).is_ok() {
                return Ok(picked);
            }
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        match self.next(message, None, &[])? {
            Answer::Confirm(b) => Ok(b),
            Answer::Default => Ok(default),
            other => Err(unexpected(message, &other)),
        }
    }

    fn ask_secret(&self, message: &str) -> Result<String, PromptError> {
        match self.next(message, None, &[])? {
            Answer::Text(t) => Ok(t),
            other => Err(unexpected(message, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejected_dates_are_asked_again() {
        let ui = ScriptedUi::new([Answer::text("garbage"), Answer::text("ok")]);
        let convert = |s: &str| {
            if s == "ok" {
                Ok(Some(epoch()))
            } else {
                Err("bad".to_string())
            }
        };
        let got = ui.ask_date_time("Start", None, &convert).unwrap();
        assert_eq!(got, Some(epoch()));
        assert_eq!(ui.messages(), vec!["Start", "Start"]);
    }

    #[test]
    fn filter_uses_normalized_terms() {
        let ui = ScriptedUi::new([Answer::Filter("acao".into())]);
        let got = ui
            .ask_from_options("Project", &opts(&["Other", "Ação Social"]), None, None)
            .unwrap();
        assert_eq!(got, "Ação Social");
    }

    #[test]
    fn many_keeps_option_order() {
        let ui = ScriptedUi::new([Answer::Many(opts(&["b", "a"]))]);
        let got = ui
            .ask_many_from_options("Tags", &opts(&["a", "b", "c"]), &[], None)
            .unwrap();
        assert_eq!(got, opts(&["a", "b"]));
    }

    #[test]
    fn interrupt_and_exhaustion() {
        let ui = ScriptedUi::new([Answer::Interrupt]);
        assert!(matches!(
            ui.confirm("Sure?", false),
            Err(PromptError::Interrupted)
        ));
        assert!(matches!(
            ui.confirm("Sure?", false),
            Err(PromptError::IoError(_))
        ));
    }

    #[test]
    fn suggestion_is_taken() {
        let ui = ScriptedUi::new([Answer::Suggestion("wri".into())]);
        let suggest = |p: &str| vec![format!("{p}ting docs")];
        assert_eq!(
            ui.ask_text("Description", None, Some(&suggest)).unwrap(),
            "writing docs"
        );
    }
}
