//! ui::format
//!
//! Renders entities for the output flags: a text table (default),
//! `--json`, `--csv`, `--quiet` (ids only) and `--format <template>`.
//!
//! Templates substitute `{field}` placeholders with values taken from the
//! JSON form of each record. Dotted paths reach nested values
//! (`{project.name}`, `{timeInterval.start}`, `{tags.0.name}`).

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;

use crate::core::timefmt::{format_duration, Zone};
use crate::core::types::{
    Client, Project, Tag, Task, TimeEntry, TimeEntryHydrated, User, Workspace,
};

/// Which sink the output goes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Quiet,
    Template(String),
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Settings that change how records render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub show_task: bool,
    pub show_total_duration: bool,
    pub zone: Zone,
    /// Running entries are measured up to this instant.
    pub now: DateTime<Utc>,
    /// Language tag deciding the decimal separator.
    pub lang: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_task: false,
            show_total_duration: false,
            zone: Zone::Local,
            now: Utc::now(),
            lang: "en".to_string(),
        }
    }
}

/// A record that can be shown in every output format.
pub trait Record: Serialize {
    fn id(&self) -> &str;

    fn headers(opts: &RenderOptions) -> Vec<&'static str>;

    fn row(&self, opts: &RenderOptions) -> Vec<String>;

    /// Extra line printed under the table.
    fn footer(_items: &[Self], _opts: &RenderOptions) -> Option<String>
    where
        Self: Sized,
    {
        None
    }
}

/// Render a list of records.
pub fn render<T: Record>(
    items: &[T],
    format: &OutputFormat,
    opts: &RenderOptions,
) -> Result<String, FormatError> {
    let out = match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(T::headers(opts));
            for item in items {
                builder.push_record(item.row(opts));
            }
            let mut table = builder.build();
            table.with(Style::sharp());
            let mut out = table.to_string();
            if let Some(footer) = T::footer(items, opts) {
                out.push('\n');
                out.push_str(&footer);
            }
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(items)?,
        OutputFormat::Csv => {
            let mut lines = vec![csv_line(T::headers(opts).into_iter().map(String::from))];
            lines.extend(items.iter().map(|item| csv_line(item.row(opts))));
            lines.join("\n")
        }
        OutputFormat::Quiet => items
            .iter()
            .map(|item| item.id().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Template(template) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                lines.push(fill_template(template, &serde_json::to_value(item)?));
            }
            lines.join("\n")
        }
    };
    Ok(out)
}

/// Render a single record. JSON output is an object rather than an array.
pub fn render_one<T: Record>(
    item: &T,
    format: &OutputFormat,
    opts: &RenderOptions,
) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(item)?),
        other => render(std::slice::from_ref(item), other, opts),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: impl IntoIterator<Item = String>) -> String {
    fields
        .into_iter()
        .map(|f| csv_field(&f))
        .collect::<Vec<_>>()
        .join(",")
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_.]+)\}").unwrap_or_else(|_| unreachable!())
    })
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute `{path}` placeholders; unknown paths become empty.
pub fn fill_template(template: &str, value: &Value) -> String {
    let template = template.replace("\\n", "\n").replace("\\t", "\t");
    placeholder_regex()
        .replace_all(&template, |caps: &regex::Captures<'_>| {
            lookup(value, &caps[1]).map(plain).unwrap_or_default()
        })
        .into_owned()
}

fn yes_no(value: bool) -> String {
    let word = if value { "yes" } else { "no" };
    word.to_string()
}

// --------------------------------------------------------------------------
// Records
// --------------------------------------------------------------------------

impl Record for Workspace {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![self.id.clone(), self.name.clone()]
    }
}

impl Record for Client {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME", "ARCHIVED"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), yes_no(self.archived)]
    }
}

impl Record for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME", "CLIENT", "BILLABLE", "ARCHIVED"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.client_label().to_string(),
            yes_no(self.billable),
            yes_no(self.archived),
        ]
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME", "STATUS", "ESTIMATE"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status.to_string(),
            self.estimate.clone().unwrap_or_default(),
        ]
    }
}

impl Record for Tag {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME", "ARCHIVED"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), yes_no(self.archived)]
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "NAME", "EMAIL", "STATUS"]
    }

    fn row(&self, _opts: &RenderOptions) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.email.clone(),
            self.status.clone(),
        ]
    }
}

impl Record for TimeEntryHydrated {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(opts: &RenderOptions) -> Vec<&'static str> {
        let mut headers = vec!["ID", "START", "END", "DUR", "PROJECT"];
        if opts.show_task {
            headers.push("TASK");
        }
        headers.extend(["DESCRIPTION", "TAGS"]);
        headers
    }

    fn row(&self, opts: &RenderOptions) -> Vec<String> {
        let stamp = |t: DateTime<Utc>| opts.zone.to_local(t).format("%Y-%m-%d %H:%M:%S").to_string();
        let interval = &self.time_interval;
        let mut row = vec![
            self.id.clone(),
            stamp(interval.start),
            interval.end.map(stamp).unwrap_or_else(|| "now".to_string()),
            format_duration(interval.duration(opts.now)),
            self.project
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        ];
        if opts.show_task {
            row.push(self.task.as_ref().map(|t| t.name.clone()).unwrap_or_default());
        }
        row.push(self.description.clone());
        row.push(
            self.tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        row
    }

    fn footer(items: &[Self], opts: &RenderOptions) -> Option<String> {
        if !opts.show_total_duration {
            return None;
        }
        let total = total_duration(items, opts.now);
        Some(format!(
            "TOTAL: {} ({} h)",
            format_duration(total),
            decimal_hours(total, &opts.lang)
        ))
    }
}

/// Languages writing `1,5` rather than `1.5`.
const COMMA_DECIMALS: [&str; 20] = [
    "cs", "da", "de", "el", "es", "fi", "fr", "hu", "id", "it", "nb", "nl", "no", "pl", "pt",
    "ro", "ru", "sv", "tr", "uk",
];

/// Decimal separator for a tag such as `en`, `pt-BR` or `de_DE`.
pub fn decimal_separator(lang: &str) -> char {
    let primary = lang
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if COMMA_DECIMALS.contains(&primary.as_str()) {
        ','
    } else {
        '.'
    }
}

/// `duration` in hours with two decimals.
pub fn decimal_hours(duration: chrono::Duration, lang: &str) -> String {
    let hours = duration.num_seconds() as f64 / 3600.0;
    format!("{hours:.2}").replace('.', &decimal_separator(lang).to_string())
}

/// The unhydrated view: ids instead of names.
impl Record for TimeEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(_opts: &RenderOptions) -> Vec<&'static str> {
        vec!["ID", "START", "END", "DUR", "PROJECT", "DESCRIPTION", "TAGS"]
    }

    fn row(&self, opts: &RenderOptions) -> Vec<String> {
        let stamp = |t: DateTime<Utc>| opts.zone.to_local(t).format("%Y-%m-%d %H:%M:%S").to_string();
        let interval = &self.time_interval;
        vec![
            self.id.clone(),
            stamp(interval.start),
            interval.end.map(stamp).unwrap_or_else(|| "now".to_string()),
            format_duration(interval.duration(opts.now)),
            self.project_id.clone().unwrap_or_default(),
            self.description.clone(),
            self.tag_ids.join(", "),
        ]
    }
}

/// Sum of the entries' durations.
pub fn total_duration(entries: &[TimeEntryHydrated], now: DateTime<Utc>) -> chrono::Duration {
    entries
        .iter()
        .map(|e| e.time_interval.duration(now))
        .fold(chrono::Duration::zero(), |acc, d| acc + d)
}
