//! engine::steps::prompt

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::Transformer;
use crate::api::{Api, GetUserTimeEntries, PaginationParam};
use crate::core::timefmt::{parse_instant, Zone};
use crate::engine::draft::TimeEntryDraft;
use crate::engine::pipeline::PipelineError;
use crate::search::{is_similar, normalize, Candidate, Resolver};
use crate::ui::Ui;

const NO_PROJECT: &str = "No Project";
const NO_TASK: &str = "No Task";

/// What the prompt step asks and how it reads answers.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub zone: Zone,
    pub now: DateTime<Utc>,
    /// Days of past entries offered as description suggestions; 0 disables.
    pub autocomplete_days: u32,
    /// The entry must end (manual entries).
    pub require_end: bool,
    /// Ask for confirmation before submitting.
    pub confirm: bool,
}

/// Ask for every field, offering the current value as the default.
///
/// Project, task and tag prompts list the same candidates the resolver
/// matches against. Interrupting any prompt, or declining the final
/// confirmation, ends the run without submitting.
pub struct PromptFields {
    ui: Arc<dyn Ui>,
    api: Arc<dyn Api>,
    resolver: Resolver,
    options: PromptOptions,
}

impl std::fmt::Debug for PromptFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptFields")
            .field("resolver", &self.resolver)
            .field("options", &self.options)
            .finish()
    }
}

fn label(c: &Candidate) -> String {
    format!("{} - {}", c.id, c.name)
}

fn stamp(zone: &Zone, instant: DateTime<Utc>) -> String {
    zone.to_local(instant).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Option shown for a current value the candidate list does not contain,
/// such as an archived project or tag.
fn kept(id: &str) -> String {
    format!("{id} - (current)")
}

/// Pick one of `candidates` (or `none`) and return its id (or `""`).
///
/// A current value missing from `candidates` is offered as its own option
/// and stays the default.
fn choose(
    ui: &dyn Ui,
    message: &str,
    none: &str,
    candidates: &[Candidate],
    current: &str,
) -> Result<String, PipelineError> {
    let mut choices: Vec<(String, String)> = vec![(String::new(), none.to_string())];
    if !current.is_empty() && !candidates.iter().any(|c| c.id == current) {
        choices.push((current.to_string(), kept(current)));
    }
    choices.extend(candidates.iter().map(|c| (c.id.clone(), label(c))));

    let default = choices
        .iter()
        .find(|(id, _)| id == current)
        .map_or_else(|| none.to_string(), |(_, l)| l.clone());
    let options: Vec<String> = choices.iter().map(|(_, l)| l.clone()).collect();
    let chosen = ui.ask_from_options(message, &options, Some(&default), None)?;
    Ok(choices
        .into_iter()
        .find(|(_, l)| *l == chosen)
        .map(|(id, _)| id)
        .unwrap_or_default())
}

impl PromptFields {
    pub fn new(
        ui: Arc<dyn Ui>,
        api: Arc<dyn Api>,
        resolver: Resolver,
        options: PromptOptions,
    ) -> Self {
        Self {
            ui,
            api,
            resolver,
            options,
        }
    }

    /// Distinct descriptions of the user's recent entries, newest first.
    async fn recent_descriptions(&self, draft: &TimeEntryDraft) -> Vec<String> {
        let days = self.options.autocomplete_days;
        if days == 0 || draft.user_id.is_empty() {
            return Vec::new();
        }
        let params = GetUserTimeEntries {
            workspace: draft.workspace.clone(),
            user_id: draft.user_id.clone(),
            start: Some(self.options.now - Duration::days(i64::from(days))),
            pagination: PaginationParam::all(),
            ..Default::default()
        };
        match self.api.get_user_time_entries(params).await {
            Ok(entries) => {
                let mut seen: Vec<String> = Vec::new();
                for entry in entries {
                    let d = entry.description.trim().to_string();
                    if !d.is_empty() && !seen.contains(&d) {
                        seen.push(d);
                    }
                }
                seen
            }
            Err(e) => {
                debug!(error = %e, "no description suggestions");
                Vec::new()
            }
        }
    }

    fn ask_instant(
        &self,
        message: &str,
        current: Option<DateTime<Utc>>,
        required: bool,
    ) -> Result<Option<DateTime<Utc>>, PipelineError> {
        let default = current.map(|t| stamp(&self.options.zone, t));
        let (zone, now) = (self.options.zone, self.options.now);
        let convert = move |text: &str| {
            if text.is_empty() {
                return if required {
                    Err(format!("{} is required", message.to_lowercase()))
                } else {
                    Ok(None)
                };
            }
            parse_instant(text, now, &zone)
                .map(Some)
                .map_err(|e| e.to_string())
        };
        Ok(self
            .ui
            .ask_date_time(message, default.as_deref(), &convert)?)
    }
}

#[async_trait]
impl Transformer for PromptFields {
    fn name(&self) -> &'static str {
        "prompt"
    }

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError> {
        let ui = self.ui.as_ref();

        let projects = self.resolver.project_candidates().await?;
        draft.project_id = choose(ui, "Project", NO_PROJECT, &projects, &draft.project_id)?;

        if draft.project_id.is_empty() {
            draft.task_id.clear();
        } else {
            let tasks = self.resolver.task_candidates(&draft.project_id).await?;
            if !tasks.is_empty() {
                draft.task_id = choose(ui, "Task", NO_TASK, &tasks, &draft.task_id)?;
            }
        }

        let descriptions = self.recent_descriptions(draft).await;
        let suggest = move |typed: &str| {
            let typed = normalize(typed);
            descriptions
                .iter()
                .filter(|d| is_similar(&typed, &normalize(d)))
                .cloned()
                .collect::<Vec<_>>()
        };
        let current = draft.description.clone();
        draft.description = ui
            .ask_text("Description", Some(&current), Some(&suggest))?
            .trim()
            .to_string();

        let tags = self.resolver.tag_candidates().await?;
        if !tags.is_empty() {
            let mut choices: Vec<(String, String)> = draft
                .tag_ids
                .iter()
                .filter(|id| !tags.iter().any(|t| &t.id == *id))
                .map(|id| (id.clone(), kept(id)))
                .collect();
            choices.extend(tags.iter().map(|t| (t.id.clone(), label(t))));

            let options: Vec<String> = choices.iter().map(|(_, l)| l.clone()).collect();
            let defaults: Vec<String> = choices
                .iter()
                .filter(|(id, _)| draft.tag_ids.contains(id))
                .map(|(_, l)| l.clone())
                .collect();
            let picked = ui.ask_many_from_options("Tags", &options, &defaults, None)?;
            draft.tag_ids = choices
                .into_iter()
                .filter(|(_, l)| picked.contains(l))
                .map(|(id, _)| id)
                .collect();
        }

        draft.start = self.ask_instant("Start", draft.start, true)?;
        draft.end = self.ask_instant("End", draft.end, self.options.require_end)?;

        if self.options.confirm {
            let message = if draft.is_new() {
                "Submit this time entry?"
            } else {
                "Save the changes to this time entry?"
            };
            if !ui.confirm(message, true)? {
                return Err(PipelineError::Interrupted);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::core::cancel::CancelToken;
    use crate::core::types::{Project, Tag, TimeEntry, TimeInterval};
    use crate::search::ResolverOptions;
    use crate::ui::{Answer, ScriptedUi};
    use chrono::TimeZone;

    fn id(n: u64) -> String {
        MockApi::id(n)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
    }

    fn project(project_id: String) -> Project {
        Project {
            id: project_id,
            name: "CLI".into(),
            workspace_id: id(1),
            client_id: None,
            client_name: None,
            color: String::new(),
            billable: false,
            public: true,
            archived: false,
            note: String::new(),
            hourly_rate: None,
            tasks: vec![],
            memberships: vec![],
            custom_fields: vec![],
        }
    }

    fn api() -> MockApi {
        MockApi::new()
            .with_project(project(id(10)))
            .with_tag(Tag {
                id: id(20),
                name: "meeting".into(),
                workspace_id: id(1),
                archived: false,
            })
            .with_entry(TimeEntry {
                id: id(40),
                workspace_id: id(1),
                user_id: id(2),
                description: "Writing docs".into(),
                project_id: None,
                task_id: None,
                tag_ids: vec![],
                billable: false,
                time_interval: TimeInterval {
                    start: now() - Duration::days(1),
                    end: Some(now() - Duration::hours(20)),
                },
                is_locked: false,
            })
    }

    fn step(api: MockApi, ui: Arc<ScriptedUi>, confirm: bool) -> PromptFields {
        let api: Arc<dyn Api> = Arc::new(api);
        let resolver = Resolver::new(
            Arc::clone(&api),
            id(1),
            ResolverOptions::default(),
            CancelToken::new(),
        );
        PromptFields::new(
            ui,
            api,
            resolver,
            PromptOptions {
                zone: Zone::Utc,
                now: now(),
                autocomplete_days: 7,
                require_end: false,
                confirm,
            },
        )
    }

    #[tokio::test]
    async fn asks_every_field() {
        let ui = Arc::new(ScriptedUi::new([
            Answer::Filter("cli".into()),
            Answer::Suggestion("writ".into()),
            Answer::Many(vec![format!("{} - meeting", id(20))]),
            Answer::text("2024-05-06 09:00"),
            Answer::Default,
            Answer::Confirm(true),
        ]));
        let mut draft = TimeEntryDraft::new(id(1), id(2));
        step(api(), Arc::clone(&ui), true)
            .apply(&mut draft)
            .await
            .unwrap();

        assert_eq!(draft.project_id, id(10));
        assert_eq!(draft.description, "Writing docs");
        assert_eq!(draft.tag_ids, vec![id(20)]);
        assert_eq!(draft.start, Some(Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()));
        assert_eq!(draft.end, None);
        assert_eq!(
            ui.messages(),
            vec!["Project", "Description", "Tags", "Start", "End", "Submit this time entry?"]
        );
    }

    #[tokio::test]
    async fn current_values_are_defaults() {
        let ui = Arc::new(ScriptedUi::new([
            Answer::Default,
            Answer::Default,
            Answer::Default,
            Answer::Default,
            Answer::Default,
        ]));
        let mut draft = TimeEntryDraft::new(id(1), id(2));
        draft.project_id = id(10);
        draft.description = "keep".into();
        draft.start = Some(now());
        step(api(), Arc::clone(&ui), false)
            .apply(&mut draft)
            .await
            .unwrap();
        assert_eq!(draft.project_id, id(10));
        assert_eq!(draft.description, "keep");
        assert_eq!(draft.start, Some(now()));
        let asked = ui.asked();
        assert_eq!(asked[0].default.as_deref(), Some(format!("{} - CLI", id(10)).as_str()));
        assert_eq!(asked[3].default.as_deref(), Some("2024-05-06 12:00:00"));
    }

    #[tokio::test]
    async fn values_outside_the_lists_survive_defaults() {
        let archived_project = Project {
            id: id(11),
            name: "Old".into(),
            archived: true,
            ..project(id(11))
        };
        let mock = api()
            .with_project(archived_project)
            .with_tag(Tag {
                id: id(21),
                name: "legacy".into(),
                workspace_id: id(1),
                archived: true,
            });
        let ui = Arc::new(ScriptedUi::new([
            Answer::Default,
            Answer::Default,
            Answer::Default,
            Answer::Default,
            Answer::Default,
        ]));
        let mut draft = TimeEntryDraft::new(id(1), id(2));
        draft.project_id = id(11);
        draft.tag_ids = vec![id(21), id(20)];
        draft.start = Some(now());
        step(mock, Arc::clone(&ui), false)
            .apply(&mut draft)
            .await
            .unwrap();

        assert_eq!(draft.project_id, id(11));
        assert_eq!(draft.tag_ids, vec![id(21), id(20)]);
        let asked = ui.asked();
        let kept_project = format!("{} - (current)", id(11));
        assert_eq!(asked[0].default.as_deref(), Some(kept_project.as_str()));
        assert!(asked[0].options.contains(&kept_project));
        assert!(asked[2].options.contains(&format!("{} - (current)", id(21))));
    }

    #[tokio::test]
    async fn declining_confirmation_interrupts() {
        let ui = Arc::new(ScriptedUi::new([
            Answer::Default,
            Answer::Default,
            Answer::Default,
            Answer::text("10:00"),
            Answer::Default,
            Answer::Confirm(false),
        ]));
        let mut draft = TimeEntryDraft::new(id(1), id(2));
        let err = step(api(), ui, true).apply(&mut draft).await.unwrap_err();
        assert!(matches!(err, PipelineError::Interrupted));
    }

    #[tokio::test]
    async fn interrupt_propagates() {
        let ui = Arc::new(ScriptedUi::new([Answer::Interrupt]));
        let mut draft = TimeEntryDraft::new(id(1), id(2));
        let err = step(api(), ui, true).apply(&mut draft).await.unwrap_err();
        assert!(err.is_interrupted());
    }
}
