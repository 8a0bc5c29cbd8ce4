//! Entry composition through the factory: folder defaults, flags, names,
//! prompts, validation, auto-close and hydration against the mock service.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use clockify_cli::api::mock::MockApi;
use clockify_cli::api::ApiError;
use clockify_cli::core::cancel::CancelToken;
use clockify_cli::core::config::{Config, ConfigLayer};
use clockify_cli::core::defaults::DEFAULT_FILENAME;
use clockify_cli::core::types::{
    Client, Project, Tag, TimeEntry, TimeInterval, User, UserSettings, Workspace,
    WorkspaceSettings,
};
use clockify_cli::engine::{hydrate, CreateEntry, EntryFlags, PipelineError, TimeEntryDraft};
use clockify_cli::factory::{EntryMode, Factory};
use clockify_cli::search::{EntityKind, ResolveError, Resolver, ResolverOptions};
use clockify_cli::ui::{Answer, ScriptedUi};

fn id(n: u64) -> String {
    MockApi::id(n)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
}

fn me() -> User {
    User {
        id: id(2),
        name: "Ana".into(),
        email: "ana@example.com".into(),
        status: "ACTIVE".into(),
        active_workspace: id(1),
        default_workspace: id(1),
        settings: UserSettings::default(),
    }
}

fn project(n: u64, name: &str) -> Project {
    Project {
        id: id(n),
        name: name.into(),
        workspace_id: id(1),
        client_id: None,
        client_name: None,
        color: "#00ff00".into(),
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

fn tag(n: u64, name: &str) -> Tag {
    Tag {
        id: id(n),
        name: name.into(),
        workspace_id: id(1),
        archived: false,
    }
}

fn client(n: u64, name: &str) -> Client {
    Client {
        id: id(n),
        name: name.into(),
        workspace_id: id(1),
        archived: false,
    }
}

fn running_entry() -> TimeEntry {
    TimeEntry {
        id: id(30),
        workspace_id: id(1),
        user_id: id(2),
        description: "earlier".into(),
        project_id: None,
        task_id: None,
        tag_ids: vec![],
        billable: false,
        time_interval: TimeInterval {
            start: now() - Duration::hours(3),
            end: None,
        },
        is_locked: false,
    }
}

fn mock(settings: WorkspaceSettings) -> MockApi {
    MockApi::new()
        .with_me(me())
        .with_workspace(Workspace {
            id: id(1),
            name: "Coderockr".into(),
            settings,
        })
        .with_project(project(10, "CLI"))
        .with_tag(tag(20, "meeting"))
        .with_tag(tag(21, "review"))
}

fn factory(api: &MockApi, layer: ConfigLayer) -> Factory {
    let mut config = Config::load_from(None, Vec::<(String, String)>::new()).unwrap();
    config.apply_overrides(ConfigLayer {
        workspace: Some(id(1)),
        user_id: Some(id(2)),
        ..Default::default()
    });
    config.apply_overrides(layer);
    Factory::new(config, CancelToken::new())
        .with_api(Arc::new(api.clone()))
        .with_now(now())
}

fn draft() -> TimeEntryDraft {
    let mut draft = TimeEntryDraft::new(id(1), id(2));
    draft.start = Some(now() - Duration::hours(1));
    draft
}

fn with_defaults() -> EntryMode {
    EntryMode {
        apply_defaults: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn folder_defaults_fill_and_tag_flag_replaces() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join(DEFAULT_FILENAME),
        format!("projectId: {}\ntagIds:\n  - {}\n", id(10), id(20)),
    )
    .unwrap();
    let nested = root.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let api = mock(WorkspaceSettings::default());
    let factory = factory(&api, ConfigLayer::default()).with_cwd(&nested);
    let flags = EntryFlags {
        tags: Some(vec![id(21)]),
        ..Default::default()
    };

    let pipeline = factory.pipeline(flags, with_defaults()).await.unwrap();
    let outcome = pipeline.run(draft(), &CreateEntry).await.unwrap();

    assert_eq!(outcome.entry.project_id, Some(id(10)));
    assert_eq!(outcome.entry.tag_ids, vec![id(21)]);
    let hydrated = outcome.hydrated.expect("hydrated entry");
    assert_eq!(hydrated.project.map(|p| p.name), Some("CLI".to_string()));
    let tags: Vec<&str> = hydrated.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["review"]);
}

#[tokio::test]
async fn defaults_are_skipped_when_the_mode_says_so() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join(DEFAULT_FILENAME),
        format!("projectId: {}\n", id(10)),
    )
    .unwrap();

    let api = mock(WorkspaceSettings::default());
    let factory = factory(&api, ConfigLayer::default()).with_cwd(root.path());
    let pipeline = factory
        .pipeline(EntryFlags::default(), EntryMode::default())
        .await
        .unwrap();
    let outcome = pipeline.run(draft(), &CreateEntry).await.unwrap();
    assert_eq!(outcome.entry.project_id, None);
}

#[tokio::test]
async fn names_resolve_before_submitting() {
    let api = mock(WorkspaceSettings::default());
    let factory = factory(
        &api,
        ConfigLayer {
            allow_name_for_id: Some(true),
            ..Default::default()
        },
    );
    let flags = EntryFlags {
        project: Some("cli".into()),
        tags: Some(vec!["review".into(), "meeting".into()]),
        ..Default::default()
    };
    let pipeline = factory.pipeline(flags, EntryMode::default()).await.unwrap();
    let outcome = pipeline.run(draft(), &CreateEntry).await.unwrap();

    assert_eq!(outcome.entry.project_id, Some(id(10)));
    assert_eq!(outcome.entry.tag_ids, vec![id(21), id(20)]);
}

#[tokio::test]
async fn resolver_prefers_matching_name_and_reports_misses() {
    let api = MockApi::new()
        .with_client(client(40, "Coderockr"))
        .with_client(client(41, "Other"));
    let resolver = Resolver::new(
        Arc::new(api),
        id(1),
        ResolverOptions::default(),
        CancelToken::new(),
    );

    assert_eq!(resolver.client("other").await.unwrap(), id(41));
    match resolver.client("xx").await.unwrap_err() {
        ResolveError::NotFound {
            kind, reference, ..
        } => {
            assert_eq!(kind, EntityKind::Client);
            assert_eq!(reference, "xx");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn first_match_in_list_order_wins() {
    let api = MockApi::new()
        .with_client(client(40, "Acme Labs"))
        .with_client(client(41, "Acme"));
    let resolver = Resolver::new(
        Arc::new(api),
        id(1),
        ResolverOptions::default(),
        CancelToken::new(),
    );
    assert_eq!(resolver.client("acme").await.unwrap(), id(40));
}

#[tokio::test]
async fn missing_name_resolves_nothing_is_submitted() {
    let api = mock(WorkspaceSettings::default());
    let factory = factory(
        &api,
        ConfigLayer {
            allow_name_for_id: Some(true),
            ..Default::default()
        },
    );
    let flags = EntryFlags {
        tags: Some(vec!["review".into(), "nope".into()]),
        ..Default::default()
    };
    let pipeline = factory.pipeline(flags, EntryMode::default()).await.unwrap();
    let err = pipeline.run(draft(), &CreateEntry).await.unwrap_err();

    assert!(matches!(err, PipelineError::Resolve(ref e) if e.is_not_found()), "{err}");
    assert_eq!(api.count("create time entry"), 0);
}

#[tokio::test]
async fn workspace_policy_blocks_submission() {
    let api = mock(WorkspaceSettings {
        force_description: true,
        ..Default::default()
    });
    let factory = factory(&api, ConfigLayer::default());
    let pipeline = factory
        .pipeline(EntryFlags::default(), EntryMode::default())
        .await
        .unwrap();
    let err = pipeline.run(draft(), &CreateEntry).await.unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)), "{err}");
    assert_eq!(api.count("create time entry"), 0);
}

#[tokio::test]
async fn incomplete_entries_pass_when_allowed() {
    let api = mock(WorkspaceSettings {
        force_description: true,
        ..Default::default()
    });
    let factory = factory(
        &api,
        ConfigLayer {
            allow_incomplete: Some(true),
            ..Default::default()
        },
    );
    let pipeline = factory
        .pipeline(EntryFlags::default(), EntryMode::default())
        .await
        .unwrap();
    pipeline.run(draft(), &CreateEntry).await.unwrap();
    assert_eq!(api.count("create time entry"), 1);
}

#[tokio::test]
async fn declined_confirmation_submits_nothing() {
    let api = mock(WorkspaceSettings::default());
    let ui = Arc::new(ScriptedUi::new([
        Answer::Default,        // Project
        Answer::text("Review"), // Description
        Answer::Many(vec![]),   // Tags
        Answer::Default,        // Start
        Answer::Default,        // End
        Answer::Confirm(false),
    ]));
    let factory = factory(
        &api,
        ConfigLayer {
            interactive: Some(true),
            ..Default::default()
        },
    )
    .with_ui(ui.clone());

    let pipeline = factory
        .pipeline(EntryFlags::default(), EntryMode::default())
        .await
        .unwrap();
    let err = pipeline.run(draft(), &CreateEntry).await.unwrap_err();

    assert!(err.is_interrupted());
    assert_eq!(ui.remaining(), 0);
    assert_eq!(api.count("create time entry"), 0);
}

#[tokio::test]
async fn interrupted_prompt_submits_nothing() {
    let api = mock(WorkspaceSettings::default());
    let ui = Arc::new(ScriptedUi::new([Answer::Interrupt]));
    let factory = factory(
        &api,
        ConfigLayer {
            interactive: Some(true),
            ..Default::default()
        },
    )
    .with_ui(ui);

    let pipeline = factory
        .pipeline(EntryFlags::default(), EntryMode::default())
        .await
        .unwrap();
    let err = pipeline.run(draft(), &CreateEntry).await.unwrap_err();
    assert!(matches!(err, PipelineError::Interrupted));
    assert_eq!(api.count("create time entry"), 0);
}

#[tokio::test]
async fn running_entry_is_stopped_at_the_new_start() {
    let api = mock(WorkspaceSettings::default()).with_entry(running_entry());
    let factory = factory(&api, ConfigLayer::default());
    let mode = EntryMode {
        auto_close: true,
        ..Default::default()
    };
    let pipeline = factory.pipeline(EntryFlags::default(), mode).await.unwrap();
    let new = draft();
    let start = new.start;
    let outcome = pipeline.run(new, &CreateEntry).await.unwrap();

    let closed = outcome.closed.expect("stopped entry");
    assert_eq!(closed.id, id(30));
    assert_eq!(closed.time_interval.end, start);
    assert_eq!(api.count("create time entry"), 1);
}

#[tokio::test]
async fn failed_auto_close_still_submits() {
    let api = mock(WorkspaceSettings::default()).with_entry(running_entry());
    api.fail_on("stop time entry", ApiError::NoResponse { status: 503 });
    let factory = factory(&api, ConfigLayer::default());
    let mode = EntryMode {
        auto_close: true,
        ..Default::default()
    };
    let pipeline = factory.pipeline(EntryFlags::default(), mode).await.unwrap();
    let outcome = pipeline.run(draft(), &CreateEntry).await.unwrap();

    assert!(outcome.closed.is_none());
    assert!(outcome.close_error.is_some());
    assert_eq!(api.count("create time entry"), 1);
}

#[tokio::test]
async fn failed_submit_leaves_the_stopped_entry_stopped() {
    let api = mock(WorkspaceSettings::default()).with_entry(running_entry());
    api.fail_on("create time entry", ApiError::NoResponse { status: 500 });
    let factory = factory(&api, ConfigLayer::default());
    let mode = EntryMode {
        auto_close: true,
        ..Default::default()
    };
    let pipeline = factory.pipeline(EntryFlags::default(), mode).await.unwrap();
    let err = pipeline.run(draft(), &CreateEntry).await.unwrap_err();

    match err {
        PipelineError::SubmitAfterClose { closed_id, .. } => assert_eq!(closed_id, id(30)),
        other => panic!("unexpected error: {other}"),
    }
    let earlier = api
        .time_entries()
        .into_iter()
        .find(|e| e.id == id(30))
        .unwrap();
    assert!(earlier.time_interval.end.is_some());
}

#[tokio::test]
async fn hydration_uses_current_entities_in_tag_order() {
    let api = mock(WorkspaceSettings::default());
    let entry = TimeEntry {
        project_id: Some(id(10)),
        tag_ids: vec![id(21), id(20)],
        ..running_entry()
    };
    let hydrated = hydrate(Arc::new(api), entry, &CancelToken::new())
        .await
        .unwrap();

    let tag_ids: Vec<String> = hydrated.tags.iter().map(|t| t.id.clone()).collect();
    assert_eq!(tag_ids, vec![id(21), id(20)]);
    assert_eq!(hydrated.project, Some(project(10, "CLI")));
    assert_eq!(hydrated.user, me());
}
