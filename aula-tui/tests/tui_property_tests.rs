use aula_cache::{CacheConfig, Notifier, QueryOptions, ResourceCache, RetryPolicy};
use aula_core::{
    Classroom, ClassroomDraft, Drafted, EntityId, FetchError, RecordStatus, Shift, StatusChange,
};
use aula_table::ViewState;
use aula_test_utils::assertions::{assert_already_in_flight, assert_mutation_failed};
use aula_test_utils::{fixtures, generators};
use aula_test_utils::{Gate, RecordingNotifier, ScriptedLoader, ScriptedOperation};
use aula_tui::columns;
use aula_tui::config::{
    AuthConfig, CacheSettings, ConfigLoadError, LogConfig, RetrySettings, TuiConfig,
};
use aula_tui::forms::Form;
use aula_tui::keys::{map_key, Action, InputMode};
use aula_tui::nav::View;
use aula_tui::notifications::{NotificationCenter, NotificationLevel};
use aula_tui::screen::{DetailLoaders, ResourceScreen};
use aula_tui::state::App;
use aula_tui::traits::Screen;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:8080/api".to_string(),
        auth: AuthConfig {
            bearer_token: Some("test-token".to_string()),
        },
        request_timeout_ms: 5_000,
        refresh_interval_ms: 2_000,
        page_size: 10,
        persistence_path: "tmp/aula-tui.json".into(),
        error_log_path: "tmp/aula-tui.log".into(),
        log: LogConfig {
            level: "info".to_string(),
        },
        cache: CacheSettings {
            stale_after_ms: 0,
            expire_after_ms: 300_000,
            gc_interval_ms: 60_000,
        },
        retry: RetrySettings {
            max_attempts: 3,
            initial_ms: 250,
            max_ms: 5_000,
            multiplier: 2.0,
        },
    }
}

const SAMPLE_TOML: &str = r#"
api_base_url = "https://colegio.example/api"
request_timeout_ms = 5000
refresh_interval_ms = 2000
page_size = 10
persistence_path = "state/aula-tui.json"
error_log_path = "logs/aula-tui.log"

[auth]
bearer_token = "abc123"

[log]
level = "aula_tui=debug,info"

[cache]
stale_after_ms = 0
expire_after_ms = 300000
gc_interval_ms = 60000

[retry]
max_attempts = 3
initial_ms = 250
max_ms = 5000
multiplier = 2.0
"#;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn test_config_validation_accepts_base() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn test_config_validation_rejects_bad_values() {
    let mut config = base_config();
    config.api_base_url = "colegio.example".to_string();
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.auth.bearer_token = Some("   ".to_string());
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.page_size = 0;
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.cache.stale_after_ms = config.cache.expire_after_ms + 1;
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.retry.max_ms = 100;
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.retry.multiplier = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_without_token_is_valid() {
    let mut config = base_config();
    config.auth.bearer_token = None;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aula-tui.toml");
    std::fs::write(&path, SAMPLE_TOML).unwrap();

    let config = TuiConfig::from_path(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.api_base_url, "https://colegio.example/api");
    assert_eq!(config.auth.bearer_token.as_deref(), Some("abc123"));
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.retry_policy().max_attempts, 3);
}

#[test]
fn test_config_rejects_unknown_fields() {
    let contents = format!("{SAMPLE_TOML}\n[theme]\nname = \"dark\"\n");
    let err = TuiConfig::from_toml(&contents).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Parse(_)));
}

#[test]
fn test_config_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TuiConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Io(_)));
}

// ============================================================================
// KEYS
// ============================================================================

proptest! {
    #[test]
    fn prop_digit_keys_switch_views(digit in 1u8..=6) {
        let c = char::from(b'0' + digit);
        let action = map_key(key(KeyCode::Char(c)), InputMode::Normal);
        prop_assert_eq!(action, Some(Action::SwitchView(usize::from(digit) - 1)));
    }

    #[test]
    fn prop_search_mode_captures_chars(c in "[a-zA-Z0-9 áéíóúñ]") {
        let c = c.chars().next().unwrap();
        let action = map_key(key(KeyCode::Char(c)), InputMode::Search);
        prop_assert_eq!(action, Some(Action::SearchInput(c)));
    }

    #[test]
    fn prop_form_mode_captures_chars(c in "[a-zA-Z0-9 ,@.-]") {
        let c = c.chars().next().unwrap();
        let action = map_key(key(KeyCode::Char(c)), InputMode::Form);
        prop_assert_eq!(action, Some(Action::FormInput(c)));
    }

    #[test]
    fn prop_edit_form_parses_back_to_draft(room in generators::arb_classroom()) {
        let draft = room.to_draft();
        let mut form = Form::edit(room.id, &draft);
        prop_assert_eq!(form.parse::<ClassroomDraft>(), Some(draft));
    }
}

#[test]
fn test_ctrl_c_quits_in_every_mode() {
    let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(map_key(event, InputMode::Normal), Some(Action::Quit));
    assert_eq!(map_key(event, InputMode::Search), Some(Action::Quit));
    assert_eq!(map_key(event, InputMode::Form), Some(Action::Quit));
}

#[test]
fn test_form_keys() {
    let normal = |code| map_key(key(code), InputMode::Normal);
    assert_eq!(normal(KeyCode::Char('n')), Some(Action::OpenCreate));
    assert_eq!(normal(KeyCode::Char('e')), Some(Action::OpenEdit));

    let form = |code| map_key(key(code), InputMode::Form);
    assert_eq!(form(KeyCode::Enter), Some(Action::FormSubmit));
    assert_eq!(form(KeyCode::Esc), Some(Action::FormCancel));
    assert_eq!(form(KeyCode::Tab), Some(Action::FormNextField));
    assert_eq!(form(KeyCode::BackTab), Some(Action::FormPrevField));
    assert_eq!(form(KeyCode::Backspace), Some(Action::FormBackspace));
    assert_eq!(form(KeyCode::Char('q')), Some(Action::FormInput('q')));
}

#[test]
fn test_search_mode_closes_on_enter_and_esc() {
    assert_eq!(map_key(key(KeyCode::Enter), InputMode::Search), Some(Action::CloseSearch));
    assert_eq!(map_key(key(KeyCode::Esc), InputMode::Search), Some(Action::CloseSearch));
    assert_eq!(
        map_key(key(KeyCode::Char('q')), InputMode::Search),
        Some(Action::SearchInput('q'))
    );
}

// ============================================================================
// CLASSROOM SCREEN
// ============================================================================

fn test_cache() -> ResourceCache {
    ResourceCache::new(CacheConfig {
        retry: RetryPolicy::none(),
        ..CacheConfig::default()
    })
}

fn classroom_screen(
    cache: &ResourceCache,
    loader: &ScriptedLoader<Vec<Classroom>>,
) -> ResourceScreen<Classroom> {
    ResourceScreen::new(
        View::Classrooms,
        cache,
        loader.shared(),
        columns::classroom_columns(),
        ViewState::new(10),
        QueryOptions::default(),
    )
}

async fn settle() {
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

fn ids(screen: &mut ResourceScreen<Classroom>) -> Vec<EntityId> {
    screen.snapshot().rows.iter().map(|row| row.id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_screen_loads_collection_on_mount() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(3));
    let mut screen = classroom_screen(&cache, &loader);

    assert!(screen.snapshot().is_loading);
    settle().await;

    let snapshot = screen.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.total_count, 3);
    assert_eq!(snapshot.rows[0].cells[1], "A");
    assert_eq!(loader.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_is_shown() {
    let cache = test_cache();
    let loader = ScriptedLoader::new().then_err(FetchError::status(500, "backend caído"));
    let mut screen = classroom_screen(&cache, &loader);
    settle().await;

    let snapshot = screen.snapshot();
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("backend caído"));
}

#[tokio::test(start_paused = true)]
async fn test_delete_removes_row_then_rolls_back_on_failure() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(3));
    let gate = Gate::closed();
    let operation: ScriptedOperation<EntityId, ()> =
        ScriptedOperation::failing(FetchError::status(409, "El aula tiene estudiantes"))
            .with_gate(gate.clone());
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader)
        .with_delete(operation.clone(), notifier.clone() as Arc<dyn Notifier>);
    settle().await;

    screen.apply(Action::MoveDown).unwrap();
    let pending = screen.delete_selected().unwrap().unwrap();
    settle().await;

    assert_eq!(ids(&mut screen), vec![2, 3]);
    assert!(screen.snapshot().is_optimistic);
    assert!(screen.gate().is_in_flight(&1));

    gate.open();
    let result = pending.await.unwrap();
    assert_mutation_failed(&result);

    assert_eq!(ids(&mut screen), vec![1, 2, 3]);
    assert!(!screen.gate().is_in_flight(&1));
    assert_eq!(notifier.errors(), vec!["Error al eliminar".to_string()]);
    assert_eq!(operation.inputs(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_delete_success_refetches_collection() {
    let cache = test_cache();
    let all = fixtures::classrooms(3);
    let remaining = all[1..].to_vec();
    let loader = ScriptedLoader::new().then_ok(all).then_ok(remaining);
    let operation: ScriptedOperation<EntityId, ()> = ScriptedOperation::succeeding(());
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader)
        .with_delete(operation, notifier.clone() as Arc<dyn Notifier>);
    settle().await;

    let pending = screen.delete_record(1).unwrap().unwrap();
    pending.await.unwrap().unwrap();
    settle().await;

    let snapshot = screen.snapshot();
    assert!(!snapshot.is_optimistic);
    assert_eq!(snapshot.rows.iter().map(|row| row.id).collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(loader.calls(), 2);
    assert_eq!(notifier.successes(), vec!["Registro eliminado".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_second_write_for_same_record_is_rejected() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(2));
    let gate = Gate::closed();
    let operation: ScriptedOperation<EntityId, ()> =
        ScriptedOperation::succeeding(()).with_gate(gate.clone());
    let notifier = RecordingNotifier::new();
    let screen = classroom_screen(&cache, &loader)
        .with_delete(operation.clone(), notifier as Arc<dyn Notifier>);
    settle().await;

    let first = screen.delete_record(2).unwrap().unwrap();
    assert_already_in_flight(&screen.delete_record(2));
    assert!(screen.delete_record(1).unwrap().is_some());

    gate.open();
    first.await.unwrap().unwrap();
    settle().await;
    assert_eq!(operation.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_status_toggle_is_optimistic() {
    let cache = test_cache();
    let rooms = fixtures::classrooms(2);
    let mut deactivated = rooms[0].clone();
    deactivated.status = RecordStatus::Inactive;
    let loader = ScriptedLoader::always(rooms);
    let gate = Gate::closed();
    let operation: ScriptedOperation<StatusChange, Classroom> =
        ScriptedOperation::succeeding(deactivated).with_gate(gate.clone());
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader)
        .with_status_toggle(operation.clone(), notifier.clone() as Arc<dyn Notifier>);
    settle().await;

    screen.apply(Action::MoveDown).unwrap();
    let pending = screen.toggle_status_selected().unwrap().unwrap();
    settle().await;

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.rows[0].status, RecordStatus::Inactive);
    assert!(snapshot.rows[0].pending);
    assert_eq!(
        operation.inputs(),
        vec![StatusChange {
            id: 1,
            status: RecordStatus::Inactive,
        }]
    );

    gate.open();
    pending.await.unwrap().unwrap();
    assert_eq!(notifier.successes(), vec!["Estado actualizado".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_status_filter_cycles() {
    let cache = test_cache();
    let mut rooms = fixtures::classrooms(3);
    rooms[1].status = RecordStatus::Inactive;
    let loader = ScriptedLoader::always(rooms);
    let mut screen = classroom_screen(&cache, &loader);
    settle().await;

    screen.apply(Action::CycleStatusFilter).unwrap();
    assert_eq!(ids(&mut screen), vec![1, 3]);
    screen.apply(Action::CycleStatusFilter).unwrap();
    assert_eq!(ids(&mut screen), vec![2]);
    screen.apply(Action::CycleStatusFilter).unwrap();
    assert_eq!(ids(&mut screen), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_search_narrows_rows() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(3));
    let mut screen = classroom_screen(&cache, &loader);
    settle().await;

    screen.apply(Action::SearchInput('b')).unwrap();
    let snapshot = screen.snapshot();
    assert_eq!(snapshot.search_term, "b");
    assert_eq!(snapshot.match_count, 1);
    assert_eq!(snapshot.rows[0].id, 2);

    screen.apply(Action::ResetFilters).unwrap();
    assert_eq!(screen.snapshot().match_count, 3);
}

// ============================================================================
// CREATE AND EDIT FORMS
// ============================================================================

fn type_text(screen: &mut dyn Screen, text: &str) {
    for c in text.chars() {
        screen.apply(Action::FormInput(c)).unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_form_posts_draft_and_refetches_listing() {
    let cache = test_cache();
    let loader = ScriptedLoader::new()
        .then_ok(fixtures::classrooms(2))
        .with_delay(Duration::from_millis(20));
    let created = fixtures::classroom(3, "C", 28);
    let operation: ScriptedOperation<ClassroomDraft, Classroom> =
        ScriptedOperation::succeeding(created);
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader)
        .with_create(operation.clone(), notifier.clone() as Arc<dyn Notifier>);
    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(ids(&mut screen), vec![1, 2]);
    loader.push_ok(fixtures::classrooms(3));

    screen.apply(Action::OpenCreate).unwrap();
    assert!(screen.has_form());
    type_text(&mut screen, "C");
    screen.apply(Action::FormNextField).unwrap();
    type_text(&mut screen, "28");
    screen.apply(Action::FormSubmit).unwrap();
    assert!(screen.snapshot().form.unwrap().submitting);

    settle().await;
    let snapshot = screen.snapshot();
    assert!(snapshot.form.is_none());
    assert!(snapshot.is_fetching);
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(operation.inputs(), vec![fixtures::classroom_draft("C", 28)]);
    assert_eq!(notifier.successes(), vec!["Registro creado".to_string()]);

    tokio::time::sleep(Duration::from_millis(25)).await;
    let snapshot = screen.snapshot();
    assert!(!snapshot.is_fetching);
    assert_eq!(ids(&mut screen), vec![1, 2, 3]);
    assert_eq!(loader.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_form_sends_nothing() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(1));
    let operation: ScriptedOperation<ClassroomDraft, Classroom> =
        ScriptedOperation::succeeding(fixtures::classroom(2, "B", 20));
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader)
        .with_create(operation.clone(), notifier.clone() as Arc<dyn Notifier>);
    settle().await;

    screen.apply(Action::OpenCreate).unwrap();
    screen.apply(Action::FormSubmit).unwrap();
    settle().await;

    let form = screen.snapshot().form.unwrap();
    assert_eq!(form.error.as_deref(), Some("Sección es obligatorio"));
    assert!(!form.submitting);
    assert_eq!(operation.calls(), 0);
    assert!(notifier.notices().is_empty());

    screen.apply(Action::FormCancel).unwrap();
    assert!(!screen.has_form());
}

#[tokio::test(start_paused = true)]
async fn test_edit_form_prefills_and_updates_record() {
    let cache = test_cache();
    let rooms = fixtures::classrooms(2);
    let mut renamed = rooms.clone();
    renamed[0].section = "Z".to_string();
    let loader = ScriptedLoader::new().then_ok(rooms).then_ok(renamed.clone());
    let operation: ScriptedOperation<(EntityId, ClassroomDraft), Classroom> =
        ScriptedOperation::succeeding(renamed[0].clone());
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader).with_edit(
        operation.clone(),
        None,
        notifier.clone() as Arc<dyn Notifier>,
    );
    settle().await;

    screen.apply(Action::MoveDown).unwrap();
    screen.apply(Action::OpenEdit).unwrap();
    let form = screen.snapshot().form.unwrap();
    assert_eq!(form.title, "Editar aula #1");
    let values: Vec<&str> = form.fields.iter().map(|field| field.value.as_str()).collect();
    assert_eq!(values, vec!["A", "20", "3", "mañana"]);

    screen.apply(Action::FormBackspace).unwrap();
    type_text(&mut screen, "Z");
    screen.apply(Action::FormSubmit).unwrap();
    assert!(screen.snapshot().rows[0].pending);
    settle().await;

    let expected = ClassroomDraft {
        section: "Z".to_string(),
        student_capacity: 20,
        grade: Some(3),
        shift: Some(Shift::Morning),
    };
    assert_eq!(operation.inputs(), vec![(1, expected)]);
    let snapshot = screen.snapshot();
    assert!(snapshot.form.is_none());
    assert_eq!(snapshot.rows[0].cells[1], "Z");
    assert!(!snapshot.rows[0].pending);
    assert_eq!(notifier.successes(), vec!["Registro actualizado".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_edit_form_refills_from_loaded_record() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(2));
    let mut current = fixtures::classroom(1, "A", 20);
    current.student_capacity = 32;
    let detail = ScriptedLoader::always(current).with_delay(Duration::from_millis(10));
    let detail_loaders: DetailLoaders<Classroom> = {
        let detail = detail.clone();
        Arc::new(move |_id: EntityId| detail.shared())
    };
    let operation: ScriptedOperation<(EntityId, ClassroomDraft), Classroom> =
        ScriptedOperation::new();
    let mut screen = classroom_screen(&cache, &loader).with_edit(
        operation,
        Some(detail_loaders),
        RecordingNotifier::new() as Arc<dyn Notifier>,
    );
    settle().await;

    screen.apply(Action::MoveDown).unwrap();
    screen.apply(Action::OpenEdit).unwrap();
    assert_eq!(screen.snapshot().form.unwrap().fields[1].value, "20");

    tokio::time::sleep(Duration::from_millis(15)).await;
    assert!(screen.has_changed());
    assert_eq!(screen.snapshot().form.unwrap().fields[1].value, "32");
    assert_eq!(detail.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_edit_keeps_form_open() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(2));
    let operation: ScriptedOperation<(EntityId, ClassroomDraft), Classroom> =
        ScriptedOperation::failing(FetchError::status(400, "sección duplicada"));
    let notifier = RecordingNotifier::new();
    let mut screen = classroom_screen(&cache, &loader).with_edit(
        operation,
        None,
        notifier.clone() as Arc<dyn Notifier>,
    );
    settle().await;

    screen.apply(Action::MoveDown).unwrap();
    screen.apply(Action::OpenEdit).unwrap();
    screen.apply(Action::FormSubmit).unwrap();
    settle().await;

    let form = screen.snapshot().form.unwrap();
    assert!(!form.submitting);
    assert_eq!(form.error.as_deref(), Some("sección duplicada"));
    assert_eq!(notifier.errors(), vec!["Error al actualizar".to_string()]);
    assert!(!screen.gate().is_in_flight(&1));
}

// ============================================================================
// APP
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_app_reports_rejected_write_and_persists_views() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(2));
    let gate = Gate::closed();
    let operation: ScriptedOperation<EntityId, ()> =
        ScriptedOperation::succeeding(()).with_gate(gate.clone());
    let notifications = Arc::new(NotificationCenter::default());
    let screen = classroom_screen(&cache, &loader)
        .with_delete(operation, notifications.clone() as Arc<dyn Notifier>);
    let mut app = App::with_screens(
        base_config(),
        cache.clone(),
        notifications.clone(),
        vec![Box::new(screen)],
        View::Classrooms,
    );
    settle().await;

    assert!(!app.handle_action(Action::MoveDown));
    app.handle_action(Action::DeleteSelected);
    app.handle_action(Action::DeleteSelected);
    let latest = notifications.latest().unwrap();
    assert_eq!(latest.level, NotificationLevel::Warning);
    assert!(app.needs_redraw());

    app.handle_action(Action::SortFocused);
    let state = app.persisted_state();
    assert_eq!(state.active_view, View::Classrooms);
    let saved = state.view_state(View::Classrooms).unwrap();
    assert_eq!(saved.sort.as_ref().map(|spec| spec.key.as_str()), Some("id"));

    gate.open();
    settle().await;
    assert!(app.handle_action(Action::Quit));
}

#[tokio::test(start_paused = true)]
async fn test_app_follows_form_input_mode() {
    let cache = test_cache();
    let loader = ScriptedLoader::always(fixtures::classrooms(1));
    let operation: ScriptedOperation<ClassroomDraft, Classroom> =
        ScriptedOperation::succeeding(fixtures::classroom(2, "B", 30));
    let notifications = Arc::new(NotificationCenter::default());
    let screen = classroom_screen(&cache, &loader)
        .with_create(operation.clone(), notifications.clone() as Arc<dyn Notifier>);
    let mut app = App::with_screens(
        base_config(),
        cache.clone(),
        notifications.clone(),
        vec![Box::new(screen)],
        View::Classrooms,
    );
    settle().await;

    app.handle_action(Action::OpenCreate);
    assert_eq!(app.mode, InputMode::Form);
    app.handle_action(Action::FormCancel);
    assert_eq!(app.mode, InputMode::Normal);

    app.handle_action(Action::OpenCreate);
    for c in "B".chars() {
        assert!(!app.handle_action(Action::FormInput(c)));
    }
    app.handle_action(Action::FormNextField);
    for c in "30".chars() {
        app.handle_action(Action::FormInput(c));
    }
    app.handle_action(Action::FormSubmit);
    assert_eq!(app.mode, InputMode::Form);

    settle().await;
    assert!(app.needs_redraw());
    let snapshot = app.snapshot().unwrap();
    assert!(snapshot.form.is_none());
    assert_eq!(app.mode, InputMode::Normal);
    assert_eq!(operation.inputs(), vec![fixtures::classroom_draft("B", 30)]);
    assert_eq!(notifications.latest().unwrap().level, NotificationLevel::Success);
}
