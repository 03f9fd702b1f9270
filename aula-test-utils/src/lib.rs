//! Aula Test Utilities
//!
//! Centralized test infrastructure for the Aula workspace:
//! - Scripted loaders and operations with invocation counters and gates
//! - A notifier that records what the user would have seen
//! - Proptest generators for entity types and view states
//! - Test fixtures for common scenarios
//! - Custom assertions for Aula-specific errors

pub use aula_cache::{Notifier, Operation, ResourceLoader};
pub use aula_core::{
    AcademicPeriod, Bimester, ClassGroup, Classroom, ClassroomDraft, Date, EntityId, FetchError,
    MutationError, RecordStatus, Shift, Student, StudentDraft, Teacher,
};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

// ============================================================================
// GATE
// ============================================================================

/// A latch that holds scripted loaders and operations until opened, so tests
/// can observe the "in flight" state deterministically.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn closed() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

// ============================================================================
// SCRIPTED LOADER
// ============================================================================

struct Script<T> {
    responses: Mutex<VecDeque<Result<T, FetchError>>>,
    last: Mutex<Option<Result<T, FetchError>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, response: Result<T, FetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Next scripted response; the last one repeats once the script runs out.
    fn next(&self) -> Result<T, FetchError> {
        let next = self.responses.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(FetchError::network("script exhausted"))),
        }
    }
}

/// Loader returning scripted responses in order.
pub struct ScriptedLoader<T> {
    script: Arc<Script<T>>,
    delay: Duration,
    gate: Option<Gate>,
}

impl<T> Clone for ScriptedLoader<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            delay: self.delay,
            gate: self.gate.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ScriptedLoader<T> {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::new()),
            delay: Duration::ZERO,
            gate: None,
        }
    }

    /// Loader that always answers `value`.
    pub fn always(value: T) -> Self {
        Self::new().then_ok(value)
    }

    pub fn then_ok(self, value: T) -> Self {
        self.script.push(Ok(value));
        self
    }

    pub fn then_err(self, error: FetchError) -> Self {
        self.script.push(Err(error));
        self
    }

    /// Queue another response on a loader that is already in use.
    pub fn push_ok(&self, value: T) {
        self.script.push(Ok(value));
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn shared(&self) -> Arc<dyn ResourceLoader<T>> {
        Arc::new(self.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ScriptedLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ResourceLoader<T> for ScriptedLoader<T> {
    async fn load(&self) -> Result<T, FetchError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script.next()
    }
}

// ============================================================================
// SCRIPTED OPERATION
// ============================================================================

/// Write operation returning scripted responses and recording its inputs.
pub struct ScriptedOperation<I, R> {
    script: Arc<Script<R>>,
    inputs: Arc<Mutex<Vec<I>>>,
    delay: Duration,
    gate: Option<Gate>,
}

impl<I, R> Clone for ScriptedOperation<I, R> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            inputs: Arc::clone(&self.inputs),
            delay: self.delay,
            gate: self.gate.clone(),
        }
    }
}

impl<I, R> ScriptedOperation<I, R>
where
    I: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::new()),
            inputs: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
            gate: None,
        }
    }

    pub fn succeeding(result: R) -> Self {
        Self::new().then_ok(result)
    }

    pub fn failing(error: FetchError) -> Self {
        Self::new().then_err(error)
    }

    pub fn then_ok(self, result: R) -> Self {
        self.script.push(Ok(result));
        self
    }

    pub fn then_err(self, error: FetchError) -> Self {
        self.script.push(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<I> {
        self.inputs.lock().unwrap().clone()
    }
}

impl<I, R> Default for ScriptedOperation<I, R>
where
    I: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<I, R> Operation<I, R> for ScriptedOperation<I, R>
where
    I: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    async fn run(&self, input: I) -> Result<R, FetchError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script.next()
    }
}

// ============================================================================
// RECORDING NOTIFIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub description: Option<String>,
}

/// Notifier that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages_of(NoticeKind::Success)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages_of(NoticeKind::Error)
    }

    fn messages_of(&self, kind: NoticeKind) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|notice| notice.kind == kind)
            .map(|notice| notice.message.clone())
            .collect()
    }

    fn record(&self, kind: NoticeKind, message: &str, description: Option<&str>) {
        self.notices.lock().unwrap().push(Notice {
            kind,
            message: message.to_string(),
            description: description.map(str::to_string),
        });
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str, description: Option<&str>) {
        self.record(NoticeKind::Success, message, description);
    }

    fn error(&self, message: &str, description: Option<&str>) {
        self.record(NoticeKind::Error, message, description);
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Aula entity types.

    use super::*;
    use aula_table::{SortDirection, SortSpec, ViewState};
    use proptest::prelude::*;

    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        1i64..100_000
    }

    pub fn arb_record_status() -> impl Strategy<Value = RecordStatus> {
        prop_oneof![Just(RecordStatus::Active), Just(RecordStatus::Inactive)]
    }

    pub fn arb_shift() -> impl Strategy<Value = Shift> {
        prop_oneof![Just(Shift::Morning), Just(Shift::Afternoon)]
    }

    /// Dates between 2000-01-01 and 2030-12-31.
    pub fn arb_date() -> impl Strategy<Value = Date> {
        (2000i32..=2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            Date::from_ymd_opt(y, m, d).unwrap_or_default()
        })
    }

    pub fn arb_student() -> impl Strategy<Value = Student> {
        (
            arb_entity_id(),
            "[A-Z][a-z]{2,8}",
            "[A-Z][a-z]{2,10}",
            "[0-9]{8}",
            prop::option::of(arb_date()),
            prop::option::of(arb_entity_id()),
            arb_record_status(),
        )
            .prop_map(|(id, first_name, last_name, document, birth_date, classroom_id, status)| {
                Student {
                    id,
                    email: format!("{}.{}@colegio.edu", first_name, last_name).to_lowercase(),
                    first_name,
                    last_name,
                    document,
                    birth_date,
                    classroom_id,
                    status,
                    created_at: None,
                }
            })
    }

    pub fn arb_classroom() -> impl Strategy<Value = Classroom> {
        (
            arb_entity_id(),
            "[A-F]",
            prop::option::of(1u8..=6),
            0u32..45,
            prop::option::of(arb_shift()),
            arb_record_status(),
        )
            .prop_map(|(id, section, grade, student_capacity, shift, status)| Classroom {
                id,
                section,
                grade,
                student_capacity,
                shift,
                status,
            })
    }

    pub fn arb_sort_spec() -> impl Strategy<Value = SortSpec> {
        (
            "[a-z]{3,10}",
            prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)],
        )
            .prop_map(|(key, direction)| SortSpec { key, direction })
    }

    pub fn arb_view_state() -> impl Strategy<Value = ViewState> {
        (
            "[a-z ]{0,8}",
            prop::collection::btree_map("[a-z]{3,8}", "[a-z0-9]{1,6}", 0..3),
            prop::option::of(arb_sort_spec()),
            1usize..50,
            1usize..25,
        )
            .prop_map(|(search_term, filters, sort, current_page, page_size)| ViewState {
                search_term,
                filters,
                sort,
                current_page,
                page_size,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common testing scenarios.

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    pub fn student(id: EntityId, first_name: &str, last_name: &str, email: &str) -> Student {
        Student {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            document: format!("{:08}", 40_000_000 + id),
            email: email.to_string(),
            birth_date: Some(date(2012, 5, 14)),
            classroom_id: None,
            status: RecordStatus::Active,
            created_at: None,
        }
    }

    pub fn teacher(id: EntityId, first_name: &str, last_name: &str) -> Teacher {
        Teacher {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: format!("{}@colegio.edu", first_name.to_lowercase()),
            specialty: "Matemática".to_string(),
            phone: None,
            status: RecordStatus::Active,
            created_at: None,
        }
    }

    pub fn classroom(id: EntityId, section: &str, student_capacity: u32) -> Classroom {
        Classroom {
            id,
            section: section.to_string(),
            grade: Some(3),
            student_capacity,
            shift: Some(Shift::Morning),
            status: RecordStatus::Active,
        }
    }

    pub fn classroom_draft(section: &str, student_capacity: u32) -> ClassroomDraft {
        ClassroomDraft {
            section: section.to_string(),
            student_capacity,
            grade: None,
            shift: None,
        }
    }

    /// Classrooms 1..=n with sections A, B, C, ...
    pub fn classrooms(n: usize) -> Vec<Classroom> {
        (0..n)
            .map(|i| {
                let section = char::from(b'A' + (i % 26) as u8).to_string();
                classroom(i as EntityId + 1, &section, 20 + i as u32)
            })
            .collect()
    }

    pub fn academic_period(id: EntityId, year: i32) -> AcademicPeriod {
        AcademicPeriod {
            id,
            name: format!("Año escolar {}", year),
            starts_on: date(year, 3, 1),
            ends_on: date(year, 12, 20),
            status: RecordStatus::Active,
        }
    }

    pub fn bimester(id: EntityId, period_id: EntityId, number: u8) -> Bimester {
        let start_month = 3 + u32::from(number.saturating_sub(1)) * 2;
        Bimester {
            id,
            period_id,
            number,
            starts_on: date(2025, start_month, 1),
            ends_on: date(2025, start_month + 1, 28),
            status: RecordStatus::Active,
        }
    }

    pub fn class_group(id: EntityId, classroom_id: EntityId, students: &[EntityId]) -> ClassGroup {
        ClassGroup {
            id,
            course: "Comunicación".to_string(),
            classroom_id,
            teacher_id: 1,
            period_id: 1,
            student_ids: students.to_vec(),
            status: RecordStatus::Active,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Aula-specific error shapes.

    use super::*;

    /// Assert that a fetch failed with the given HTTP status.
    #[track_caller]
    pub fn assert_fetch_status<T: std::fmt::Debug>(result: &Result<T, FetchError>, status: u16) {
        match result {
            Err(err) => assert_eq!(err.status_code(), Some(status), "wrong status in {:?}", err),
            Ok(value) => panic!("Expected status {}, got Ok({:?})", status, value),
        }
    }

    /// Assert that a mutation failed because its operation failed.
    #[track_caller]
    pub fn assert_mutation_failed<T: std::fmt::Debug>(result: &Result<T, MutationError>) {
        match result {
            Err(MutationError::Failed(_)) => {}
            other => panic!("Expected failed mutation, got: {:?}", other),
        }
    }

    /// Assert that a mutation was rejected as a duplicate submission.
    #[track_caller]
    pub fn assert_already_in_flight<T: std::fmt::Debug>(result: &Result<T, MutationError>) {
        match result {
            Err(MutationError::AlreadyInFlight { .. }) => {}
            other => panic!("Expected AlreadyInFlight, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_scripted_loader_replays_then_repeats_last() {
        let loader = ScriptedLoader::new()
            .then_err(FetchError::status(503, "busy"))
            .then_ok(7u32);
        assertions::assert_fetch_status(&loader.load().await, 503);
        assert_eq!(loader.load().await, Ok(7));
        assert_eq!(loader.load().await, Ok(7));
        assert_eq!(loader.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_holds_loader() {
        let gate = Gate::closed();
        let loader = ScriptedLoader::always(1u32).with_gate(gate.clone());
        let pending = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(loader.calls(), 1);
        assert!(!pending.is_finished());

        gate.open();
        assert_eq!(pending.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn test_scripted_operation_records_inputs() {
        let op = ScriptedOperation::<u32, ()>::succeeding(());
        op.run(4).await.unwrap();
        op.run(5).await.unwrap();
        assert_eq!(op.inputs(), vec![4, 5]);
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.success("Aula creada", None);
        notifier.error("Error al eliminar", Some("409"));
        assert_eq!(notifier.successes(), vec!["Aula creada".to_string()]);
        assert_eq!(notifier.errors(), vec!["Error al eliminar".to_string()]);
        assert_eq!(notifier.notices()[1].description.as_deref(), Some("409"));
    }

    #[test]
    fn test_classroom_fixtures() {
        let rooms = fixtures::classrooms(3);
        let sections: Vec<&str> = rooms.iter().map(|c| c.section.as_str()).collect();
        assert_eq!(sections, vec!["A", "B", "C"]);
        assert_eq!(rooms[2].id, 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_student_documents_have_eight_digits(student in generators::arb_student()) {
            prop_assert_eq!(student.document.len(), 8);
            prop_assert!(student.email.ends_with("@colegio.edu"));
        }

        #[test]
        fn prop_generated_view_states_have_positive_paging(state in generators::arb_view_state()) {
            prop_assert!(state.current_page >= 1);
            prop_assert!(state.page_size >= 1);
        }
    }
}
