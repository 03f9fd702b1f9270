//! List screen for one resource: a query on the collection, a table view
//! over its rows, and the write actions available from the list.

use crate::columns::STATUS_KEY;
use crate::forms::{DraftForm, Form, FormSnapshot, FormTarget};
use crate::keys::Action;
use crate::nav::View;
use crate::traits::Screen;
use aula_cache::{
    CacheKey, FetchOptions, InFlightGate, Mutation, Notifier, Operation, Query, QueryOptions,
    QueryState, ResourceCache, ResourceLoader,
};
use aula_core::{Drafted, EntityId, MutationError, RecordStatus, Resource, StatusChange};
use aula_table::{Column, TableView, ViewState};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Everything a view needs to draw one screen, detached from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSnapshot {
    pub view: View,
    pub headers: Vec<String>,
    pub rows: Vec<ScreenRow>,
    /// Index into `rows`.
    pub selected: Option<usize>,
    pub focused_column: usize,
    pub search_term: String,
    pub filters: Vec<(String, String)>,
    pub current_page: usize,
    pub total_pages: usize,
    pub match_count: usize,
    pub total_count: usize,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_optimistic: bool,
    pub error: Option<String>,
    pub form: Option<FormSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRow {
    pub id: EntityId,
    pub cells: Vec<String>,
    pub status: RecordStatus,
    /// A write for this record is in flight.
    pub pending: bool,
}

pub type PendingWrite<T> = JoinHandle<Result<T, MutationError>>;

/// Builds the loader for one record, for prefilling edit forms.
pub type DetailLoaders<R> = Arc<dyn Fn(EntityId) -> Arc<dyn ResourceLoader<R>> + Send + Sync>;

/// Result of the last form submission, filled in when the write settles.
type FormOutcome = Arc<Mutex<Option<Result<(), MutationError>>>>;

pub struct ResourceScreen<R: Drafted> {
    view: View,
    cache: ResourceCache,
    query: Query<Vec<R>>,
    table: TableView<R>,
    delete: Option<Mutation<EntityId, ()>>,
    status: Option<Mutation<StatusChange, R>>,
    create: Option<Mutation<R::Draft, R>>,
    update: Option<Mutation<(EntityId, R::Draft), R>>,
    detail_loaders: Option<DetailLoaders<R>>,
    form: Option<Form>,
    form_outcome: Option<FormOutcome>,
    /// Record being edited and the detail data version already shown.
    detail_seen: Option<(EntityId, u64)>,
    gate: InFlightGate<EntityId>,
    focused_column: usize,
}

impl<R> ResourceScreen<R>
where
    R: Drafted,
    R::Draft: DraftForm,
{
    /// Mount the collection query for `R` (starting its first load) and
    /// restore `state`.
    pub fn new(
        view: View,
        cache: &ResourceCache,
        loader: Arc<dyn ResourceLoader<Vec<R>>>,
        columns: Vec<Column<R>>,
        state: ViewState,
        options: QueryOptions,
    ) -> Self {
        let query = Query::mount_shared(cache, Self::collection_key(), loader, options);
        Self {
            view,
            cache: cache.clone(),
            query,
            table: TableView::with_state(columns, state),
            delete: None,
            status: None,
            create: None,
            update: None,
            detail_loaders: None,
            form: None,
            form_outcome: None,
            detail_seen: None,
            gate: InFlightGate::new(),
            focused_column: 0,
        }
    }

    pub fn collection_key() -> CacheKey {
        CacheKey::new(R::COLLECTION)
    }

    pub fn detail_key(id: EntityId) -> CacheKey {
        CacheKey::new(R::DETAIL).with(id)
    }

    /// Enable deletes. The row disappears from the list at once and comes
    /// back if the backend refuses.
    pub fn with_delete<O>(mut self, operation: O, notifier: Arc<dyn Notifier>) -> Self
    where
        O: Operation<EntityId, ()> + 'static,
    {
        let mutation = Mutation::builder(&self.cache, operation)
            .optimistic(self.query.overlay().clone(), |rows: &Vec<R>, id: &EntityId| {
                rows.iter().filter(|row| row.id() != *id).cloned().collect()
            })
            .removes(|id: &EntityId| Some(Self::detail_key(*id)))
            .invalidates(Self::collection_key())
            .notifier(notifier)
            .messages("Registro eliminado", "Error al eliminar")
            .build();
        self.delete = Some(mutation);
        self
    }

    /// Enable the activate/deactivate toggle, applied optimistically.
    pub fn with_status_toggle<O>(mut self, operation: O, notifier: Arc<dyn Notifier>) -> Self
    where
        O: Operation<StatusChange, R> + 'static,
    {
        let mutation = Mutation::builder(&self.cache, operation)
            .optimistic(
                self.query.overlay().clone(),
                |rows: &Vec<R>, change: &StatusChange| {
                    rows.iter()
                        .map(|row| {
                            if row.id() == change.id {
                                row.with_status(change.status)
                            } else {
                                row.clone()
                            }
                        })
                        .collect()
                },
            )
            .invalidates(Self::collection_key())
            .invalidates(CacheKey::new(R::DETAIL))
            .notifier(notifier)
            .messages("Estado actualizado", "Error al cambiar el estado")
            .build();
        self.status = Some(mutation);
        self
    }

    /// Enable the create form. The list is refetched once the backend
    /// accepts the new record.
    pub fn with_create<O>(mut self, operation: O, notifier: Arc<dyn Notifier>) -> Self
    where
        O: Operation<R::Draft, R> + 'static,
    {
        let mutation = Mutation::builder(&self.cache, operation)
            .invalidates(Self::collection_key())
            .notifier(notifier)
            .messages("Registro creado", "Error al crear")
            .build();
        self.create = Some(mutation);
        self
    }

    /// Enable the edit form. `detail_loaders` fetches the current record so
    /// the form shows the backend's copy rather than the list row.
    pub fn with_edit<O>(
        mut self,
        operation: O,
        detail_loaders: Option<DetailLoaders<R>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        O: Operation<(EntityId, R::Draft), R> + 'static,
    {
        let mutation = Mutation::builder(&self.cache, operation)
            .invalidates(Self::collection_key())
            .invalidates(CacheKey::new(R::DETAIL))
            .notifier(notifier)
            .messages("Registro actualizado", "Error al actualizar")
            .build();
        self.update = Some(mutation);
        self.detail_loaders = detail_loaders;
        self
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn query_state(&self) -> QueryState<Vec<R>> {
        self.query.state()
    }

    pub fn table(&self) -> &TableView<R> {
        &self.table
    }

    pub fn gate(&self) -> &InFlightGate<EntityId> {
        &self.gate
    }

    fn rows(&self) -> Arc<Vec<R>> {
        self.query.state().data.unwrap_or_default()
    }

    /// Rows of the current page, after clamping the page to the data.
    pub fn visible_rows(&mut self) -> Vec<R> {
        let rows = self.rows();
        let result = self.table.render(&rows);
        result.rows.into_iter().cloned().collect()
    }

    pub fn selected_record(&mut self) -> Option<R> {
        let rows = self.rows();
        let result = self.table.render(&rows);
        self.table.selected_row(&result).cloned()
    }

    /// Delete the selected record. `Ok(None)` when nothing is selected or
    /// deletes are not enabled.
    pub fn delete_selected(&mut self) -> Result<Option<PendingWrite<()>>, MutationError> {
        let Some(record) = self.selected_record() else {
            return Ok(None);
        };
        self.delete_record(record.id())
    }

    pub fn delete_record(&self, id: EntityId) -> Result<Option<PendingWrite<()>>, MutationError> {
        let Some(mutation) = &self.delete else {
            return Ok(None);
        };
        tracing::info!(resource = R::COLLECTION, id, "Deleting record");
        self.run_gated(id, mutation, id).map(Some)
    }

    /// Flip the selected record between active and inactive.
    pub fn toggle_status_selected(&mut self) -> Result<Option<PendingWrite<R>>, MutationError> {
        let Some(record) = self.selected_record() else {
            return Ok(None);
        };
        let Some(mutation) = &self.status else {
            return Ok(None);
        };
        let change = StatusChange {
            id: record.id(),
            status: record.status().toggled(),
        };
        tracing::info!(
            resource = R::COLLECTION,
            id = change.id,
            status = %change.status,
            "Changing record status"
        );
        self.run_gated(change.id, mutation, change).map(Some)
    }

    /// At most one write per record: a second submission while the first
    /// is pending is rejected.
    fn run_gated<I, O>(
        &self,
        id: EntityId,
        mutation: &Mutation<I, O>,
        input: I,
    ) -> Result<PendingWrite<O>, MutationError>
    where
        I: Send + 'static,
        O: Send + 'static,
    {
        let permit = self.gate.try_acquire(id)?;
        let handle = mutation.mutate_detached(input);
        Ok(tokio::spawn(async move {
            let result = handle.wait().await;
            drop(permit);
            result
        }))
    }

    pub fn open_create(&mut self) {
        if self.create.is_some() && self.form.is_none() {
            self.form = Some(Form::create::<R::Draft>());
        }
    }

    /// Open the edit form for the selected record, prefilled from the list
    /// row, and start loading the record itself.
    pub fn open_edit(&mut self) {
        if self.update.is_none() || self.form.is_some() {
            return;
        }
        let Some(record) = self.selected_record() else {
            return;
        };
        let id = record.id();
        self.form = Some(Form::edit(id, &record.to_draft()));
        let key = Self::detail_key(id);
        self.detail_seen = Some((id, self.cache.data_version(&key)));
        if let Some(loaders) = &self.detail_loaders {
            self.cache.prefetch(&key, loaders(id), FetchOptions::default());
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.form_outcome = None;
        self.detail_seen = None;
    }

    /// Parse the form and start the write. A parse error stays on the form
    /// and nothing is sent.
    pub fn submit_form(&mut self) -> Result<(), MutationError> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        if form.is_submitting() {
            return Ok(());
        }
        let target = form.target();
        let Some(draft) = form.parse::<R::Draft>() else {
            return Ok(());
        };
        let pending = match (target, &self.create, &self.update) {
            (FormTarget::Create, Some(mutation), _) => {
                tracing::info!(resource = R::COLLECTION, "Creating record");
                let handle = mutation.mutate_detached(draft);
                tokio::spawn(handle.wait())
            }
            (FormTarget::Edit(id), _, Some(mutation)) => {
                tracing::info!(resource = R::COLLECTION, id, "Updating record");
                self.run_gated(id, mutation, (id, draft))?
            }
            _ => return Ok(()),
        };
        if let Some(form) = self.form.as_mut() {
            form.begin_submit();
        }
        self.watch_outcome(pending);
        Ok(())
    }

    fn watch_outcome<O: Send + 'static>(&mut self, pending: PendingWrite<O>) {
        let slot = FormOutcome::default();
        self.form_outcome = Some(Arc::clone(&slot));
        tokio::spawn(async move {
            let result = match pending.await {
                Ok(result) => result.map(|_| ()),
                Err(err) => Err(MutationError::Aborted {
                    reason: err.to_string(),
                }),
            };
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        });
    }

    fn form_settled(&self) -> bool {
        self.form_outcome.as_ref().is_some_and(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        })
    }

    fn detail_changed(&self) -> bool {
        self.detail_seen.is_some_and(|(id, seen)| {
            self.cache.data_version(&Self::detail_key(id)) != seen
        })
    }

    /// Close the form after a successful write, or keep it open with the
    /// backend's message. Refill an untouched edit form from a freshly
    /// loaded record.
    fn sync_form(&mut self) {
        let outcome = self.form_outcome.as_ref().and_then(|slot| {
            slot.lock().unwrap_or_else(PoisonError::into_inner).take()
        });
        match outcome {
            Some(Ok(())) => self.close_form(),
            Some(Err(err)) => {
                self.form_outcome = None;
                let message = err
                    .fetch_error()
                    .map(|fetch| fetch.message().to_string())
                    .unwrap_or_else(|| err.to_string());
                if let Some(form) = self.form.as_mut() {
                    form.fail(message);
                }
            }
            None => {}
        }

        let (Some(form), Some((id, seen))) = (self.form.as_mut(), self.detail_seen) else {
            return;
        };
        let key = Self::detail_key(id);
        let version = self.cache.data_version(&key);
        if version == seen {
            return;
        }
        if let Some(record) = self.cache.get::<R>(&key).data {
            form.refill(record.to_draft().values());
        }
        self.detail_seen = Some((id, version));
    }

    fn cycle_status_filter(&mut self) {
        let next = match self.table.state().filters.get(STATUS_KEY).map(String::as_str) {
            None => RecordStatus::Active.as_str(),
            Some("activo") => RecordStatus::Inactive.as_str(),
            Some(_) => "",
        };
        self.table.set_filter(STATUS_KEY, next);
    }

    fn move_selection(&mut self, forward: bool) {
        let page_len = self.visible_rows().len();
        if forward {
            self.table.select_next(page_len);
        } else {
            self.table.select_prev(page_len);
        }
    }
}

impl<R> Screen for ResourceScreen<R>
where
    R: Drafted,
    R::Draft: DraftForm,
{
    fn view(&self) -> View {
        self.view
    }

    fn snapshot(&mut self) -> ScreenSnapshot {
        self.sync_form();
        let state = self.query.state();
        let rows = state.data.clone().unwrap_or_default();
        let result = self.table.render(&rows);
        let sort = self.table.state().sort.clone();

        let headers = self
            .table
            .columns()
            .iter()
            .map(|column| match &sort {
                Some(spec) if spec.key == column.key => {
                    format!("{} {}", column.label, spec.direction.arrow())
                }
                _ => column.label.to_string(),
            })
            .collect();
        let screen_rows = result
            .rows
            .iter()
            .map(|row| ScreenRow {
                id: row.id(),
                cells: self
                    .table
                    .columns()
                    .iter()
                    .map(|column| column.value(row).to_string())
                    .collect(),
                status: row.status(),
                pending: self.gate.is_in_flight(&row.id()),
            })
            .collect();

        ScreenSnapshot {
            view: self.view,
            headers,
            rows: screen_rows,
            selected: self.table.selected(),
            focused_column: self.focused_column,
            search_term: self.table.state().search_term.clone(),
            filters: self
                .table
                .state()
                .filters
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            current_page: result.current_page,
            total_pages: result.total_pages,
            match_count: result.match_count,
            total_count: rows.len(),
            is_loading: state.is_loading,
            is_fetching: state.is_fetching,
            is_optimistic: state.is_optimistic,
            error: state.error.map(|err| err.message().to_string()),
            form: self.form.as_ref().map(Form::snapshot),
        }
    }

    fn view_state(&self) -> &ViewState {
        self.table.state()
    }

    fn apply(&mut self, action: Action) -> Result<(), MutationError> {
        match action {
            Action::MoveDown => self.move_selection(true),
            Action::MoveUp => self.move_selection(false),
            Action::NextPage => {
                self.visible_rows();
                self.table.next_page();
            }
            Action::PrevPage => {
                self.visible_rows();
                self.table.prev_page();
            }
            Action::FocusNextColumn => {
                let count = self.table.columns().len().max(1);
                self.focused_column = (self.focused_column + 1) % count;
            }
            Action::FocusPrevColumn => {
                let count = self.table.columns().len().max(1);
                self.focused_column = (self.focused_column + count - 1) % count;
            }
            Action::SortFocused => self.table.toggle_sort_at(self.focused_column),
            Action::CycleStatusFilter => self.cycle_status_filter(),
            Action::ResetFilters => self.table.reset_filters(),
            Action::Refresh => {
                self.refresh();
            }
            Action::SearchInput(c) => self.table.push_search_char(c),
            Action::SearchBackspace => self.table.pop_search_char(),
            Action::DeleteSelected => {
                self.delete_selected()?;
            }
            Action::ToggleStatus => {
                self.toggle_status_selected()?;
            }
            Action::OpenCreate => self.open_create(),
            Action::OpenEdit => self.open_edit(),
            Action::FormInput(c) => {
                if let Some(form) = self.form.as_mut() {
                    form.input(c);
                }
            }
            Action::FormBackspace => {
                if let Some(form) = self.form.as_mut() {
                    form.backspace();
                }
            }
            Action::FormNextField => {
                if let Some(form) = self.form.as_mut() {
                    form.next_field();
                }
            }
            Action::FormPrevField => {
                if let Some(form) = self.form.as_mut() {
                    form.prev_field();
                }
            }
            Action::FormSubmit => self.submit_form()?,
            Action::FormCancel => self.close_form(),
            _ => {}
        }
        Ok(())
    }

    fn refresh(&self) -> usize {
        self.cache.invalidate(self.query.key())
    }

    fn ensure_fresh(&self) -> bool {
        self.query.ensure_fresh()
    }

    fn has_changed(&self) -> bool {
        self.query.has_changed() || self.form_settled() || self.detail_changed()
    }

    fn has_form(&self) -> bool {
        self.form.is_some()
    }

    fn mark_seen(&mut self) {
        self.query.mark_seen();
    }
}
