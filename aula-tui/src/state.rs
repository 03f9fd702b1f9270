//! Application state.

use crate::api_client::RestClient;
use crate::columns;
use crate::config::TuiConfig;
use crate::forms::DraftForm;
use crate::keys::{Action, InputMode};
use crate::nav::View;
use crate::notifications::{NotificationCenter, NotificationLevel};
use crate::persistence::PersistedState;
use crate::screen::{DetailLoaders, ResourceScreen, ScreenSnapshot};
use crate::theme::Theme;
use crate::traits::Screen;
use aula_cache::{Notifier, QueryOptions, ResourceCache, ResourceLoader};
use aula_core::{
    AcademicPeriod, Bimester, ClassGroup, Classroom, Drafted, EntityId, MutationError, Student,
    Teacher,
};
use aula_table::{Column, ViewState};
use std::sync::Arc;

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub cache: ResourceCache,
    pub notifications: Arc<NotificationCenter>,
    pub active_view: View,
    pub mode: InputMode,
    pub help_visible: bool,
    screens: Vec<Box<dyn Screen>>,
    drawn_notifications: u64,
}

impl App {
    /// Build the six list screens against the REST backend, restoring
    /// persisted view state where present.
    pub fn new(
        config: TuiConfig,
        cache: ResourceCache,
        client: &RestClient,
        persisted: Option<PersistedState>,
    ) -> Self {
        let notifications = Arc::new(NotificationCenter::default());
        let persisted = persisted.unwrap_or_default();
        let builder = ScreenFactory {
            cache: &cache,
            client,
            notifier: notifications.clone(),
            persisted: &persisted,
            page_size: config.page_size,
        };
        let screens = vec![
            builder.build::<Student>(View::Students, columns::student_columns()),
            builder.build::<Teacher>(View::Teachers, columns::teacher_columns()),
            builder.build::<Classroom>(View::Classrooms, columns::classroom_columns()),
            builder.build::<AcademicPeriod>(View::Periods, columns::period_columns()),
            builder.build::<Bimester>(View::Bimesters, columns::bimester_columns()),
            builder.build::<ClassGroup>(View::Classes, columns::class_columns()),
        ];
        Self::with_screens(config, cache, notifications, screens, persisted.active_view)
    }

    pub fn with_screens(
        config: TuiConfig,
        cache: ResourceCache,
        notifications: Arc<NotificationCenter>,
        screens: Vec<Box<dyn Screen>>,
        active_view: View,
    ) -> Self {
        Self {
            config,
            theme: Theme::aula(),
            cache,
            notifications,
            active_view,
            mode: InputMode::Normal,
            help_visible: false,
            screens,
            drawn_notifications: 0,
        }
    }

    pub fn screen(&self) -> Option<&dyn Screen> {
        let active = self.active_view;
        self.screens
            .iter()
            .find(|screen| screen.view() == active)
            .map(|screen| screen.as_ref())
    }

    pub fn screen_mut(&mut self) -> Option<&mut (dyn Screen + 'static)> {
        let active = self.active_view;
        self.screens
            .iter_mut()
            .find(|screen| screen.view() == active)
            .map(|screen| screen.as_mut())
    }

    /// Snapshot of the active screen for drawing.
    pub fn snapshot(&mut self) -> Option<ScreenSnapshot> {
        let snapshot = self.screen_mut().map(|screen| screen.snapshot());
        self.sync_mode();
        snapshot
    }

    /// Follow the active screen's form: typing goes to the form while one
    /// is open, and back to navigation once it closes.
    fn sync_mode(&mut self) {
        let has_form = self.screen().is_some_and(|screen| screen.has_form());
        self.mode = match (self.mode, has_form) {
            (_, true) => InputMode::Form,
            (InputMode::Form, false) => InputMode::Normal,
            (mode, false) => mode,
        };
    }

    /// Whether any screen's data or the notifications changed since the
    /// last draw.
    pub fn needs_redraw(&self) -> bool {
        self.notifications.revision() != self.drawn_notifications
            || self.screens.iter().any(|screen| screen.has_changed())
    }

    pub fn mark_drawn(&mut self) {
        self.drawn_notifications = self.notifications.revision();
        for screen in &mut self.screens {
            screen.mark_seen();
        }
    }

    pub fn switch_to(&mut self, view: View) {
        if view == self.active_view {
            return;
        }
        self.active_view = view;
        self.mode = InputMode::Normal;
        if let Some(screen) = self.screen() {
            screen.ensure_fresh();
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.notify(level, message);
    }

    /// Apply a key action. Returns `true` when the application should exit.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextView => self.switch_to(self.active_view.next()),
            Action::PrevView => self.switch_to(self.active_view.previous()),
            Action::SwitchView(index) => {
                if let Some(view) = View::from_index(index) {
                    self.switch_to(view);
                }
            }
            Action::OpenHelp => self.help_visible = !self.help_visible,
            Action::Cancel => self.help_visible = false,
            Action::OpenSearch => self.mode = InputMode::Search,
            Action::CloseSearch => self.mode = InputMode::Normal,
            other => {
                self.forward(other);
                self.sync_mode();
            }
        }
        false
    }

    fn forward(&mut self, action: Action) {
        let Some(screen) = self.screen_mut() else {
            return;
        };
        match screen.apply(action) {
            Ok(()) => {}
            Err(MutationError::AlreadyInFlight { key }) => {
                tracing::debug!(record = %key, "Write rejected, already pending");
                self.notify(
                    NotificationLevel::Warning,
                    "Ya hay una operación en curso para este registro",
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "Screen action failed");
                self.notifications.error("Operación fallida", Some(&err.to_string()));
            }
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_view: self.active_view,
            views: self
                .screens
                .iter()
                .map(|screen| {
                    (
                        screen.view().collection().to_string(),
                        screen.view_state().clone(),
                    )
                })
                .collect(),
        }
    }
}

struct ScreenFactory<'a> {
    cache: &'a ResourceCache,
    client: &'a RestClient,
    notifier: Arc<NotificationCenter>,
    persisted: &'a PersistedState,
    page_size: usize,
}

impl ScreenFactory<'_> {
    fn build<R>(&self, view: View, columns: Vec<Column<R>>) -> Box<dyn Screen>
    where
        R: Drafted,
        R::Draft: DraftForm,
    {
        let state = restore_view_state(self.persisted, view, self.page_size);
        let loader: Arc<dyn ResourceLoader<Vec<R>>> = Arc::new(self.client.list_loader::<R>());
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let client = self.client.clone();
        let detail_loaders: DetailLoaders<R> = Arc::new(move |id: EntityId| {
            let loader: Arc<dyn ResourceLoader<R>> = Arc::new(client.detail_loader::<R>(id));
            loader
        });
        let screen = ResourceScreen::new(
            view,
            self.cache,
            loader,
            columns,
            state,
            QueryOptions::default(),
        )
        .with_delete(self.client.delete_operation::<R>(), notifier.clone())
        .with_status_toggle(self.client.status_operation::<R>(), notifier.clone())
        .with_create(self.client.create_operation::<R>(), notifier.clone())
        .with_edit(
            self.client.update_operation::<R>(),
            Some(detail_loaders),
            notifier,
        );
        Box::new(screen)
    }
}

/// Saved view state for `view`, with the configured page size. Search,
/// filters, sort and page come from the saved state; the page size always
/// follows the current configuration.
pub(crate) fn restore_view_state(
    persisted: &PersistedState,
    view: View,
    page_size: usize,
) -> ViewState {
    match persisted.view_state(view) {
        Some(saved) => ViewState {
            page_size: page_size.max(1),
            ..saved.clone()
        },
        None => ViewState::new(page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restored_state_uses_configured_page_size() {
        let mut saved = ViewState::new(50);
        saved.search_term = "ana".to_string();
        saved.current_page = 3;
        let persisted = PersistedState {
            active_view: View::Students,
            views: [(View::Students.collection().to_string(), saved)].into_iter().collect(),
        };

        let state = restore_view_state(&persisted, View::Students, 10);
        assert_eq!(state.page_size, 10);
        assert_eq!(state.search_term, "ana");
        assert_eq!(state.current_page, 3);

        let fresh = restore_view_state(&persisted, View::Teachers, 10);
        assert_eq!(fresh.page_size, 10);
        assert!(fresh.search_term.is_empty());
    }
}
