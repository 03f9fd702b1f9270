//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Whether keystrokes navigate, edit the search prompt or fill a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    MoveUp,
    MoveDown,
    NextPage,
    PrevPage,
    FocusNextColumn,
    FocusPrevColumn,
    SortFocused,
    CycleStatusFilter,
    ResetFilters,
    Refresh,
    DeleteSelected,
    ToggleStatus,
    OpenCreate,
    OpenEdit,
    FormInput(char),
    FormBackspace,
    FormNextField,
    FormPrevField,
    FormSubmit,
    FormCancel,
    OpenHelp,
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    CloseSearch,
    Cancel,
}

pub fn map_key(event: KeyEvent, mode: InputMode) -> Option<Action> {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    if mode == InputMode::Search {
        return match code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::CloseSearch),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char(c) => Some(Action::SearchInput(c)),
            _ => None,
        };
    }

    if mode == InputMode::Form {
        return match code {
            KeyCode::Enter => Some(Action::FormSubmit),
            KeyCode::Esc => Some(Action::FormCancel),
            KeyCode::Tab | KeyCode::Down => Some(Action::FormNextField),
            KeyCode::BackTab | KeyCode::Up => Some(Action::FormPrevField),
            KeyCode::Backspace => Some(Action::FormBackspace),
            KeyCode::Char(c) => Some(Action::FormInput(c)),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::OpenHelp),
        KeyCode::Char('/') => Some(Action::OpenSearch),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('s') => Some(Action::SortFocused),
        KeyCode::Char('f') => Some(Action::CycleStatusFilter),
        KeyCode::Char('c') => Some(Action::ResetFilters),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteSelected),
        KeyCode::Char('t') => Some(Action::ToggleStatus),
        KeyCode::Char('n') => Some(Action::OpenCreate),
        KeyCode::Char('e') => Some(Action::OpenEdit),
        KeyCode::Char(']') => Some(Action::FocusNextColumn),
        KeyCode::Char('[') => Some(Action::FocusPrevColumn),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => Some(Action::PrevPage),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => Some(Action::NextPage),
        KeyCode::Char(c @ '1'..='6') => Some(Action::SwitchView(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Help text shown in the overlay.
pub const HELP: &[(&str, &str)] = &[
    ("Tab / 1-6", "cambiar de pantalla"),
    ("j/k", "mover selección"),
    ("h/l", "página anterior / siguiente"),
    ("[ ]", "columna enfocada"),
    ("s", "ordenar por la columna enfocada"),
    ("/", "buscar"),
    ("f", "filtrar por estado"),
    ("c", "limpiar filtros"),
    ("r", "recargar"),
    ("d", "eliminar"),
    ("t", "activar / desactivar"),
    ("n / e", "nuevo / editar"),
    ("Enter / Esc", "guardar / cerrar formulario"),
    ("q", "salir"),
];
