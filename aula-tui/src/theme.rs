//! Color theme and status colors.

use crate::notifications::NotificationLevel;
use aula_core::RecordStatus;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::aula()
    }
}

impl Theme {
    pub fn aula() -> Self {
        Self {
            bg: Color::Rgb(16, 18, 24),
            bg_highlight: Color::Rgb(40, 44, 56),
            primary: Color::Rgb(0, 200, 220),
            primary_dim: Color::Rgb(0, 110, 122),
            secondary: Color::Rgb(220, 120, 255),
            success: Color::Rgb(60, 220, 120),
            warning: Color::Rgb(255, 200, 0),
            error: Color::Rgb(255, 70, 70),
            info: Color::Rgb(0, 200, 220),
            text: Color::Rgb(240, 240, 240),
            text_dim: Color::Rgb(136, 136, 136),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 200, 220),
        }
    }
}

pub fn record_status_color(status: RecordStatus, theme: &Theme) -> Color {
    match status {
        RecordStatus::Active => theme.success,
        RecordStatus::Inactive => theme.text_dim,
    }
}

pub fn notification_color(level: NotificationLevel, theme: &Theme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}
