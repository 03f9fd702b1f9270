//! Navigation and view switching utilities.

use aula_core::resource::{AULAS, BIMESTRES, CLASES, ESTUDIANTES, PERIODOS, PROFESORES};
use serde::{Deserialize, Serialize};

/// One list screen per backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Students,
    Teachers,
    Classrooms,
    Periods,
    Bimesters,
    Classes,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Students => "Estudiantes",
            View::Teachers => "Profesores",
            View::Classrooms => "Aulas",
            View::Periods => "Periodos",
            View::Bimesters => "Bimestres",
            View::Classes => "Clases",
        }
    }

    /// Collection name of the resource shown; also the persistence key.
    pub fn collection(&self) -> &'static str {
        match self {
            View::Students => ESTUDIANTES,
            View::Teachers => PROFESORES,
            View::Classrooms => AULAS,
            View::Periods => PERIODOS,
            View::Bimesters => BIMESTRES,
            View::Classes => CLASES,
        }
    }

    pub fn all() -> &'static [View] {
        &[
            View::Students,
            View::Teachers,
            View::Classrooms,
            View::Periods,
            View::Bimesters,
            View::Classes,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let all = Self::all();
        let idx = self.index();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
