//! Core entity structures
//!
//! Field names on the wire follow the backend's Spanish camelCase contract;
//! the Rust side uses English names and renames per field.

use crate::{Date, EntityId, RecordStatus, Shift, Timestamp};
use serde::{Deserialize, Serialize};

/// A student enrolled in the school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: EntityId,
    #[serde(rename = "nombres")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    #[serde(rename = "dni")]
    pub document: String,
    pub email: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: Option<Date>,
    #[serde(rename = "aulaId", default)]
    pub classroom_id: Option<EntityId>,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<Timestamp>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload for creating a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDraft {
    #[serde(rename = "nombres")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    #[serde(rename = "dni")]
    pub document: String,
    pub email: String,
    #[serde(rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(rename = "aulaId", skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<EntityId>,
}

/// A teacher on staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: EntityId,
    #[serde(rename = "nombres")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<Timestamp>,
}

impl Teacher {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherDraft {
    #[serde(rename = "nombres")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A classroom (section) students are assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: EntityId,
    #[serde(rename = "seccion")]
    pub section: String,
    #[serde(rename = "grado", default)]
    pub grade: Option<u8>,
    #[serde(rename = "cantidadEstudiantes")]
    pub student_capacity: u32,
    #[serde(rename = "turno", default)]
    pub shift: Option<Shift>,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassroomDraft {
    #[serde(rename = "seccion")]
    pub section: String,
    #[serde(rename = "cantidadEstudiantes")]
    pub student_capacity: u32,
    #[serde(rename = "grado", skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(rename = "turno", skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
}

/// Status-only update, used by the activate/deactivate flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(skip)]
    pub id: EntityId,
    #[serde(rename = "estado")]
    pub status: RecordStatus,
}

/// An academic year (or term) that bimesters belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPeriod {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fechaInicio")]
    pub starts_on: Date,
    #[serde(rename = "fechaFin")]
    pub ends_on: Date,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPeriodDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fechaInicio")]
    pub starts_on: Date,
    #[serde(rename = "fechaFin")]
    pub ends_on: Date,
}

/// One of the four grading windows of an academic period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bimester {
    pub id: EntityId,
    #[serde(rename = "periodoId")]
    pub period_id: EntityId,
    #[serde(rename = "numero")]
    pub number: u8,
    #[serde(rename = "fechaInicio")]
    pub starts_on: Date,
    #[serde(rename = "fechaFin")]
    pub ends_on: Date,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BimesterDraft {
    #[serde(rename = "periodoId")]
    pub period_id: EntityId,
    #[serde(rename = "numero")]
    pub number: u8,
    #[serde(rename = "fechaInicio")]
    pub starts_on: Date,
    #[serde(rename = "fechaFin")]
    pub ends_on: Date,
}

/// A class: one course taught by one teacher in one classroom, with its roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: EntityId,
    #[serde(rename = "curso")]
    pub course: String,
    #[serde(rename = "aulaId")]
    pub classroom_id: EntityId,
    #[serde(rename = "profesorId")]
    pub teacher_id: EntityId,
    #[serde(rename = "periodoId")]
    pub period_id: EntityId,
    #[serde(rename = "estudiantes", default)]
    pub student_ids: Vec<EntityId>,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
}

impl ClassGroup {
    pub fn roster_size(&self) -> usize {
        self.student_ids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroupDraft {
    #[serde(rename = "curso")]
    pub course: String,
    #[serde(rename = "aulaId")]
    pub classroom_id: EntityId,
    #[serde(rename = "profesorId")]
    pub teacher_id: EntityId,
    #[serde(rename = "periodoId")]
    pub period_id: EntityId,
    #[serde(rename = "estudiantes", default)]
    pub student_ids: Vec<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classroom_wire_names() {
        let value = json!({
            "id": 7,
            "seccion": "A",
            "cantidadEstudiantes": 20,
            "estado": "activo"
        });
        let classroom: Classroom = serde_json::from_value(value).unwrap();
        assert_eq!(classroom.section, "A");
        assert_eq!(classroom.student_capacity, 20);
        assert_eq!(classroom.grade, None);
        assert!(classroom.status.is_active());
    }

    #[test]
    fn test_classroom_draft_omits_unset_optionals() {
        let draft = ClassroomDraft {
            section: "B".to_string(),
            student_capacity: 25,
            grade: None,
            shift: None,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value, json!({ "seccion": "B", "cantidadEstudiantes": 25 }));
    }

    #[test]
    fn test_status_change_serializes_only_status() {
        let change = StatusChange {
            id: 3,
            status: RecordStatus::Inactive,
        };
        assert_eq!(
            serde_json::to_value(change).unwrap(),
            json!({ "estado": "inactivo" })
        );
    }

    #[test]
    fn test_class_group_roster_defaults_empty() {
        let value = json!({
            "id": 1,
            "curso": "Matemática",
            "aulaId": 2,
            "profesorId": 3,
            "periodoId": 4
        });
        let class: ClassGroup = serde_json::from_value(value).unwrap();
        assert_eq!(class.roster_size(), 0);
        assert_eq!(class.status, RecordStatus::Active);
    }
}
