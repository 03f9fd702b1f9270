//! Column sets of the six list screens.
//!
//! Keys match the backend field names so persisted filters and sorts read
//! the same as the API.

use aula_core::{AcademicPeriod, Bimester, ClassGroup, Classroom, Student, Teacher};
use aula_table::{Column, ColumnKind, FieldValue};

/// Filter key shared by every screen's status cycle.
pub const STATUS_KEY: &str = "estado";

pub fn student_columns() -> Vec<Column<Student>> {
    vec![
        Column::number("id", "ID", |s: &Student| s.id.into()),
        Column::text("nombres", "Nombres", |s: &Student| s.first_name.as_str().into()),
        Column::text("apellidos", "Apellidos", |s: &Student| s.last_name.as_str().into()),
        Column::text("dni", "DNI", |s: &Student| s.document.as_str().into()),
        Column::text("email", "Email", |s: &Student| s.email.as_str().into()),
        Column::date("fechaNacimiento", "Nacimiento", |s: &Student| s.birth_date.into()),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |s: &Student| {
            s.status.as_str().into()
        })
        .searchable(false),
    ]
}

pub fn teacher_columns() -> Vec<Column<Teacher>> {
    vec![
        Column::number("id", "ID", |t: &Teacher| t.id.into()),
        Column::text("nombres", "Nombres", |t: &Teacher| t.first_name.as_str().into()),
        Column::text("apellidos", "Apellidos", |t: &Teacher| t.last_name.as_str().into()),
        Column::text("email", "Email", |t: &Teacher| t.email.as_str().into()),
        Column::text("especialidad", "Especialidad", |t: &Teacher| {
            t.specialty.as_str().into()
        }),
        Column::text("telefono", "Teléfono", |t: &Teacher| t.phone.as_deref().into()),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |t: &Teacher| {
            t.status.as_str().into()
        })
        .searchable(false),
    ]
}

pub fn classroom_columns() -> Vec<Column<Classroom>> {
    vec![
        Column::number("id", "ID", |c: &Classroom| c.id.into()),
        Column::text("seccion", "Sección", |c: &Classroom| c.section.as_str().into()),
        Column::number("grado", "Grado", |c: &Classroom| c.grade.map(u32::from).into()),
        Column::number("cantidadEstudiantes", "Estudiantes", |c: &Classroom| {
            c.student_capacity.into()
        }),
        Column::text("turno", "Turno", |c: &Classroom| {
            c.shift.map(|shift| shift.to_string()).into()
        }),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |c: &Classroom| {
            c.status.as_str().into()
        })
        .searchable(false),
    ]
}

pub fn period_columns() -> Vec<Column<AcademicPeriod>> {
    vec![
        Column::number("id", "ID", |p: &AcademicPeriod| p.id.into()),
        Column::text("nombre", "Nombre", |p: &AcademicPeriod| p.name.as_str().into()),
        Column::date("fechaInicio", "Inicio", |p: &AcademicPeriod| p.starts_on.into()),
        Column::date("fechaFin", "Fin", |p: &AcademicPeriod| p.ends_on.into()),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |p: &AcademicPeriod| {
            p.status.as_str().into()
        })
        .searchable(false),
    ]
}

pub fn bimester_columns() -> Vec<Column<Bimester>> {
    vec![
        Column::number("id", "ID", |b: &Bimester| b.id.into()),
        Column::number("periodoId", "Periodo", |b: &Bimester| b.period_id.into()),
        Column::number("numero", "Número", |b: &Bimester| u32::from(b.number).into()),
        Column::date("fechaInicio", "Inicio", |b: &Bimester| b.starts_on.into()),
        Column::date("fechaFin", "Fin", |b: &Bimester| b.ends_on.into()),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |b: &Bimester| {
            b.status.as_str().into()
        })
        .searchable(false),
    ]
}

pub fn class_columns() -> Vec<Column<ClassGroup>> {
    vec![
        Column::number("id", "ID", |c: &ClassGroup| c.id.into()),
        Column::text("curso", "Curso", |c: &ClassGroup| c.course.as_str().into()),
        Column::number("aulaId", "Aula", |c: &ClassGroup| c.classroom_id.into()),
        Column::number("profesorId", "Profesor", |c: &ClassGroup| c.teacher_id.into()),
        Column::number("periodoId", "Periodo", |c: &ClassGroup| c.period_id.into()),
        Column::number("estudiantes", "Matriculados", |c: &ClassGroup| {
            FieldValue::Number(c.roster_size() as f64)
        }),
        Column::new(STATUS_KEY, "Estado", ColumnKind::Text, |c: &ClassGroup| {
            c.status.as_str().into()
        })
        .searchable(false),
    ]
}
