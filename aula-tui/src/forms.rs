//! Create and edit forms.
//!
//! A form is a flat list of text fields. Each draft type describes its
//! fields and how to parse them back; values are kept as typed and only
//! parsed on submit.

use aula_core::{
    AcademicPeriodDraft, BimesterDraft, ClassGroupDraft, ClassroomDraft, Date, EntityId,
    StudentDraft, TeacherDraft,
};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub required: bool,
}

const fn required(label: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        required: true,
    }
}

const fn optional(label: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        required: false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{field} es obligatorio")]
    Missing { field: &'static str },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A draft payload that can be edited as a form.
pub trait DraftForm: Sized {
    /// Singular noun for titles ("aula").
    const NOUN: &'static str;
    const FIELDS: &'static [FieldSpec];

    /// Field values in [`FIELDS`](Self::FIELDS) order.
    fn values(&self) -> Vec<String>;

    fn parse(values: &[String]) -> Result<Self, FormError>;
}

/// Reads values in field order, checking required fields.
struct Reader<'a> {
    fields: &'static [FieldSpec],
    values: &'a [String],
    next: usize,
}

impl<'a> Reader<'a> {
    fn new(fields: &'static [FieldSpec], values: &'a [String]) -> Self {
        Self {
            fields,
            values,
            next: 0,
        }
    }

    fn take(&mut self) -> Result<(&'static str, Option<&'a str>), FormError> {
        let spec = self.fields.get(self.next).copied().unwrap_or(optional(""));
        let value = self
            .values
            .get(self.next)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty());
        self.next += 1;
        match value {
            None if spec.required => Err(FormError::Missing { field: spec.label }),
            value => Ok((spec.label, value)),
        }
    }

    fn text(&mut self) -> Result<String, FormError> {
        Ok(self.optional_text()?.unwrap_or_default())
    }

    fn optional_text(&mut self) -> Result<Option<String>, FormError> {
        Ok(self.take()?.1.map(str::to_string))
    }

    fn parsed<T>(&mut self) -> Result<T, FormError>
    where
        T: FromStr + Default,
        T::Err: Display,
    {
        Ok(self.optional()?.unwrap_or_default())
    }

    fn optional<T>(&mut self) -> Result<Option<T>, FormError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let (field, value) = self.take()?;
        value
            .map(|raw| {
                raw.parse::<T>().map_err(|err| FormError::Invalid {
                    field,
                    reason: err.to_string(),
                })
            })
            .transpose()
    }

    fn date(&mut self) -> Result<Date, FormError> {
        let (field, value) = self.take()?;
        let raw = value.unwrap_or_default();
        raw.parse::<Date>().map_err(|_| FormError::Invalid {
            field,
            reason: format!("fecha inválida '{}', use AAAA-MM-DD", raw),
        })
    }

    fn optional_date(&mut self) -> Result<Option<Date>, FormError> {
        let (field, value) = self.take()?;
        value
            .map(|raw| {
                raw.parse::<Date>().map_err(|_| FormError::Invalid {
                    field,
                    reason: format!("fecha inválida '{}', use AAAA-MM-DD", raw),
                })
            })
            .transpose()
    }

    /// Comma-separated record ids.
    fn ids(&mut self) -> Result<Vec<EntityId>, FormError> {
        let (field, value) = self.take()?;
        value
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<EntityId>().map_err(|_| FormError::Invalid {
                    field,
                    reason: format!("id inválido '{}'", part),
                })
            })
            .collect()
    }
}

fn ordered_dates(starts_on: Date, ends_on: Date) -> Result<(), FormError> {
    if ends_on < starts_on {
        return Err(FormError::Invalid {
            field: "Fin",
            reason: "termina antes de empezar".to_string(),
        });
    }
    Ok(())
}

fn shown<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

impl DraftForm for StudentDraft {
    const NOUN: &'static str = "estudiante";
    const FIELDS: &'static [FieldSpec] = &[
        required("Nombres"),
        required("Apellidos"),
        required("DNI"),
        required("Email"),
        optional("Nacimiento (AAAA-MM-DD)"),
        optional("Aula (id)"),
    ];

    fn values(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.document.clone(),
            self.email.clone(),
            shown(self.birth_date),
            shown(self.classroom_id),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        Ok(Self {
            first_name: reader.text()?,
            last_name: reader.text()?,
            document: reader.text()?,
            email: reader.text()?,
            birth_date: reader.optional_date()?,
            classroom_id: reader.optional()?,
        })
    }
}

impl DraftForm for TeacherDraft {
    const NOUN: &'static str = "profesor";
    const FIELDS: &'static [FieldSpec] = &[
        required("Nombres"),
        required("Apellidos"),
        required("Email"),
        required("Especialidad"),
        optional("Teléfono"),
    ];

    fn values(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.specialty.clone(),
            self.phone.clone().unwrap_or_default(),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        Ok(Self {
            first_name: reader.text()?,
            last_name: reader.text()?,
            email: reader.text()?,
            specialty: reader.text()?,
            phone: reader.optional_text()?,
        })
    }
}

impl DraftForm for ClassroomDraft {
    const NOUN: &'static str = "aula";
    const FIELDS: &'static [FieldSpec] = &[
        required("Sección"),
        required("Capacidad"),
        optional("Grado"),
        optional("Turno (mañana/tarde)"),
    ];

    fn values(&self) -> Vec<String> {
        vec![
            self.section.clone(),
            self.student_capacity.to_string(),
            shown(self.grade),
            shown(self.shift),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        Ok(Self {
            section: reader.text()?,
            student_capacity: reader.parsed()?,
            grade: reader.optional()?,
            shift: reader.optional()?,
        })
    }
}

impl DraftForm for AcademicPeriodDraft {
    const NOUN: &'static str = "periodo";
    const FIELDS: &'static [FieldSpec] = &[
        required("Nombre"),
        required("Inicio (AAAA-MM-DD)"),
        required("Fin (AAAA-MM-DD)"),
    ];

    fn values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.starts_on.to_string(),
            self.ends_on.to_string(),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        let draft = Self {
            name: reader.text()?,
            starts_on: reader.date()?,
            ends_on: reader.date()?,
        };
        ordered_dates(draft.starts_on, draft.ends_on)?;
        Ok(draft)
    }
}

impl DraftForm for BimesterDraft {
    const NOUN: &'static str = "bimestre";
    const FIELDS: &'static [FieldSpec] = &[
        required("Periodo (id)"),
        required("Número (1-4)"),
        required("Inicio (AAAA-MM-DD)"),
        required("Fin (AAAA-MM-DD)"),
    ];

    fn values(&self) -> Vec<String> {
        vec![
            self.period_id.to_string(),
            self.number.to_string(),
            self.starts_on.to_string(),
            self.ends_on.to_string(),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        let draft = Self {
            period_id: reader.parsed()?,
            number: reader.parsed()?,
            starts_on: reader.date()?,
            ends_on: reader.date()?,
        };
        if !(1..=4).contains(&draft.number) {
            return Err(FormError::Invalid {
                field: "Número (1-4)",
                reason: format!("{} no es un bimestre", draft.number),
            });
        }
        ordered_dates(draft.starts_on, draft.ends_on)?;
        Ok(draft)
    }
}

impl DraftForm for ClassGroupDraft {
    const NOUN: &'static str = "clase";
    const FIELDS: &'static [FieldSpec] = &[
        required("Curso"),
        required("Aula (id)"),
        required("Profesor (id)"),
        required("Periodo (id)"),
        optional("Estudiantes (ids, separados por coma)"),
    ];

    fn values(&self) -> Vec<String> {
        let students: Vec<String> = self.student_ids.iter().map(|id| id.to_string()).collect();
        vec![
            self.course.clone(),
            self.classroom_id.to_string(),
            self.teacher_id.to_string(),
            self.period_id.to_string(),
            students.join(", "),
        ]
    }

    fn parse(values: &[String]) -> Result<Self, FormError> {
        let mut reader = Reader::new(Self::FIELDS, values);
        Ok(Self {
            course: reader.text()?,
            classroom_id: reader.parsed()?,
            teacher_id: reader.parsed()?,
            period_id: reader.parsed()?,
            student_ids: reader.ids()?,
        })
    }
}

/// What submitting the form does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit(EntityId),
}

/// An open form and its edit state.
#[derive(Debug, Clone)]
pub struct Form {
    title: String,
    fields: &'static [FieldSpec],
    values: Vec<String>,
    focused: usize,
    target: FormTarget,
    error: Option<String>,
    submitting: bool,
    touched: bool,
}

impl Form {
    pub fn create<D: DraftForm>() -> Self {
        Self {
            title: format!("Crear {}", D::NOUN),
            fields: D::FIELDS,
            values: vec![String::new(); D::FIELDS.len()],
            focused: 0,
            target: FormTarget::Create,
            error: None,
            submitting: false,
            touched: false,
        }
    }

    /// Edit form for record `id`, prefilled from `draft`.
    pub fn edit<D: DraftForm>(id: EntityId, draft: &D) -> Self {
        Self {
            title: format!("Editar {} #{}", D::NOUN, id),
            values: draft.values(),
            target: FormTarget::Edit(id),
            ..Self::create::<D>()
        }
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the user has typed into the form.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Replace the values with fresher ones, unless the user already edited.
    pub fn refill(&mut self, values: Vec<String>) {
        if !self.touched && !self.submitting {
            self.values = values;
        }
    }

    pub fn input(&mut self, c: char) {
        if self.submitting {
            return;
        }
        if let Some(value) = self.values.get_mut(self.focused) {
            value.push(c);
            self.touched = true;
        }
    }

    pub fn backspace(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(value) = self.values.get_mut(self.focused) {
            value.pop();
            self.touched = true;
        }
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let count = self.fields.len().max(1);
        self.focused = (self.focused + count - 1) % count;
    }

    /// Parse the values. A parse error is kept for display and returns `None`.
    pub fn parse<D: DraftForm>(&mut self) -> Option<D> {
        match D::parse(&self.values) {
            Ok(draft) => {
                self.error = None;
                Some(draft)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    pub fn begin_submit(&mut self) {
        self.submitting = true;
        self.error = None;
    }

    /// The backend refused: keep the values so the user can correct them.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            title: self.title.clone(),
            fields: self
                .fields
                .iter()
                .zip(&self.values)
                .map(|(spec, value)| FormField {
                    label: spec.label,
                    value: value.clone(),
                    required: spec.required,
                })
                .collect(),
            focused: self.focused,
            error: self.error.clone(),
            submitting: self.submitting,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub title: String,
    pub fields: Vec<FormField>,
    pub focused: usize,
    pub error: Option<String>,
    pub submitting: bool,
}
