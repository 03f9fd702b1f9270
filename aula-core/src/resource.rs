//! Resource naming shared between feature modules.
//!
//! Collection names address list caches (`["aulas", ...params]`); detail names
//! address single-record caches (`["aula", id]`). Invalidating a bare detail
//! name clears every cached record of that kind.

use crate::{
    AcademicPeriod, AcademicPeriodDraft, Bimester, BimesterDraft, ClassGroup, ClassGroupDraft,
    Classroom, ClassroomDraft, EntityId, RecordStatus, Student, StudentDraft, Teacher,
    TeacherDraft,
};
use serde::{de::DeserializeOwned, Serialize};

pub const ESTUDIANTES: &str = "estudiantes";
pub const PROFESORES: &str = "profesores";
pub const AULAS: &str = "aulas";
pub const PERIODOS: &str = "periodos";
pub const BIMESTRES: &str = "bimestres";
pub const CLASES: &str = "clases";

/// A record type served by the backend under a collection endpoint.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also the REST path segment.
    const COLLECTION: &'static str;
    /// Singular name used for detail cache keys.
    const DETAIL: &'static str;

    fn id(&self) -> EntityId;

    fn status(&self) -> RecordStatus;

    /// Copy of the record with `status` replaced; used for optimistic
    /// status toggles.
    fn with_status(&self, status: RecordStatus) -> Self;

    /// Short label for notifications ("Aula A", "Ana Pérez").
    fn label(&self) -> String;
}

/// A resource that can be created from, and edited through, a draft payload.
pub trait Drafted: Resource {
    /// Body of `POST {collection}` and `PUT {collection}/{id}`.
    type Draft: Serialize + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// The editable fields of this record, for prefilling an edit form.
    fn to_draft(&self) -> Self::Draft;
}

impl Resource for Student {
    const COLLECTION: &'static str = ESTUDIANTES;
    const DETAIL: &'static str = "estudiante";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl Resource for Teacher {
    const COLLECTION: &'static str = PROFESORES;
    const DETAIL: &'static str = "profesor";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl Resource for Classroom {
    const COLLECTION: &'static str = AULAS;
    const DETAIL: &'static str = "aula";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        format!("Aula {}", self.section)
    }
}

impl Resource for AcademicPeriod {
    const COLLECTION: &'static str = PERIODOS;
    const DETAIL: &'static str = "periodo";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        format!("Periodo {}", self.name)
    }
}

impl Resource for Bimester {
    const COLLECTION: &'static str = BIMESTRES;
    const DETAIL: &'static str = "bimestre";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        format!("Bimestre {}", self.number)
    }
}

impl Resource for ClassGroup {
    const COLLECTION: &'static str = CLASES;
    const DETAIL: &'static str = "clase";

    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn with_status(&self, status: RecordStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn label(&self) -> String {
        self.course.clone()
    }
}

impl Drafted for Student {
    type Draft = StudentDraft;

    fn to_draft(&self) -> StudentDraft {
        StudentDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            document: self.document.clone(),
            email: self.email.clone(),
            birth_date: self.birth_date,
            classroom_id: self.classroom_id,
        }
    }
}

impl Drafted for Teacher {
    type Draft = TeacherDraft;

    fn to_draft(&self) -> TeacherDraft {
        TeacherDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            specialty: self.specialty.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl Drafted for Classroom {
    type Draft = ClassroomDraft;

    fn to_draft(&self) -> ClassroomDraft {
        ClassroomDraft {
            section: self.section.clone(),
            student_capacity: self.student_capacity,
            grade: self.grade,
            shift: self.shift,
        }
    }
}

impl Drafted for AcademicPeriod {
    type Draft = AcademicPeriodDraft;

    fn to_draft(&self) -> AcademicPeriodDraft {
        AcademicPeriodDraft {
            name: self.name.clone(),
            starts_on: self.starts_on,
            ends_on: self.ends_on,
        }
    }
}

impl Drafted for Bimester {
    type Draft = BimesterDraft;

    fn to_draft(&self) -> BimesterDraft {
        BimesterDraft {
            period_id: self.period_id,
            number: self.number,
            starts_on: self.starts_on,
            ends_on: self.ends_on,
        }
    }
}

impl Drafted for ClassGroup {
    type Draft = ClassGroupDraft;

    fn to_draft(&self) -> ClassGroupDraft {
        ClassGroupDraft {
            course: self.course.clone(),
            classroom_id: self.classroom_id,
            teacher_id: self.teacher_id,
            period_id: self.period_id,
            student_ids: self.student_ids.clone(),
        }
    }
}
