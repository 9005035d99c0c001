//! Test fixtures for seeding the in-memory world.

use chrono::{NaiveDate, Utc};

use registrar_core::common::{AreaId, CohortId, DocumentId, ProgramId, StudentId, UserId};
use registrar_core::domains::petitions::effects::storage_prefix;
use registrar_core::domains::students::models::{
    Area, Cohort, Document, DocumentType, Program, Student, StudentStatus,
};

use super::TestHarness;

/// Credential accepted by the harness verifier.
pub const VALID_CREDENTIAL: &str = "otp-348091";

pub fn program(name: &str) -> Program {
    Program {
        id: ProgramId::new(),
        name: name.to_string(),
        duration_months: 24,
        created_at: Utc::now(),
    }
}

pub fn cohort(name: &str, year: i32) -> Cohort {
    Cohort {
        id: CohortId::new(),
        name: name.to_string(),
        starts_on: NaiveDate::from_ymd_opt(year, 2, 1).unwrap(),
        ends_on: NaiveDate::from_ymd_opt(year + 2, 1, 31).unwrap(),
        created_at: Utc::now(),
    }
}

pub fn required_area(name: &str) -> Area {
    Area {
        id: AreaId::new(),
        name: name.to_string(),
        requires_signature: true,
        created_at: Utc::now(),
    }
}

/// A fully seeded world: a student with every required document on file and
/// on disk, a current and a target placement, and three required areas.
pub struct World {
    pub student: Student,
    pub advisor_id: UserId,
    pub current_program: Program,
    pub new_program: Program,
    pub current_cohort: Cohort,
    pub new_cohort: Cohort,
    pub areas: Vec<Area>,
    pub documents: Vec<Document>,
    /// Object-store prefix of the student's current documents.
    pub current_prefix: String,
    /// Object-store prefix after an approved move.
    pub new_prefix: String,
}

impl World {
    pub const CURRENT_GROUP: &'static str = "G1";
    pub const NEW_GROUP: &'static str = "G2";
}

/// Seed the standard world: every required document on file.
pub fn seed_world(ctx: &TestHarness) -> World {
    seed_world_with_documents(ctx, &DocumentType::REQUIRED)
}

/// Seed the standard world with only the given documents on file.
pub fn seed_world_with_documents(ctx: &TestHarness, doc_types: &[DocumentType]) -> World {
    let current_program = program("Software Engineering");
    let new_program = program("Data Science");
    let current_cohort = cohort("2026 A", 2026);
    let new_cohort = cohort("2026 B", 2026);

    let advisor_id = UserId::new();
    let student = Student {
        id: StudentId::new(),
        full_name: "Alice Moreno".to_string(),
        enrollment_code: "STU-0042".to_string(),
        program_id: current_program.id,
        cohort_id: current_cohort.id,
        group_name: World::CURRENT_GROUP.to_string(),
        status: StudentStatus::Active,
        advisor_id,
        created_at: Utc::now(),
    };

    let areas = vec![
        required_area("Academic Records"),
        required_area("Finance"),
        required_area("Library"),
    ];

    let current_prefix = storage_prefix(
        &current_program.name,
        &current_cohort.name,
        World::CURRENT_GROUP,
        &student.enrollment_code,
    );
    let new_prefix = storage_prefix(
        &new_program.name,
        &new_cohort.name,
        World::NEW_GROUP,
        &student.enrollment_code,
    );

    let documents: Vec<Document> = doc_types
        .iter()
        .map(|doc_type| Document {
            id: DocumentId::new(),
            student_id: student.id,
            doc_type: *doc_type,
            storage_key: format!("{}/{}.pdf", current_prefix, doc_type.as_str()),
            uploaded_at: Utc::now(),
        })
        .collect();

    ctx.store.seed_program(current_program.clone());
    ctx.store.seed_program(new_program.clone());
    ctx.store.seed_cohort(current_cohort.clone());
    ctx.store.seed_cohort(new_cohort.clone());
    ctx.store.seed_student(student.clone());
    for area in &areas {
        ctx.store.seed_area(area.clone());
    }
    for document in &documents {
        ctx.store.seed_document(document.clone());
        let _ = ctx.objects.clone().with_object(&document.storage_key);
    }

    World {
        student,
        advisor_id,
        current_program,
        new_program,
        current_cohort,
        new_cohort,
        areas,
        documents,
        current_prefix,
        new_prefix,
    }
}
