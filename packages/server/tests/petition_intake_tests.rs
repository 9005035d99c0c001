//! Integration tests for petition intake: reference validation, the duplicate
//! guard, the eligibility check, and the atomic signature fan-out.

mod common;

use test_context::test_context;

use registrar_core::common::{CohortId, ProgramId, StudentId};
use registrar_core::domains::petitions::models::{PetitionStatus, SignatureStatus};
use registrar_core::domains::petitions::{create_petition, CreatePetitionRequest, PetitionError};
use registrar_core::domains::students::models::DocumentType;

use crate::common::fixtures::{self, World};
use crate::common::TestHarness;

fn request_for(world: &World) -> CreatePetitionRequest {
    CreatePetitionRequest::builder()
        .student_id(world.student.id)
        .advisor_id(world.advisor_id)
        .current_program_id(world.current_program.id)
        .new_program_id(world.new_program.id)
        .current_cohort_id(world.current_cohort.id)
        .new_cohort_id(world.new_cohort.id)
        .current_group(World::CURRENT_GROUP)
        .new_group(World::NEW_GROUP)
        .reason("Student requested a move to data science")
        .build()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn create_fans_out_one_pending_signature_per_required_area(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);

    let bundle = create_petition(request_for(&world), &ctx.deps)
        .await
        .expect("creation should succeed");

    assert_eq!(bundle.petition.status, PetitionStatus::Pending);
    assert_eq!(bundle.signatures.len(), world.areas.len());
    assert!(bundle
        .signatures
        .iter()
        .all(|s| s.status == SignatureStatus::Pending && s.signer_id.is_none()));

    // One signature per required area, no more, no fewer.
    let mut fanned_out: Vec<_> = bundle.signatures.iter().map(|s| s.area_id).collect();
    let mut required: Vec<_> = world.areas.iter().map(|a| a.id).collect();
    fanned_out.sort();
    required.sort();
    assert_eq!(fanned_out, required);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn petition_ids_sort_by_creation_time(ctx: &TestHarness) {
    // Ids are v7, so petitions created later compare greater. The sleep puts
    // the two creations in different timestamp milliseconds.
    let first_world = fixtures::seed_world(ctx);
    let first = create_petition(request_for(&first_world), &ctx.deps)
        .await
        .expect("first creation should succeed");

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    let second_world = fixtures::seed_world(ctx);
    let second = create_petition(request_for(&second_world), &ctx.deps)
        .await
        .expect("second creation should succeed");

    assert!(first.petition.id < second.petition.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn empty_reason_is_rejected(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);
    let mut request = request_for(&world);
    request.reason = "   ".to_string();

    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, PetitionError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn noop_target_is_rejected(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);
    let mut request = request_for(&world);
    request.new_program_id = world.current_program.id;
    request.new_cohort_id = world.current_cohort.id;

    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, PetitionError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_references_are_rejected(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);

    let mut request = request_for(&world);
    request.student_id = StudentId::new();
    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, PetitionError::Validation(_)));

    let mut request = request_for(&world);
    request.new_program_id = ProgramId::new();
    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, PetitionError::Validation(_)));

    let mut request = request_for(&world);
    request.new_cohort_id = CohortId::new();
    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, PetitionError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_transcript_blocks_with_exact_list(ctx: &TestHarness) {
    // Scenario C: the student has everything except the prior transcript.
    let world = fixtures::seed_world_with_documents(
        ctx,
        &[DocumentType::BirthCertificate, DocumentType::PaymentProof],
    );

    let err = create_petition(request_for(&world), &ctx.deps)
        .await
        .unwrap_err();

    match err {
        PetitionError::EligibilityBlocked {
            missing_documents,
            blocking_procedures,
        } => {
            assert_eq!(missing_documents, vec![DocumentType::PriorTranscript]);
            assert!(blocking_procedures.is_empty());
        }
        other => panic!("expected EligibilityBlocked, got {other:?}"),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn pending_petition_blocks_a_new_one_for_the_student(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);
    create_petition(request_for(&world), &ctx.deps)
        .await
        .expect("first creation should succeed");

    // Different target cohort, so the duplicate guard does not apply; the
    // open petition is still a blocking procedure.
    let other_cohort = fixtures::cohort("2027 A", 2027);
    ctx.store.seed_cohort(other_cohort.clone());
    let mut request = request_for(&world);
    request.new_cohort_id = other_cohort.id;

    let err = create_petition(request, &ctx.deps).await.unwrap_err();
    match err {
        PetitionError::EligibilityBlocked {
            missing_documents,
            blocking_procedures,
        } => {
            assert!(missing_documents.is_empty());
            assert_eq!(blocking_procedures.len(), 1);
            assert!(blocking_procedures[0].contains("pending career-change petition"));
        }
        other => panic!("expected EligibilityBlocked, got {other:?}"),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_target_is_rejected_with_the_existing_petition(ctx: &TestHarness) {
    let world = fixtures::seed_world(ctx);
    let first = create_petition(request_for(&world), &ctx.deps)
        .await
        .expect("first creation should succeed");

    let err = create_petition(request_for(&world), &ctx.deps)
        .await
        .unwrap_err();

    match err {
        PetitionError::DuplicatePetition { existing } => {
            assert_eq!(existing, first.petition.id);
        }
        other => panic!("expected DuplicatePetition, got {other:?}"),
    }
}

#[test_context(TestHarness)]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_for_the_same_target_admit_exactly_one(ctx: &TestHarness) {
    // Scenario D: two advisors race on the same (student, target) triple.
    let world = fixtures::seed_world(ctx);

    let deps_a = ctx.deps.clone();
    let deps_b = ctx.deps.clone();
    let request_a = request_for(&world);
    let request_b = request_for(&world);

    let (a, b) = tokio::join!(
        tokio::spawn(async move { create_petition(request_a, &deps_a).await }),
        tokio::spawn(async move { create_petition(request_b, &deps_b).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1, "exactly one creation must win");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(PetitionError::DuplicatePetition { .. })
    )));
}
