// Test dependencies - in-memory implementations for testing
//
// Provides collaborator doubles that can be injected into ServerDeps for
// tests: a record store with the same conditional-write semantics as the
// Postgres one, an object store over a key set, and call-capturing mocks for
// the notification sink and credential verifier.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::common::{
    CohortId, DocumentId, PetitionId, ProgramId, SignatureId, StudentId, UserId,
};
use crate::domains::notifications::models::NotificationKind;
use crate::domains::petitions::models::{
    NewPetition, Petition, PetitionStatus, Signature, SignatureStatus,
};
use crate::domains::students::models::{Area, Cohort, Document, Program, Student};
use crate::kernel::traits::{
    BaseCredentialVerifier, BaseNotificationSink, BaseObjectStore, BaseRecordStore,
    PetitionBundle, PetitionInsert,
};

// =============================================================================
// In-memory record store
// =============================================================================

#[derive(Default)]
struct MemoryState {
    students: BTreeMap<StudentId, Student>,
    programs: BTreeMap<ProgramId, Program>,
    cohorts: BTreeMap<CohortId, Cohort>,
    areas: Vec<Area>,
    documents: BTreeMap<DocumentId, Document>,
    petitions: BTreeMap<PetitionId, Petition>,
    signatures: BTreeMap<SignatureId, Signature>,
}

/// Record store over in-process maps.
///
/// All writes run under one lock, so the conditional-update guarantees match
/// the Postgres store: the fan-out insert is atomic with its duplicate check,
/// and the `*_if_pending` writes admit exactly one winner.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_student(&self, student: Student) {
        self.state
            .lock()
            .unwrap()
            .students
            .insert(student.id, student);
    }

    pub fn seed_program(&self, program: Program) {
        self.state
            .lock()
            .unwrap()
            .programs
            .insert(program.id, program);
    }

    pub fn seed_cohort(&self, cohort: Cohort) {
        self.state.lock().unwrap().cohorts.insert(cohort.id, cohort);
    }

    pub fn seed_area(&self, area: Area) {
        self.state.lock().unwrap().areas.push(area);
    }

    pub fn seed_document(&self, document: Document) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(document.id, document);
    }

    /// Current snapshot of a student row (test assertions).
    pub fn student(&self, id: StudentId) -> Option<Student> {
        self.state.lock().unwrap().students.get(&id).cloned()
    }

    /// Current snapshot of a document row (test assertions).
    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.state.lock().unwrap().documents.get(&id).cloned()
    }
}

#[async_trait]
impl BaseRecordStore for MemoryRecordStore {
    async fn find_student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self.state.lock().unwrap().students.get(&id).cloned())
    }

    async fn find_program(&self, id: ProgramId) -> Result<Option<Program>> {
        Ok(self.state.lock().unwrap().programs.get(&id).cloned())
    }

    async fn find_cohort(&self, id: CohortId) -> Result<Option<Cohort>> {
        Ok(self.state.lock().unwrap().cohorts.get(&id).cloned())
    }

    async fn required_areas(&self) -> Result<Vec<Area>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .areas
            .iter()
            .filter(|a| a.requires_signature)
            .cloned()
            .collect())
    }

    async fn documents_for_student(&self, student_id: StudentId) -> Result<Vec<Document>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .values()
            .filter(|d| d.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn find_petition(&self, id: PetitionId) -> Result<Option<Petition>> {
        Ok(self.state.lock().unwrap().petitions.get(&id).cloned())
    }

    async fn find_signature(&self, id: SignatureId) -> Result<Option<Signature>> {
        Ok(self.state.lock().unwrap().signatures.get(&id).cloned())
    }

    async fn signatures_for_petition(&self, petition_id: PetitionId) -> Result<Vec<Signature>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .signatures
            .values()
            .filter(|s| s.petition_id == petition_id)
            .cloned()
            .collect())
    }

    async fn pending_petitions_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<Petition>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .petitions
            .values()
            .filter(|p| p.student_id == student_id && p.status == PetitionStatus::Pending)
            .cloned()
            .collect())
    }

    async fn find_pending_duplicate(
        &self,
        student_id: StudentId,
        new_program_id: ProgramId,
        new_cohort_id: CohortId,
    ) -> Result<Option<Petition>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .petitions
            .values()
            .find(|p| {
                p.student_id == student_id
                    && p.new_program_id == new_program_id
                    && p.new_cohort_id == new_cohort_id
                    && p.status == PetitionStatus::Pending
            })
            .cloned())
    }

    async fn create_petition_with_signatures(
        &self,
        new: NewPetition,
        areas: &[Area],
    ) -> Result<PetitionInsert> {
        let mut state = self.state.lock().unwrap();

        // Duplicate check and insert under the same lock, mirroring the
        // partial unique index in Postgres.
        let existing = state.petitions.values().find(|p| {
            p.student_id == new.student_id
                && p.new_program_id == new.new_program_id
                && p.new_cohort_id == new.new_cohort_id
                && p.status == PetitionStatus::Pending
        });
        if let Some(existing) = existing {
            return Ok(PetitionInsert::DuplicateOf(existing.id));
        }

        let petition = Petition {
            id: PetitionId::new(),
            student_id: new.student_id,
            advisor_id: new.advisor_id,
            current_program_id: new.current_program_id,
            new_program_id: new.new_program_id,
            current_cohort_id: new.current_cohort_id,
            new_cohort_id: new.new_cohort_id,
            current_group: new.current_group,
            new_group: new.new_group,
            reason: new.reason,
            status: PetitionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };

        let signatures: Vec<Signature> = areas
            .iter()
            .map(|area| Signature {
                id: SignatureId::new(),
                petition_id: petition.id,
                area_id: area.id,
                signer_id: None,
                status: SignatureStatus::Pending,
                signed_at: None,
                comments: None,
            })
            .collect();

        state.petitions.insert(petition.id, petition.clone());
        for signature in &signatures {
            state.signatures.insert(signature.id, signature.clone());
        }

        Ok(PetitionInsert::Created(PetitionBundle {
            petition,
            signatures,
        }))
    }

    async fn sign_if_pending(
        &self,
        id: SignatureId,
        decision: SignatureStatus,
        signer_id: UserId,
        comments: Option<String>,
    ) -> Result<Option<Signature>> {
        let mut state = self.state.lock().unwrap();
        match state.signatures.get_mut(&id) {
            Some(signature) if signature.status == SignatureStatus::Pending => {
                signature.status = decision;
                signature.signer_id = Some(signer_id);
                signature.signed_at = Some(Utc::now());
                signature.comments = comments;
                Ok(Some(signature.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn resolve_if_pending(
        &self,
        id: PetitionId,
        terminal: PetitionStatus,
        resolved_by: UserId,
    ) -> Result<Option<Petition>> {
        let mut state = self.state.lock().unwrap();
        match state.petitions.get_mut(&id) {
            Some(petition) if petition.status == PetitionStatus::Pending => {
                petition.status = terminal;
                petition.resolved_at = Some(Utc::now());
                petition.resolved_by = Some(resolved_by);
                Ok(Some(petition.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_student_placement(
        &self,
        id: StudentId,
        program_id: ProgramId,
        cohort_id: CohortId,
        group_name: &str,
    ) -> Result<Student> {
        let mut state = self.state.lock().unwrap();
        let student = state
            .students
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("student not found: {id}"))?;
        student.program_id = program_id;
        student.cohort_id = cohort_id;
        student.group_name = group_name.to_string();
        Ok(student.clone())
    }

    async fn set_document_storage_key(&self, id: DocumentId, storage_key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(document) = state.documents.get_mut(&id) {
            document.storage_key = storage_key.to_string();
        }
        Ok(())
    }
}

// =============================================================================
// Mock object store
// =============================================================================

/// Object store over an in-memory key set, with per-key failure injection.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    keys: Arc<Mutex<HashSet<String>>>,
    failing_copies: Arc<Mutex<HashSet<String>>>,
    copy_calls: Arc<Mutex<Vec<(String, String)>>>,
    delete_calls: Arc<Mutex<Vec<String>>>,
    placeholder_calls: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object at `key`.
    pub fn with_object(self, key: &str) -> Self {
        self.keys.lock().unwrap().insert(key.to_string());
        self
    }

    /// Make every `copy` with this source key fail.
    pub fn failing_copy_of(self, src_key: &str) -> Self {
        self.failing_copies.lock().unwrap().insert(src_key.to_string());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().unwrap().contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.lock().unwrap().iter().cloned().collect();
        keys.sort();
        keys
    }

    pub fn copy_calls(&self) -> Vec<(String, String)> {
        self.copy_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn placeholder_calls(&self) -> Vec<String> {
        self.placeholder_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseObjectStore for MockObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        self.copy_calls
            .lock()
            .unwrap()
            .push((src_key.to_string(), dst_key.to_string()));

        if self.failing_copies.lock().unwrap().contains(src_key) {
            anyhow::bail!("injected copy failure for {src_key}");
        }

        let mut keys = self.keys.lock().unwrap();
        if !keys.contains(src_key) {
            anyhow::bail!("source object missing: {src_key}");
        }
        keys.insert(dst_key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.delete_calls.lock().unwrap().push(key.to_string());
        // Absent keys are fine: delete is idempotent.
        self.keys.lock().unwrap().remove(key);
        Ok(())
    }

    async fn put_placeholder(&self, prefix: &str) -> Result<()> {
        self.placeholder_calls.lock().unwrap().push(prefix.to_string());
        self.keys
            .lock()
            .unwrap()
            .insert(format!("{}/.keep", prefix.trim_end_matches('/')));
        Ok(())
    }
}

// =============================================================================
// Mock notification sink
// =============================================================================

/// One captured `notify` call.
#[derive(Debug, Clone)]
pub struct RecordedNotification {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct MockNotificationSink {
    sent: Arc<Mutex<Vec<RecordedNotification>>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<RecordedNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient_id: UserId) -> Vec<RecordedNotification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BaseNotificationSink for MockNotificationSink {
    async fn notify(
        &self,
        recipient_id: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        metadata: serde_json::Value,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(RecordedNotification {
            recipient_id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            metadata,
        });
        Ok(())
    }
}

// =============================================================================
// Mock credential verifier
// =============================================================================

/// Verifier that accepts one known credential string.
#[derive(Clone)]
pub struct MockCredentialVerifier {
    accepted: String,
    calls: Arc<Mutex<Vec<UserId>>>,
}

impl MockCredentialVerifier {
    pub fn accepting(credential: &str) -> Self {
        Self {
            accepted: credential.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn verified_signers(&self) -> Vec<UserId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCredentialVerifier for MockCredentialVerifier {
    async fn verify(&self, signer_id: UserId, presented_credential: &str) -> Result<bool> {
        self.calls.lock().unwrap().push(signer_id);
        Ok(presented_credential == self.accepted)
    }
}
