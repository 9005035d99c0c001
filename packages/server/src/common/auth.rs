//! Signer principal and area scoping.
//!
//! A signature decision is made by a [`Signer`]: the acting staff user plus an
//! explicit scope. Scope is a closed enum resolved once at the call boundary
//! (from the session/JWT of the surrounding application), never re-derived
//! from role strings inside the workflow. Registrar-wide access is an explicit
//! `AllAreas` capability, not a missing foreign key.

use crate::common::entity_ids::{AreaId, UserId};

/// What the signer is allowed to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerScope {
    /// May only decide signatures belonging to this area.
    Area(AreaId),
    /// Registrar-level capability: may decide signatures for any area.
    AllAreas,
}

/// The principal submitting a signature decision.
#[derive(Debug, Clone, Copy)]
pub struct Signer {
    pub user_id: UserId,
    pub scope: SignerScope,
}

impl Signer {
    pub fn new(user_id: UserId, scope: SignerScope) -> Self {
        Self { user_id, scope }
    }

    /// Convenience constructor for an area-scoped signer.
    pub fn for_area(user_id: UserId, area_id: AreaId) -> Self {
        Self::new(user_id, SignerScope::Area(area_id))
    }

    /// Whether this signer may decide a signature owned by `area_id`.
    pub fn may_sign_for(&self, area_id: AreaId) -> bool {
        match self.scope {
            SignerScope::AllAreas => true,
            SignerScope::Area(own) => own == area_id,
        }
    }
}
