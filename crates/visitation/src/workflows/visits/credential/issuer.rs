use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{canonical_credential, CredentialPayload};
use crate::config::FacilityConfig;
use crate::workflows::visits::domain::{EntryCredential, VisitRequest};
use crate::workflows::visits::gateway::{CredentialRenderer, CredentialRendering, RenderError};
use crate::workflows::visits::repository::{CredentialRepository, RepositoryError};

/// Credential handed back to the caller after approval or reissue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCredential {
    pub credential: EntryCredential,
    pub payload: CredentialPayload,
    /// Absent when the renderer failed; the canonical record still stands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering: Option<CredentialRendering>,
}

/// Builds, persists, and renders canonical entry credentials.
pub struct CredentialIssuer<S> {
    store: Arc<S>,
    renderer: Arc<dyn CredentialRenderer>,
    facility: FacilityConfig,
}

impl<S> CredentialIssuer<S>
where
    S: CredentialRepository,
{
    pub fn new(
        store: Arc<S>,
        renderer: Arc<dyn CredentialRenderer>,
        facility: FacilityConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            facility,
        }
    }

    /// Canonical record for an approved request; not yet persisted.
    pub fn build(&self, request: &VisitRequest, approved_at: DateTime<Utc>) -> EntryCredential {
        canonical_credential(request, approved_at, &self.facility)
    }

    /// Persist the canonical credential. At most one exists per visit: a
    /// second call for the same visit fails with `Conflict`.
    pub fn persist(
        &self,
        request: &VisitRequest,
        approved_at: DateTime<Utc>,
    ) -> Result<EntryCredential, RepositoryError> {
        self.store.insert_if_absent(self.build(request, approved_at))
    }

    pub fn payload(&self, credential: &EntryCredential) -> CredentialPayload {
        CredentialPayload::from_credential(credential, &self.facility)
    }

    /// Render a persisted credential. A rendering failure is returned next to
    /// the credential rather than instead of it.
    pub fn render(&self, credential: EntryCredential) -> (IssuedCredential, Option<RenderError>) {
        let payload = self.payload(&credential);
        let (rendering, failure) = match self.renderer.encode(&payload) {
            Ok(rendering) => (Some(rendering), None),
            Err(err) => (None, Some(err)),
        };

        (
            IssuedCredential {
                credential,
                payload,
                rendering,
            },
            failure,
        )
    }
}
