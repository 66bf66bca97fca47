//! # Verification Request Ledger
//!
//! Named batches of terminals submitted together for inspection.
//!
//! ```text
//! [PENDING] ──process──→ [PROCESSED]
//! ```
//!
//! Processing is one-way. A request's id and creation time may be corrected
//! afterwards; the terminal histories referencing it are retagged by the
//! caller.

use serde::{Deserialize, Serialize};

use super::entities::{Actor, SerialNumber, Timestamp, VerificationRequest, VerificationRequestStatus};
use super::errors::{LedgerError, LedgerResult};

/// All verification requests, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationLedger {
    requests: Vec<VerificationRequest>,
}

impl VerificationLedger {
    pub fn iter(&self) -> std::slice::Iter<'_, VerificationRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VerificationRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.requests.iter().filter(|r| r.is_pending()).count()
    }

    /// Picks the id for a new request.
    ///
    /// A non-blank `custom` id is used verbatim (trimmed) and must be unused.
    /// Otherwise `generate` is called with `len() + 1`, bumping the ordinal
    /// until the result is unused.
    pub fn allocate_id<F>(&self, custom: Option<&str>, generate: F) -> LedgerResult<String>
    where
        F: Fn(usize) -> String,
    {
        if let Some(id) = custom.map(str::trim).filter(|id| !id.is_empty()) {
            if self.contains(id) {
                return Err(LedgerError::DuplicateRequestId(id.to_string()));
            }
            return Ok(id.to_string());
        }

        let mut ordinal = self.requests.len() + 1;
        loop {
            let candidate = generate(ordinal);
            if !self.contains(&candidate) {
                return Ok(candidate);
            }
            ordinal += 1;
        }
    }

    /// Records a new pending request at the front of the ledger.
    pub fn open(
        &mut self,
        id: String,
        terminal_ids: Vec<SerialNumber>,
        created_by: Actor,
        now: Timestamp,
    ) -> &VerificationRequest {
        self.requests.insert(
            0,
            VerificationRequest {
                id,
                status: VerificationRequestStatus::Pending,
                created_at: now,
                processed_at: None,
                terminal_ids,
                created_by,
            },
        );
        &self.requests[0]
    }

    /// Marks a pending request processed.
    ///
    /// # Errors
    /// - `RequestNotFound`: unknown id
    /// - `RequestAlreadyProcessed`: request was processed earlier
    pub fn process(&mut self, id: &str, now: Timestamp) -> LedgerResult<&VerificationRequest> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| LedgerError::RequestNotFound(id.to_string()))?;
        if !request.is_pending() {
            return Err(LedgerError::RequestAlreadyProcessed(id.to_string()));
        }
        request.status = VerificationRequestStatus::Processed;
        request.processed_at = Some(now);
        Ok(request)
    }

    /// Renames and re-dates a request. Returns the trimmed new id.
    ///
    /// # Errors
    /// - `RequestNotFound`: unknown `old_id`
    /// - `EmptyIdentifier`: blank `new_id`
    /// - `DuplicateRequestId`: `new_id` belongs to another request
    pub fn update_details(
        &mut self,
        old_id: &str,
        new_id: &str,
        created_at: Timestamp,
    ) -> LedgerResult<String> {
        let new_id = new_id.trim();
        if !self.contains(old_id) {
            return Err(LedgerError::RequestNotFound(old_id.to_string()));
        }
        if new_id.is_empty() {
            return Err(LedgerError::EmptyIdentifier { field: "request id" });
        }
        if new_id != old_id && self.contains(new_id) {
            return Err(LedgerError::DuplicateRequestId(new_id.to_string()));
        }

        if let Some(request) = self.requests.iter_mut().find(|r| r.id == old_id) {
            request.id = new_id.to_string();
            request.created_at = created_at;
        }
        Ok(new_id.to_string())
    }
}
