//! Entity types exchanged with the parent profile form.
//!
//! The photo collection is owned by the form, not by the editor; the editor
//! only ever hands back a new image, and the form records it by replacing
//! the photo's `url`. Field names serialize in camelCase to match the wire
//! format the web client already uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
}

/// One photo in a profile's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub url: String,
    pub is_primary: bool,
    pub verification_status: VerificationStatus,
}

impl Photo {
    /// Record a saved edit. The only mutation the edit flow performs.
    pub fn replace_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }
}
