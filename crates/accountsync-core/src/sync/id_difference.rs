//! Storage id comparison between the remote manifest and local state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::StorageId;

/// Ids present on only one side, by raw key.
///
/// An id whose raw key appears on both sides with different type tags lands in
/// both lists and sets `has_type_mismatches`. Such a manifest is inconsistent
/// and the caller usually has to rebuild it from local state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdDifference {
    /// Remote ids the local side doesn't have, in remote order
    pub remote_only: Vec<StorageId>,
    /// Local ids the remote side doesn't have, in local order
    pub local_only: Vec<StorageId>,
    pub has_type_mismatches: bool,
}

impl IdDifference {
    pub fn is_empty(&self) -> bool {
        self.remote_only.is_empty() && self.local_only.is_empty()
    }
}

pub fn find_id_difference(remote: &[StorageId], local: &[StorageId]) -> IdDifference {
    let remote_by_raw: HashMap<&[u8], &StorageId> =
        remote.iter().map(|id| (id.raw(), id)).collect();
    let local_by_raw: HashMap<&[u8], &StorageId> = local.iter().map(|id| (id.raw(), id)).collect();

    let mut has_type_mismatches = false;

    let remote_only = remote
        .iter()
        .filter(|id| match local_by_raw.get(id.raw()) {
            None => true,
            Some(other) if other.id_type_raw() != id.id_type_raw() => {
                has_type_mismatches = true;
                true
            }
            Some(_) => false,
        })
        .cloned()
        .collect();

    let local_only = local
        .iter()
        .filter(|id| match remote_by_raw.get(id.raw()) {
            None => true,
            Some(other) => other.id_type_raw() != id.id_type_raw(),
        })
        .cloned()
        .collect();

    IdDifference {
        remote_only,
        local_only,
        has_type_mismatches,
    }
}
