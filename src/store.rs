// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential registry.
//!
//! Maps principal identifiers to their credential records, with a secondary
//! index from API key to principal. Both maps live behind one lock so a
//! reader never sees a record without its key index entry or the reverse.
//! Nothing is persisted; the registry lives as long as its owner.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Store mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("principal '{0}' already exists")]
    AlreadyExists(String),

    #[error("principal '{0}' not found")]
    NotFound(String),

    #[error("API key is already assigned to another principal")]
    KeyCollision,

    #[error("principal '{0}' already holds a different API key")]
    KeyAlreadyAssigned(String),
}

/// Secret material bound to a principal.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub principal_id: String,
    /// Self-describing salted hash; never the plaintext.
    pub password_hash: String,
    /// Immutable once set.
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("principal_id", &self.principal_id)
            .field("password_hash", &"[REDACTED]")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Default)]
struct Registry {
    records: HashMap<String, CredentialRecord>,
    api_keys: HashMap<String, String>,
}

impl Registry {
    fn insert(&mut self, record: CredentialRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.principal_id) {
            return Err(StoreError::AlreadyExists(record.principal_id));
        }
        if let Some(key) = &record.api_key {
            if self.api_keys.contains_key(key) {
                return Err(StoreError::KeyCollision);
            }
            self.api_keys
                .insert(key.clone(), record.principal_id.clone());
        }
        self.records.insert(record.principal_id.clone(), record);
        Ok(())
    }
}

/// Process-lifetime credential store.
///
/// Mutations serialize on the write lock, so of two concurrent
/// registrations for the same identifier exactly one wins.
#[derive(Default)]
pub struct CredentialStore {
    inner: RwLock<Registry>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new principal without an API key.
    pub fn register(
        &self,
        principal_id: &str,
        password_hash: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.write().insert(CredentialRecord {
            principal_id: principal_id.to_string(),
            password_hash: password_hash.into(),
            api_key: None,
            created_at: Utc::now(),
        })
    }

    /// Insert a new principal together with its API key.
    ///
    /// Fails with `AlreadyExists` or `KeyCollision`; nothing is written on
    /// failure.
    pub fn register_with_api_key(
        &self,
        principal_id: &str,
        password_hash: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.write().insert(CredentialRecord {
            principal_id: principal_id.to_string(),
            password_hash: password_hash.into(),
            api_key: Some(api_key.into()),
            created_at: Utc::now(),
        })
    }

    pub fn get(&self, principal_id: &str) -> Option<CredentialRecord> {
        self.read().records.get(principal_id).cloned()
    }

    /// Attach an API key to an existing principal.
    ///
    /// Assigning the key a principal already holds is a no-op.
    pub fn set_api_key(&self, principal_id: &str, api_key: &str) -> Result<(), StoreError> {
        let mut registry = self.write();

        match registry.api_keys.get(api_key) {
            Some(owner) if owner == principal_id => return Ok(()),
            Some(_) => return Err(StoreError::KeyCollision),
            None => {}
        }

        let record = registry
            .records
            .get_mut(principal_id)
            .ok_or_else(|| StoreError::NotFound(principal_id.to_string()))?;
        if record.api_key.is_some() {
            return Err(StoreError::KeyAlreadyAssigned(principal_id.to_string()));
        }
        record.api_key = Some(api_key.to_string());

        registry
            .api_keys
            .insert(api_key.to_string(), principal_id.to_string());
        Ok(())
    }

    pub fn find_by_api_key(&self, api_key: &str) -> Option<String> {
        self.read().api_keys.get(api_key).cloned()
    }

    /// Registered identifiers in sorted order.
    pub fn principal_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().records.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }
}
