//! The Flag Store contract and an in-memory implementation.
//!
//! The engine never persists flags itself; it consumes a [`FlagStore`]. The
//! bundled [`InMemoryFlagStore`] backs tests and embedders that don't need
//! durable storage. Reads hand out snapshots: a flag returned from the store
//! is an immutable value unaffected by later saves.

use std::sync::RwLock;

use chrono::Utc;

use crate::flags::{FeatureFlag, MAX_FLAG_NAME_LENGTH};
use crate::Result;

/// Outcome of a save attempt. Business-rule rejections (duplicate name, stale
/// concurrency token) are reported here, not as errors; [`crate::Error`] is
/// reserved for backend failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    pub fn ok() -> SaveOutcome {
        SaveOutcome {
            success: true,
            message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> SaveOutcome {
        SaveOutcome {
            success: false,
            message: message.into(),
        }
    }
}

/// Storage contract consumed by the engine.
///
/// Filters live and die with their owning flag: `save_flag` persists the flag
/// and its full filter list as one atomic unit.
pub trait FlagStore: Send + Sync {
    /// All stored flags, in backend iteration order.
    fn get_all_flags(&self) -> Result<Vec<FeatureFlag>>;

    /// Look up one flag by name. `None` means not found, which is a valid
    /// outcome rather than an error.
    fn get_flag_by_name(&self, name: &str) -> Result<Option<FeatureFlag>>;

    /// Persist a flag with its filters. Returns a [`SaveOutcome`] describing
    /// acceptance or a business-rule rejection.
    fn save_flag(&self, flag: FeatureFlag) -> Result<SaveOutcome>;

    /// Delete a flag by id. Returns `false` if no such flag existed.
    fn delete_flag(&self, id: i64) -> Result<bool>;
}

/// Thread-safe in-memory flag store.
///
/// Enforces the flag invariants a durable backend would: name length and
/// uniqueness, and an `updated_date` optimistic-concurrency token that rejects
/// stale writes.
#[derive(Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<Vec<FeatureFlag>>,
    next_id: RwLock<i64>,
}

impl InMemoryFlagStore {
    pub fn new() -> InMemoryFlagStore {
        InMemoryFlagStore::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn get_all_flags(&self) -> Result<Vec<FeatureFlag>> {
        // .read() only fails if a writer panicked while holding the lock,
        // which should never happen.
        let flags = self
            .flags
            .read()
            .expect("thread holding flag store lock should not panic");
        Ok(flags.clone())
    }

    fn get_flag_by_name(&self, name: &str) -> Result<Option<FeatureFlag>> {
        let flags = self
            .flags
            .read()
            .expect("thread holding flag store lock should not panic");
        Ok(flags.iter().find(|flag| flag.name == name).cloned())
    }

    fn save_flag(&self, mut flag: FeatureFlag) -> Result<SaveOutcome> {
        if flag.name.trim().is_empty() {
            return Ok(SaveOutcome::rejected("flag name is required"));
        }
        if flag.name.chars().count() > MAX_FLAG_NAME_LENGTH {
            return Ok(SaveOutcome::rejected(format!(
                "flag name must be at most {MAX_FLAG_NAME_LENGTH} characters"
            )));
        }

        let mut flags = self
            .flags
            .write()
            .expect("thread holding flag store lock should not panic");

        if flags
            .iter()
            .any(|existing| existing.name == flag.name && existing.id != flag.id)
        {
            return Ok(SaveOutcome::rejected(format!(
                "a flag named {:?} already exists",
                flag.name
            )));
        }

        if flag.id == 0 {
            let mut next_id = self
                .next_id
                .write()
                .expect("thread holding flag store lock should not panic");
            *next_id += 1;
            flag.id = *next_id;
            flag.updated_date = Some(Utc::now());
            flags.push(flag);
            return Ok(SaveOutcome::ok());
        }

        let Some(existing) = flags.iter_mut().find(|existing| existing.id == flag.id) else {
            return Ok(SaveOutcome::rejected("flag no longer exists"));
        };
        if existing.updated_date != flag.updated_date {
            return Ok(SaveOutcome::rejected(
                "flag was modified by someone else, reload and retry",
            ));
        }

        flag.updated_date = Some(Utc::now());
        *existing = flag;
        Ok(SaveOutcome::ok())
    }

    fn delete_flag(&self, id: i64) -> Result<bool> {
        let mut flags = self
            .flags
            .write()
            .expect("thread holding flag store lock should not panic");
        let before = flags.len();
        flags.retain(|flag| flag.id != id);
        Ok(flags.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flags::RequirementType;

    fn new_flag(name: &str) -> FeatureFlag {
        FeatureFlag {
            id: 0,
            name: name.to_owned(),
            status: true,
            requirement_type: RequirementType::Any,
            updated_date: None,
            filters: Vec::new(),
        }
    }

    #[test]
    fn save_assigns_id_and_token() {
        let store = InMemoryFlagStore::new();
        assert!(store.save_flag(new_flag("beta")).unwrap().success);

        let stored = store.get_flag_by_name("beta").unwrap().unwrap();
        assert!(stored.id > 0);
        assert!(stored.updated_date.is_some());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let store = InMemoryFlagStore::new();
        assert!(store.save_flag(new_flag("beta")).unwrap().success);

        let outcome = store.save_flag(new_flag("beta")).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("already exists"));
    }

    #[test]
    fn name_length_is_bounded() {
        let store = InMemoryFlagStore::new();
        let outcome = store.save_flag(new_flag(&"x".repeat(101))).unwrap();
        assert!(!outcome.success);

        assert!(store.save_flag(new_flag(&"x".repeat(100))).unwrap().success);
    }

    #[test]
    fn stale_token_is_rejected() {
        let store = InMemoryFlagStore::new();
        store.save_flag(new_flag("beta")).unwrap();

        let first_read = store.get_flag_by_name("beta").unwrap().unwrap();
        let second_read = first_read.clone();

        // First editor saves; second editor still holds the old token.
        assert!(store.save_flag(first_read).unwrap().success);
        let outcome = store.save_flag(second_read).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("modified"));
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryFlagStore::new();
        store.save_flag(new_flag("beta")).unwrap();
        let id = store.get_flag_by_name("beta").unwrap().unwrap().id;

        assert!(store.delete_flag(id).unwrap());
        assert!(!store.delete_flag(id).unwrap());
        assert!(store.get_flag_by_name("beta").unwrap().is_none());
    }

    #[test]
    fn reads_are_snapshots() {
        let store = InMemoryFlagStore::new();
        store.save_flag(new_flag("beta")).unwrap();

        let snapshot = store.get_flag_by_name("beta").unwrap().unwrap();
        let mut edited = snapshot.clone();
        edited.status = false;
        store.save_flag(edited).unwrap();

        // The earlier snapshot is unaffected by the save.
        assert!(snapshot.status);
    }

    #[test]
    fn store_is_usable_across_threads() {
        let store = Arc::new(InMemoryFlagStore::new());

        {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.save_flag(new_flag("from-thread")).unwrap();
            })
            .join()
            .unwrap();
        }

        assert!(store.get_flag_by_name("from-thread").unwrap().is_some());
    }
}
