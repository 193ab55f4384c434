use melodia_ports::storage::{ProfileStorePort, StorageError, UserProgress};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Inner {
    profiles: BTreeMap<String, UserProgress>,
    last_user: Option<String>,
}

/// Profile store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    inner: Mutex<Inner>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProgress>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for profile in profiles {
                inner.profiles.insert(profile.username.clone(), profile);
            }
        }
        store
    }
}

impl ProfileStorePort for MemoryProfileStore {
    fn list_usernames(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.lock().profiles.keys().cloned().collect())
    }

    fn load_profile(&self, username: &str) -> Result<Option<UserProgress>, StorageError> {
        Ok(self.inner.lock().profiles.get(username).cloned())
    }

    fn save_profile(&self, profile: &UserProgress) -> Result<(), StorageError> {
        self.inner
            .lock()
            .profiles
            .insert(profile.username.clone(), profile.clone());
        Ok(())
    }

    fn last_user(&self) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().last_user.clone())
    }

    fn set_last_user(&self, username: Option<&str>) -> Result<(), StorageError> {
        self.inner.lock().last_user = username.map(str::to_string);
        Ok(())
    }
}
