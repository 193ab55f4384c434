use melodia_ports::storage::{ProfileStorePort, StorageError, UserProgress};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of `users.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct UsersFile {
    users: Vec<UserProgress>,
    last_user: Option<String>,
}

impl UsersFile {
    fn find(&self, username: &str) -> Option<&UserProgress> {
        self.users.iter().find(|user| user.username == username)
    }
}

/// Profiles kept as one JSON document under a base directory.
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(base.join("Melodia"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn users_path(&self) -> PathBuf {
        self.base_dir.join("users.json")
    }

    fn load(&self) -> Result<UsersFile, StorageError> {
        let path = self.users_path();
        if !path.exists() {
            return Ok(UsersFile::default());
        }
        Self::read_json(&path)
    }

    fn store(&self, file: &UsersFile) -> Result<(), StorageError> {
        Self::write_json(&self.users_path(), file)
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    /// Writes through a sibling temp file so a failed write leaves the old file intact.
    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { base_dir }
    }
}

impl ProfileStorePort for FsStorage {
    fn list_usernames(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .load()?
            .users
            .into_iter()
            .map(|user| user.username)
            .collect())
    }

    fn load_profile(&self, username: &str) -> Result<Option<UserProgress>, StorageError> {
        Ok(self.load()?.find(username).cloned())
    }

    fn save_profile(&self, profile: &UserProgress) -> Result<(), StorageError> {
        let mut file = self.load()?;
        match file
            .users
            .iter_mut()
            .find(|user| user.username == profile.username)
        {
            Some(existing) => *existing = profile.clone(),
            None => file.users.push(profile.clone()),
        }
        self.store(&file)?;
        log::debug!("saved profile {}", profile.username);
        Ok(())
    }

    fn last_user(&self) -> Result<Option<String>, StorageError> {
        let file = self.load()?;
        // a stale pointer to a deleted user reads as nobody
        Ok(file
            .last_user
            .filter(|name| file.users.iter().any(|user| &user.username == name)))
    }

    fn set_last_user(&self, username: Option<&str>) -> Result<(), StorageError> {
        let mut file = self.load()?;
        file.last_user = username.map(str::to_string);
        self.store(&file)
    }
}
