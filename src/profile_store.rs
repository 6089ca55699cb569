// Profile store: JSON document of saved launch configurations

use crate::error::{Error, Result};
use crate::models::Profile;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Whole-document store: read once on load, rewritten pretty-printed after every mutation.
pub struct ProfileStore {
    path: PathBuf,
    profiles: Mutex<Vec<Profile>>,
}

impl ProfileStore {
    /// Load `path`. A missing or malformed document starts an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profiles = match tokio::fs::read_to_string(&path).await {
            Ok(s) => match serde_json::from_str::<Vec<Profile>>(&s) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "profile document malformed; starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no profile document yet");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "profile document unreadable; starting empty");
                Vec::new()
            }
        };
        tracing::info!(path = %path.display(), profiles = profiles.len(), "Profiles loaded");
        Self {
            path,
            profiles: Mutex::new(profiles),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Vec<Profile> {
        self.profiles.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Profile> {
        self.profiles.lock().await.iter().find(|p| p.id == id).cloned()
    }

    /// Add `profile`; an existing id is rejected and nothing is written.
    pub async fn create(&self, profile: Profile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(Error::DuplicateProfile(profile.id));
        }
        profiles.push(profile);
        if let Err(e) = self.save(&profiles).await {
            profiles.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Replace the profile with the same id.
    pub async fn update(&self, profile: Profile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        let idx = profiles
            .iter()
            .position(|p| p.id == profile.id)
            .ok_or_else(|| Error::profile_not_found(&profile.id))?;
        let previous = std::mem::replace(&mut profiles[idx], profile);
        if let Err(e) = self.save(&profiles).await {
            profiles[idx] = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        let idx = profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::profile_not_found(id))?;
        let removed = profiles.remove(idx);
        if let Err(e) = self.save(&profiles).await {
            profiles.insert(idx, removed);
            return Err(e);
        }
        Ok(())
    }

    async fn save(&self, profiles: &[Profile]) -> Result<()> {
        let json = serde_json::to_string_pretty(profiles)
            .map_err(|e| Error::PersistenceFailure(format!("serialize profiles: {}", e)))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::PersistenceFailure(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| Error::PersistenceFailure(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(
            operation = "save_profiles",
            profiles = profiles.len(),
            "Profiles saved"
        );
        Ok(())
    }
}
