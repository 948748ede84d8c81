//! File-backed [`SessionStore`] whose snapshot survives process restarts until the session is
//! cleared.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SessionSnapshot, SessionStore, StoreError},
};

/// Persists the session snapshot to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens a store at the provided path, creating parent directories when needed.
	///
	/// The file itself is created lazily on the first write.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_lock: Default::default() })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create session directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn read_snapshot(path: &Path) -> Result<Option<SessionSnapshot>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SessionStore for FileStore {
	fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
		Self::read_snapshot(&self.path)
	}

	fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();

		self.write_snapshot(snapshot)
	}

	fn clear(&self) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();

		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::auth::{Identity, TokenSecret};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"session_gateway_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_snapshot() -> SessionSnapshot {
		SessionSnapshot {
			access_token: Some(TokenSecret::new("access-token")),
			refresh_token: Some(TokenSecret::new("refresh-token")),
			current_user: Some(Identity {
				user_id: "u-7".into(),
				email: "pm@renewal.local".into(),
				full_name: "Project Manager".into(),
				role: "PROJECT_MANAGER".into(),
				is_active: true,
			}),
		}
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store.");
		let snapshot = build_snapshot();

		store.persist(&snapshot).expect("Failed to persist fixture snapshot.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");
		let loaded = reopened
			.load()
			.expect("Failed to load snapshot from file store.")
			.expect("File store lost snapshot after reopen.");

		assert_eq!(loaded, snapshot);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_removes_every_key_and_tolerates_missing_files() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store.");

		store.clear().expect("Clearing a never-written store should succeed.");
		store.persist(&build_snapshot()).expect("Failed to persist fixture snapshot.");
		store.clear().expect("Failed to clear file store.");

		assert!(!path.exists());
		assert_eq!(store.load().expect("Load after clear should succeed."), None);
	}

	#[test]
	fn corrupt_snapshot_surfaces_a_serialization_error() {
		let path = temp_path();

		fs::write(&path, b"{not json").expect("Failed to write corrupt fixture.");

		let store = FileStore::open(&path).expect("Failed to open file store.");
		let err = store.load().expect_err("Corrupt snapshots should not load.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session snapshot {}: {e}", path.display())
		});
	}
}
