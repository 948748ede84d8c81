//! Thread-safe in-memory [`SessionStore`] for tests, demos, and process-scoped sessions.

// self
use crate::{
	_prelude::*,
	store::{SessionSnapshot, SessionStore, StoreError},
};

/// Keeps the session snapshot in-process; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<SessionSnapshot>>>);
impl MemoryStore {
	/// Creates a store pre-seeded with a snapshot, mimicking a reload of an existing session.
	pub fn seeded(snapshot: SessionSnapshot) -> Self {
		Self(Arc::new(RwLock::new(Some(snapshot))))
	}

	/// Returns the raw persisted snapshot without going through a credential store.
	pub fn snapshot(&self) -> Option<SessionSnapshot> {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
		Ok(self.snapshot())
	}

	fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		*self.0.write() = Some(snapshot.to_owned());

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.0.write().take();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::TokenSecret;

	#[test]
	fn clones_share_the_persisted_snapshot() {
		let store = MemoryStore::default();
		let view = store.clone();
		let snapshot = SessionSnapshot {
			access_token: Some(TokenSecret::new("access-1")),
			refresh_token: Some(TokenSecret::new("refresh-1")),
			current_user: None,
		};

		store.persist(&snapshot).expect("Memory store persist should succeed.");

		assert_eq!(view.load().expect("Memory store load should succeed."), Some(snapshot));

		view.clear().expect("Memory store clear should succeed.");

		assert!(store.snapshot().is_none());
	}
}
