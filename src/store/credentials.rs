//! Credential store: the in-process view of the session that the request path reads on every
//! call and the refresh coordinator rewrites.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Identity, TokenSecret},
	obs,
	store::{MemoryStore, SessionSnapshot, SessionStore, StoreError},
};

/// Write-through cache over a [`SessionStore`].
///
/// Reads never touch the backend. Mutations apply to the cache first and are then persisted from a
/// copy, so a failing backend reports an error without leaving the in-process view stale and a slow
/// backend never blocks readers. Writers are serialized so the backend sees mutations in cache
/// order.
pub struct CredentialStore {
	backend: Arc<dyn SessionStore>,
	cache: RwLock<SessionSnapshot>,
	writer: Mutex<()>,
}
impl CredentialStore {
	/// Opens a credential store, restoring whatever session the backend already holds.
	pub fn open(backend: Arc<dyn SessionStore>) -> Result<Self, StoreError> {
		let snapshot = backend.load()?.unwrap_or_default();

		Ok(Self { backend, cache: RwLock::new(snapshot), writer: Mutex::new(()) })
	}

	/// Creates an empty store backed by a fresh [`MemoryStore`].
	pub fn in_memory() -> Self {
		Self {
			backend: Arc::new(MemoryStore::default()),
			cache: Default::default(),
			writer: Mutex::new(()),
		}
	}

	/// Stores a new access/refresh pair.
	pub fn set_tokens(
		&self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
	) -> Result<(), StoreError> {
		self.store_pair(CredentialPair::new(access_token, refresh_token))
	}

	/// Replaces the current pair, keeping the cached identity.
	pub fn store_pair(&self, pair: CredentialPair) -> Result<(), StoreError> {
		self.mutate(|snapshot| {
			snapshot.access_token = Some(pair.access_token);
			snapshot.refresh_token = Some(pair.refresh_token);
		})
	}

	/// Stores the last-known authenticated identity.
	pub fn set_identity(&self, identity: Identity) -> Result<(), StoreError> {
		self.mutate(|snapshot| snapshot.current_user = Some(identity))
	}

	/// Current access token, if authenticated.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.cache.read().access_token.clone()
	}

	/// Current refresh token, if authenticated.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.cache.read().refresh_token.clone()
	}

	/// Current access/refresh pair, if both are present.
	pub fn credentials(&self) -> Option<CredentialPair> {
		self.cache.read().credentials()
	}

	/// Last-known identity, if any.
	pub fn identity(&self) -> Option<Identity> {
		self.cache.read().current_user.clone()
	}

	/// Returns `true` while an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.cache.read().access_token.is_some()
	}

	/// Drops both tokens and the identity together.
	pub fn clear(&self) -> Result<(), StoreError> {
		let _writer = self.writer.lock();

		*self.cache.write() = SessionSnapshot::default();

		self.backend.clear()
	}

	/// Clears the session, logging instead of returning a backend failure.
	pub(crate) fn clear_logged(&self) {
		if let Err(e) = self.clear() {
			obs::persist_failed("clear", &e);
		}
	}

	fn mutate<F>(&self, apply: F) -> Result<(), StoreError>
	where
		F: FnOnce(&mut SessionSnapshot),
	{
		let _writer = self.writer.lock();
		let snapshot = {
			let mut cache = self.cache.write();

			apply(&mut cache);

			cache.clone()
		};

		self.backend.persist(&snapshot)
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let cache = self.cache.read();

		f.debug_struct("CredentialStore")
			.field("access_token_set", &cache.access_token.is_some())
			.field("refresh_token_set", &cache.refresh_token.is_some())
			.field("identity", &cache.current_user.as_ref().map(|user| &user.user_id))
			.finish()
	}
}
