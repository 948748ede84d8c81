//! Session storage contracts, built-in backends, and the credential store built on top of them.

pub mod credentials;
pub mod file;
pub mod memory;

pub use credentials::CredentialStore;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Identity, TokenSecret},
};

/// Session-scoped persistence backend.
///
/// A backend holds exactly one [`SessionSnapshot`]. Writes replace the whole snapshot so the
/// persisted keys can never drift apart, and [`clear`](SessionStore::clear) removes all of them at
/// once.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Loads the persisted snapshot, if any.
	fn load(&self) -> Result<Option<SessionSnapshot>, StoreError>;

	/// Replaces the persisted snapshot.
	fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

	/// Removes every persisted key.
	fn clear(&self) -> Result<(), StoreError>;
}

/// Everything a session persists: both tokens and the last-known identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Current access token.
	pub access_token: Option<TokenSecret>,
	/// Current refresh token.
	pub refresh_token: Option<TokenSecret>,
	/// Last-known authenticated identity.
	pub current_user: Option<Identity>,
}
impl SessionSnapshot {
	/// Returns the credential pair when both halves are present.
	pub fn credentials(&self) -> Option<CredentialPair> {
		Some(CredentialPair {
			access_token: self.access_token.clone()?,
			refresh_token: self.refresh_token.clone()?,
		})
	}

	/// Returns `true` when no key is set.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none() && self.current_user.is_none()
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "session file locked".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("session file locked"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn snapshot_requires_both_tokens_for_a_pair() {
		let partial = SessionSnapshot {
			access_token: Some(TokenSecret::new("access-1")),
			..SessionSnapshot::default()
		};

		assert!(partial.credentials().is_none());
		assert!(!partial.is_empty());
		assert!(SessionSnapshot::default().is_empty());
	}

	#[test]
	fn snapshot_uses_the_session_key_names() {
		let snapshot = SessionSnapshot {
			access_token: Some(TokenSecret::new("a")),
			refresh_token: Some(TokenSecret::new("r")),
			current_user: None,
		};
		let payload = serde_json::to_value(&snapshot).expect("Snapshot should serialize.");

		assert_eq!(
			payload,
			serde_json::json!({ "access_token": "a", "refresh_token": "r", "current_user": null })
		);
	}
}
