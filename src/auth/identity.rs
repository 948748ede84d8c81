//! Last-known authenticated identity, cached next to the credentials for UI convenience.

// self
use crate::_prelude::*;

/// User identity returned by the login and `/auth/me` endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable user identifier.
	pub user_id: String,
	/// Login email address.
	pub email: String,
	/// Display name.
	pub full_name: String,
	/// Role label used for authorization decisions upstream.
	pub role: String,
	/// Login responses omit this flag, so it defaults to active.
	#[serde(default = "active_by_default")]
	pub is_active: bool,
}

fn active_by_default() -> bool {
	true
}
