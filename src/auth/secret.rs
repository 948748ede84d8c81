//! Bearer token material that never prints itself.

// self
use crate::_prelude::*;

/// Access or refresh token string.
///
/// `Debug` and `Display` only reveal the length; use [`expose`](Self::expose) or
/// [`bearer`](Self::bearer) at the point where the raw value goes on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token string.
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	/// Raw token value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `Authorization` header value carrying this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Returns `true` for an empty token, which the server would never issue.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(token: String) -> Self {
		Self(token)
	}
}
impl From<&str> for TokenSecret {
	fn from(token: &str) -> Self {
		Self::new(token)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({} chars)", self.0.chars().count())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("****")
	}
}
