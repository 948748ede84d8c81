//! Access/refresh token pairs and the refresh endpoint's wire shapes.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Current access/refresh pair held by the credential store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived credential attached to every authorized request.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new pair.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}

/// Body sent to `POST /auth/refresh`.
#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest<'a> {
	/// Refresh secret being exchanged.
	pub refresh_token: &'a str,
}

/// Successful `POST /auth/refresh` body; unknown fields are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token.
	pub refresh_token: TokenSecret,
}
impl From<RefreshResponse> for CredentialPair {
	fn from(value: RefreshResponse) -> Self {
		Self { access_token: value.access_token, refresh_token: value.refresh_token }
	}
}
