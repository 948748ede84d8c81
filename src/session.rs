//! Session lifecycle on top of [`ApiClient`]: login, identity lookup, and logout.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Identity, TokenSecret},
	client::ApiClient,
	http::{ApiRequest, HttpTransport, Method},
	obs,
};

/// Login endpoint, relative to the API root.
pub const LOGIN_PATH: &str = "/auth/login";
/// Identity endpoint, relative to the API root.
pub const ME_PATH: &str = "/auth/me";
/// Logout endpoint, relative to the API root.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Email/password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl LoginCredentials {
	/// Creates a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Successful login payload.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Newly issued refresh token.
	pub refresh_token: TokenSecret,
	/// Token type reported by the server, normally `bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Authenticated identity.
	pub user: Identity,
}

/// Session facade that keeps the credential store in step with the login lifecycle.
pub struct AuthSession<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
}
impl<T> AuthSession<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps a client; the session shares its credential store.
	pub fn new(client: ApiClient<T>) -> Self {
		Self { client }
	}

	/// Underlying client for authenticated calls within this session.
	pub fn client(&self) -> &ApiClient<T> {
		&self.client
	}

	/// Logs in and stores the issued pair and identity.
	///
	/// The login call never triggers a refresh; rejected credentials surface as [`Error::Http`].
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
		let request = ApiRequest::new(Method::Post, LOGIN_PATH).with_body(credentials)?;
		let response = self.client.execute_once(request).await?;
		let auth = response.json::<AuthResponse>()?;
		let store = &self.client.credentials;

		store.store_pair(CredentialPair {
			access_token: auth.access_token.clone(),
			refresh_token: auth.refresh_token.clone(),
		})?;
		store.set_identity(auth.user.clone())?;

		obs::session_opened(&auth.user);

		Ok(auth)
	}

	/// Fetches the authenticated identity and caches it.
	pub async fn current_user(&self) -> Result<Identity> {
		let identity = self.client.get_json::<Identity>(ME_PATH).await?;

		self.client.credentials.set_identity(identity.clone())?;

		Ok(identity)
	}

	/// Notifies the server and clears the session.
	///
	/// The server call is best effort: its failure is logged and the local session is cleared
	/// regardless. Only a failure to clear local storage is returned.
	pub async fn logout(&self) -> Result<()> {
		if let Err(e) = self.client.post(LOGOUT_PATH, None).await {
			obs::ignored_failure("logout", &e);
		}

		self.client.credentials.clear()?;

		Ok(())
	}

	/// Returns `true` while an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.client.credentials.is_authenticated()
	}

	/// Last-known identity, without a network call.
	pub fn cached_user(&self) -> Option<Identity> {
		self.client.credentials.identity()
	}
}
impl<T> Debug for AuthSession<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession").field("client", &self.client).finish()
	}
}
