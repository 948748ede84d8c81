//! Outbound request decoration: bearer token and correlation id.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	http::{AUTHORIZATION, Headers},
};

/// Correlation header attached to every outbound request.
pub const REQUEST_ID: &str = "x-request-id";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Sets `Authorization: Bearer <token>` when a token is present and a fresh `X-Request-ID`.
///
/// Without a token any caller-supplied `Authorization` header is left untouched.
pub fn attach(headers: &mut Headers, token: Option<&TokenSecret>) {
	if let Some(token) = token {
		headers.insert(AUTHORIZATION, token.bearer());
	}

	headers.insert(REQUEST_ID, correlation_id());
}

/// Generates `<unix-millis>-<9 base36 chars>`.
pub fn correlation_id() -> String {
	let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
	let mut rng = rand::rng();
	let suffix: String =
		(0..SUFFIX_LEN).map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())])).collect();

	format!("{millis}-{suffix}")
}
