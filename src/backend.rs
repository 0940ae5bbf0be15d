//! Backend descriptor data structures and helpers consumed by the gateway.
//!
//! The module exposes validated metadata and builder utilities so one backend can
//! describe its base URL, refresh endpoint, and credential attachment scheme in a
//! transport-agnostic way.

// std
use std::borrow::Borrow;
// crates.io
use http::header::HeaderName;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when backend identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Backend identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Backend identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Backend identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Unique identifier for a backend descriptor.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackendId(String);
impl BackendId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl AsRef<str> for BackendId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<BackendId> for String {
	fn from(value: BackendId) -> Self {
		value.0
	}
}
impl TryFrom<String> for BackendId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for BackendId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for BackendId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Backend({})", self.0)
	}
}
impl Display for BackendId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for BackendId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

/// Credential attachment scheme applied to every outbound request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
	#[default]
	/// `Authorization: Bearer <credential>`.
	Bearer,
	/// A custom header carrying the bare credential value.
	CustomHeader {
		/// Header name the credential is written to.
		name: String,
	},
}
impl AuthScheme {
	/// Returns the header name/value pair carrying the provided credential.
	pub(crate) fn header(&self, credential: &str) -> (String, String) {
		match self {
			Self::Bearer => ("authorization".into(), format!("Bearer {credential}")),
			Self::CustomHeader { name } => (name.clone(), credential.to_owned()),
		}
	}
}

/// Errors raised while constructing or validating backend descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// Base URL is mandatory.
	#[error("Missing base URL.")]
	MissingBaseUrl,
	/// A refresh path or absolute refresh endpoint is mandatory.
	#[error("Missing refresh endpoint.")]
	MissingRefreshEndpoint,
	/// Endpoints must use HTTP or HTTPS.
	#[error("The {endpoint} endpoint must use HTTP(S): {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Base URL cannot serve as a join root for request paths.
	#[error("Base URL cannot be used as a join root: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh path cannot be resolved against the base URL.
	#[error("Refresh path `{path}` cannot be resolved against the base URL.")]
	InvalidRefreshPath {
		/// Refresh path supplied to the builder.
		path: String,
	},
	/// Custom authorization header name is not a valid HTTP header name.
	#[error("Custom authorization header name is invalid: {name}.")]
	InvalidAuthHeader {
		/// Header name that failed validation.
		name: String,
	},
}

/// Immutable backend descriptor consumed by the gateway.
///
/// The base URL always ends with a trailing slash so request paths join below it
/// instead of replacing its final segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
	/// Descriptor identifier.
	pub id: BackendId,
	/// Join root for request paths.
	pub base_url: Url,
	/// Resolved refresh endpoint.
	pub refresh_endpoint: Url,
	/// Credential attachment scheme.
	pub auth_scheme: AuthScheme,
}
impl BackendDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: BackendId) -> BackendDescriptorBuilder {
		BackendDescriptorBuilder::new(id)
	}

	/// Resolves a request path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
		self.base_url.join(path.trim_start_matches('/'))
	}
}

/// Builder for [`BackendDescriptor`] values.
#[derive(Debug)]
pub struct BackendDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: BackendId,
	/// Join root for request paths (required).
	pub base_url: Option<Url>,
	/// Refresh path resolved against the base URL.
	pub refresh_path: Option<String>,
	/// Absolute refresh endpoint overriding [`Self::refresh_path`].
	pub refresh_endpoint: Option<Url>,
	/// Credential attachment scheme.
	pub auth_scheme: AuthScheme,
}
impl BackendDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: BackendId) -> Self {
		Self {
			id,
			base_url: None,
			refresh_path: None,
			refresh_endpoint: None,
			auth_scheme: AuthScheme::default(),
		}
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the refresh path, resolved against the base URL at build time.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = Some(path.into());

		self
	}

	/// Sets an absolute refresh endpoint, taking precedence over the refresh path.
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Overrides the credential attachment scheme.
	pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.auth_scheme = scheme;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<BackendDescriptor, DescriptorError> {
		let mut base_url = self.base_url.ok_or(DescriptorError::MissingBaseUrl)?;

		if base_url.cannot_be_a_base() {
			return Err(DescriptorError::CannotBeABase { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let normalized = format!("{}/", base_url.path());

			base_url.set_path(&normalized);
		}

		let refresh_endpoint = match (self.refresh_endpoint, self.refresh_path) {
			(Some(url), _) => url,
			(None, Some(path)) => base_url
				.join(path.trim_start_matches('/'))
				.map_err(|_| DescriptorError::InvalidRefreshPath { path })?,
			(None, None) => return Err(DescriptorError::MissingRefreshEndpoint),
		};
		let descriptor = BackendDescriptor {
			id: self.id,
			base_url,
			refresh_endpoint,
			auth_scheme: self.auth_scheme,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl BackendDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), DescriptorError> {
		validate_endpoint("base", &self.base_url)?;
		validate_endpoint("refresh", &self.refresh_endpoint)?;

		if let AuthScheme::CustomHeader { name } = &self.auth_scheme
			&& HeaderName::from_bytes(name.as_bytes()).is_err()
		{
			return Err(DescriptorError::InvalidAuthHeader { name: name.clone() });
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), DescriptorError> {
	if matches!(url.scheme(), "http" | "https") {
		Ok(())
	} else {
		Err(DescriptorError::UnsupportedScheme { endpoint: name, url: url.to_string() })
	}
}
