//! Replayable request descriptors and buffered gateway responses.
//!
//! A [`RequestDescriptor`] carries everything needed to rebuild the wire request
//! from scratch, so a request suspended behind a credential refresh can be
//! re-dispatched with the replacement credential instead of sharing another
//! caller's response. The descriptor stamps one `x-request-id` at construction
//! time; the original dispatch and its replay share the id so they correlate in
//! logs.

// self
use crate::{
	_prelude::*,
	backend::BackendDescriptor,
	credential::AccessCredential,
	error::ConfigError,
	transport::{HttpRequest, HttpResponse},
};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Replayable description of one outbound call.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: Vec<(String, String)>,
	body: Option<RequestBody>,
	request_id: String,
}
#[derive(Clone, Debug)]
struct RequestBody {
	content_type: String,
	payload: Vec<u8>,
}
impl RequestDescriptor {
	/// Creates a descriptor for the provided method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: Vec::new(),
			body: None,
			request_id: format!("{:032x}", rand::random::<u128>()),
		}
	}

	/// Creates a GET descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Creates a POST descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Creates a PUT descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Creates a DELETE descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends a header; validation happens when the wire request is built.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches a raw body with the provided content type.
	pub fn body(mut self, content_type: impl Into<String>, payload: Vec<u8>) -> Self {
		self.body = Some(RequestBody { content_type: content_type.into(), payload });

		self
	}

	/// Attaches a JSON body serialized from the provided value.
	pub fn json<T>(self, value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let payload =
			serde_json::to_vec(value).map_err(|source| ConfigError::BodyEncode { source })?;

		Ok(self.body("application/json", payload))
	}

	/// Correlation id stamped on every dispatch of this descriptor.
	pub fn request_id(&self) -> &str {
		&self.request_id
	}

	/// HTTP method of the descriptor.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Request path relative to the backend base URL.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Builds a fresh wire request against the provided backend, attaching the
	/// credential per the backend's auth scheme when one is supplied.
	pub(crate) fn to_http_request(
		&self,
		backend: &BackendDescriptor,
		credential: Option<&AccessCredential>,
	) -> Result<HttpRequest, ConfigError> {
		let mut url = backend.endpoint(&self.path).map_err(|source| {
			ConfigError::InvalidRequestPath { path: self.path.clone(), source }
		})?;

		if !self.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &self.query {
				pairs.append_pair(key, value);
			}
		}

		let mut builder = http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.header(REQUEST_ID_HEADER, &self.request_id);

		if let Some(credential) = credential {
			let (name, value) = backend.auth_scheme.header(credential.expose());

			builder = builder.header(name, value);
		}
		for (name, value) in &self.headers {
			builder = builder.header(name, value);
		}

		let payload = match &self.body {
			Some(body) => {
				builder = builder.header(http::header::CONTENT_TYPE, &body.content_type);

				body.payload.clone()
			},
			None => Vec::new(),
		};

		Ok(builder.body(payload)?)
	}
}

/// Error raised when a response body cannot be decoded as JSON.
#[derive(Debug, ThisError)]
#[error("Response body could not be decoded as JSON (status {status}).")]
pub struct ResponseDecodeError {
	/// HTTP status of the response that failed to decode.
	pub status: u16,
	/// Structured parsing failure.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Buffered response returned by [`Gateway::send`](crate::gateway::Gateway::send).
#[derive(Clone, Debug)]
pub struct GatewayResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl GatewayResponse {
	/// HTTP status code of the response.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response and returns the body bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Lossy UTF-8 view of the body.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T, ResponseDecodeError>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ResponseDecodeError { status: self.status.as_u16(), source })
	}

	pub(crate) fn from_http(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}
