//! Crate-level error types shared across flows, the CRM client, stores, and the HTTP surface.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The CRM API rejected or failed a call for a reason other than a missing record.
	#[error(transparent)]
	Downstream(#[from] DownstreamError),
	/// The HTTP listener failed.
	#[error("HTTP server I/O failed.")]
	Io(#[from] std::io::Error),

	/// Client-supplied input was absent or blank.
	#[error("Missing required parameter `{name}`.")]
	MissingParameter {
		/// Name of the parameter as the caller spells it.
		name: &'static str,
	},
	/// Client-supplied input is present but malformed.
	#[error("Invalid parameter `{name}`: {reason}")]
	InvalidParameter {
		/// Name of the parameter as the caller spells it.
		name: &'static str,
		/// Validation message.
		reason: String,
	},
	/// No record exists for the given identifier.
	#[error("{kind} `{id}` was not found.")]
	NotFound {
		/// What kind of record was looked up.
		kind: NotFoundKind,
		/// Identifier the lookup used.
		id: String,
	},
	/// The identity provider rejected the authorization-code grant.
	#[error("Token exchange failed: {0}.")]
	ExchangeFailed(ProviderFailure),
	/// The identity provider rejected the refresh-token grant.
	#[error("Token refresh failed: {0}.")]
	RefreshFailed(ProviderFailure),
	/// The usage counter is at or above its cap.
	#[error("Submission limit reached ({used}/{limit}).")]
	LimitReached {
		/// Counter value read from the contact.
		used: u64,
		/// Cap that applies to the contact.
		limit: u64,
	},
}
impl Error {
	/// Shorthand for a missing token record.
	pub fn token_not_found(id: impl Display) -> Self {
		Self::NotFound { kind: NotFoundKind::Token, id: id.to_string() }
	}

	/// Shorthand for a missing CRM contact.
	pub fn contact_not_found(id: impl Display) -> Self {
		Self::NotFound { kind: NotFoundKind::Contact, id: id.to_string() }
	}
}

/// Record kinds reported by [`Error::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFoundKind {
	/// No token record is stored for the account.
	Token,
	/// The CRM has no contact for the lookup key.
	Contact,
}
impl Display for NotFoundKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Token => f.write_str("Token for account"),
			Self::Contact => f.write_str("Contact"),
		}
	}
}

/// Details of a failed token-endpoint call, echoed back to callers verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderFailure {
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Provider error payload, or a local description when no payload exists.
	pub payload: String,
}
impl ProviderFailure {
	/// Failure carrying an upstream response.
	pub fn upstream(status: Option<u16>, payload: impl Into<String>) -> Self {
		Self { status, payload: payload.into() }
	}

	/// Failure raised before or without any upstream response.
	pub fn local(payload: impl Into<String>) -> Self {
		Self { status: None, payload: payload.into() }
	}
}
impl Display for ProviderFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.status {
			Some(status) => write!(f, "HTTP {status}: {}", self.payload),
			None => f.write_str(&self.payload),
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Descriptor does not enable the requested grant.
	#[error("Descriptor `{descriptor}` does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Provider identifier string.
		descriptor: String,
		/// Disabled grant label.
		grant: &'static str,
	},
	/// A required environment variable is unset or blank.
	#[error("Environment variable `{name}` is required.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Parser message.
		reason: String,
	},
	/// Usage tracking was requested without a counter field.
	#[error("Usage tracking requires `USAGE_FIELD_ID` to be configured.")]
	UsageFieldNotConfigured,
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a parser failure for the named variable.
	pub fn invalid_var(name: &'static str, reason: impl Display) -> Self {
		Self::InvalidVar { name, reason: reason.to_string() }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by the CRM REST client.
#[derive(Debug, ThisError)]
pub enum DownstreamError {
	/// The CRM answered with a non-success status.
	#[error("CRM endpoint `{endpoint}` returned HTTP {status}: {body}")]
	Status {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// The CRM response body could not be decoded.
	#[error("CRM endpoint `{endpoint}` returned an unexpected body at `{}`.", .source.path())]
	Decode {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The request never produced a response (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling CRM endpoint `{endpoint}`.")]
	Network {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Transport failure.
		#[source]
		source: ReqwestError,
	},
	/// The configured API base cannot carry path segments.
	#[error("CRM API base URL `{base}` cannot be used as a base.")]
	InvalidBase {
		/// Offending base URL.
		base: String,
	},
}
impl DownstreamError {
	/// Raw upstream body, when the CRM produced one.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Status { body, .. } => Some(body),
			_ => None,
		}
	}
}
