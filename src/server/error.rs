//! Error-to-response mapping for the JSON API and the HTML pages.

// crates.io
use axum::{
	Json,
	extract::rejection::JsonRejection,
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};
// self
use crate::{_prelude::*, error::NotFoundKind, server::pages};

/// JSON error body: `{ "success": false, "error": "..." }` plus context fields.
#[derive(Debug)]
pub struct ApiError(pub Error);
impl From<Error> for ApiError {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self(Error::InvalidParameter { name: "body", reason: rejection.body_text() })
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = status_of(&self.0);
		let mut body = json!({ "success": false, "error": self.0.to_string() });

		if let Error::LimitReached { used, limit } = &self.0 {
			body["currentCount"] = json!(used);
			body["limit"] = json!(limit);
		}
		if let Some(details) = details_of(&self.0) {
			body["details"] = serde_json::from_str::<Value>(details)
				.unwrap_or_else(|_| Value::String(details.to_owned()));
		}

		log(status, &self.0);

		(status, Json(body)).into_response()
	}
}

/// HTML error page; a missing token sends the browser back to the landing page.
#[derive(Debug)]
pub struct PageError(pub Error);
impl From<Error> for PageError {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl IntoResponse for PageError {
	fn into_response(self) -> Response {
		if let Error::NotFound { kind: NotFoundKind::Token, id } = &self.0 {
			tracing::info!(account = %id, "No token stored; redirecting to the landing page.");

			return Redirect::to("/").into_response();
		}

		let status = status_of(&self.0);
		let title = status.canonical_reason().unwrap_or("Error");

		log(status, &self.0);

		(status, Html(pages::error(title, &self.0.to_string(), details_of(&self.0)))).into_response()
	}
}

fn status_of(e: &Error) -> StatusCode {
	match e {
		Error::MissingParameter { .. } | Error::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
		Error::NotFound { .. } => StatusCode::NOT_FOUND,
		Error::LimitReached { .. } => StatusCode::FORBIDDEN,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

fn details_of(e: &Error) -> Option<&str> {
	match e {
		Error::ExchangeFailed(failure) | Error::RefreshFailed(failure) => Some(&failure.payload),
		Error::Downstream(e) => e.body(),
		_ => None,
	}
}

fn log(status: StatusCode, e: &Error) {
	if status.is_server_error() {
		tracing::error!(
			status = status.as_u16(),
			error = %e,
			details = ?details_of(e),
			"Request failed."
		);
	} else {
		tracing::warn!(status = status.as_u16(), error = %e, "Request rejected.");
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::body;
	// self
	use super::*;
	use crate::error::ProviderFailure;

	async fn json_of(response: Response) -> Value {
		let bytes = body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Response body should be readable.");

		serde_json::from_slice(&bytes).expect("Response body should be JSON.")
	}

	#[tokio::test]
	async fn limit_reached_carries_counts() {
		let response = ApiError(Error::LimitReached { used: 3, limit: 3 }).into_response();

		assert_eq!(response.status(), StatusCode::FORBIDDEN);

		let body = json_of(response).await;

		assert_eq!(body["success"], json!(false));
		assert_eq!(body["currentCount"], json!(3));
		assert_eq!(body["limit"], json!(3));
	}

	#[tokio::test]
	async fn provider_payload_is_echoed_as_details() {
		let failure = ProviderFailure::upstream(Some(400), "{\"error\":\"invalid_grant\"}");
		let response = ApiError(Error::ExchangeFailed(failure)).into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(json_of(response).await["details"], json!({ "error": "invalid_grant" }));
	}

	#[tokio::test]
	async fn json_rejections_use_the_api_error_body() {
		let rejection = JsonRejection::from(axum::extract::rejection::MissingJsonContentType::default());
		let response = ApiError::from(rejection).into_response();

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let body = json_of(response).await;

		assert_eq!(body["success"], json!(false));
		assert!(body["error"].as_str().is_some_and(|error| error.contains("body")));
	}

	#[test]
	fn missing_token_pages_redirect_home() {
		let response = PageError(Error::token_not_found("loc-1")).into_response();

		assert!(response.status().is_redirection());
		assert_eq!(
			response.headers().get(axum::http::header::LOCATION).and_then(|v| v.to_str().ok()),
			Some("/")
		);
		assert_eq!(
			PageError(Error::MissingParameter { name: "code" }).into_response().status(),
			StatusCode::BAD_REQUEST
		);
	}
}
