//! Route table and handlers.

// crates.io
use axum::{
	Json, Router,
	extract::{Query, State, rejection::JsonRejection},
	response::{Html, IntoResponse, Redirect, Response},
	routing::{get, post},
};
// self
use crate::{
	_prelude::*,
	auth::AccountId,
	server::{
		AppState, SharedState,
		error::{ApiError, PageError},
		pages,
	},
	usage::{ContactRegistration, SubmissionReceipt},
};

/// Builds the route table over `state`.
pub fn router(state: SharedState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/auth/start", get(auth_start))
		.route("/authorize-handler", get(authorize_handler))
		.route("/dashboard", get(dashboard))
		.route("/api/contacts", post(register_contact))
		.route("/api/track-submission", post(track_submission))
		.route("/health", get(health))
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallbackQuery {
	code: Option<String>,
	location_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardQuery {
	location_id: Option<String>,
	email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ContactRequest {
	email: Option<String>,
	first_name: Option<String>,
	last_name: Option<String>,
	location_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactResponse {
	success: bool,
	contact_id: String,
	created: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrackRequest {
	email: Option<String>,
	ad_generation_id: Option<String>,
	location_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct TrackResponse {
	success: bool,
	#[serde(flatten)]
	receipt: SubmissionReceipt,
}

async fn index(State(state): State<SharedState>) -> Html<String> {
	Html(pages::index(&state.config.redirect_uri, "/auth/start"))
}

async fn auth_start(State(state): State<SharedState>) -> Redirect {
	let url = state.manager.authorization_url();

	tracing::info!(%url, "Redirecting to the consent screen.");

	Redirect::to(url.as_str())
}

async fn authorize_handler(
	State(state): State<SharedState>,
	Query(query): Query<CallbackQuery>,
) -> Result<Html<String>, PageError> {
	let code = query.code.as_deref().map(str::trim).unwrap_or_default();

	if code.is_empty() {
		return Err(Error::MissingParameter { name: "code" }.into());
	}

	let account = match non_blank(query.location_id.as_deref()) {
		Some(raw) => parse_account(raw)?,
		None => callback_fallback(&state)?,
	};

	tracing::info!(%account, "Authorization code received.");

	let record = state.manager.exchange(code, &account).await?;

	Ok(Html(pages::authorized(&record)))
}

async fn dashboard(
	State(state): State<SharedState>,
	Query(query): Query<DashboardQuery>,
) -> Result<Response, PageError> {
	let account = match account_or_default(&state, query.location_id.as_deref()) {
		Err(Error::MissingParameter { name: "locationId" }) => {
			tracing::info!("Dashboard requested without a location; redirecting to the landing page.");

			return Ok(Redirect::to("/").into_response());
		},
		account => account?,
	};

	if let Some(email) = non_blank(query.email.as_deref()) {
		let snapshot = state.usage.snapshot(&account, email).await?;

		return Ok(Html(pages::usage(&snapshot)).into_response());
	}

	let record = state.manager.resolve(&account).await?;
	let location = state.crm.location(&record.access_token, &account).await.map_err(Error::from)?;

	Ok(Html(pages::dashboard(&location, &record)).into_response())
}

async fn register_contact(
	State(state): State<SharedState>,
	payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
	let Json(request) = payload?;
	let email = non_blank(request.email.as_deref())
		.ok_or(Error::MissingParameter { name: "email" })?
		.to_owned();
	let account = account_or_default(&state, request.location_id.as_deref())?;
	let upserted = state
		.usage
		.register_contact(
			&account,
			ContactRegistration {
				email,
				first_name: request.first_name,
				last_name: request.last_name,
			},
		)
		.await?;

	Ok(Json(ContactResponse {
		success: true,
		contact_id: upserted.contact.id.to_string(),
		created: upserted.created,
	}))
}

async fn track_submission(
	State(state): State<SharedState>,
	payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<TrackResponse>, ApiError> {
	let Json(request) = payload?;
	let email =
		non_blank(request.email.as_deref()).ok_or(Error::MissingParameter { name: "email" })?;
	let account = account_or_default(&state, request.location_id.as_deref())?;
	let receipt = state
		.usage
		.track_submission(&account, email, non_blank(request.ad_generation_id.as_deref()))
		.await?;

	Ok(Json(TrackResponse { success: true, receipt }))
}

async fn health() -> impl IntoResponse {
	"OK"
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_account(raw: &str) -> Result<AccountId> {
	AccountId::new(raw)
		.map_err(|e| Error::InvalidParameter { name: "locationId", reason: e.to_string() })
}

fn account_or_default(state: &AppState, raw: Option<&str>) -> Result<AccountId> {
	match non_blank(raw) {
		Some(raw) => parse_account(raw),
		None => state
			.config
			.default_account
			.clone()
			.ok_or(Error::MissingParameter { name: "locationId" }),
	}
}

fn callback_fallback(state: &AppState) -> Result<AccountId> {
	match (&state.config.default_account, state.config.callback_fallback) {
		(Some(account), true) => {
			tracing::warn!(%account, "Callback omitted `locationId`; using the default location.");

			Ok(account.clone())
		},
		_ => Err(Error::MissingParameter { name: "locationId" }),
	}
}
