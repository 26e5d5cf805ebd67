//! Plain HTML templates for the browser-facing routes.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth::TokenRecord, crm::Location, usage::UsageSnapshot};

const TOKEN_PREVIEW_CHARS: usize = 10;

/// Landing page with the redirect URI and a link that starts authorization.
pub fn index(redirect_uri: &Url, start_path: &str) -> String {
	layout(
		"GoHighLevel OAuth App",
		&format!(
			"<p>Redirect URI: <code>{}</code></p>\n<a href=\"{}\">Test Authorization</a>",
			escape(redirect_uri.as_str()),
			escape(start_path),
		),
	)
}

/// Summary shown after a successful code exchange.
pub fn authorized(record: &TokenRecord) -> String {
	let refresh = record
		.refresh_token
		.as_ref()
		.map(|token| token.preview(TOKEN_PREVIEW_CHARS))
		.unwrap_or_else(|| "(none)".into());

	layout(
		"Authorization Successful!",
		&format!(
			"<h2>Token Info:</h2>\n<pre>\nAccess Token: {}\nRefresh Token: {}\nExpires In: {} \
			 seconds\nExpires At: {}\nLocation ID: {}\n</pre>\n<a href=\"/dashboard?locationId={}\">Open \
			 dashboard</a>",
			escape(&record.access_token.preview(TOKEN_PREVIEW_CHARS)),
			escape(&refresh),
			record.remaining_at(record.issued_at).whole_seconds(),
			timestamp(record.expires_at),
			escape(&record.account),
			escape(&record.account),
		),
	)
}

/// Location profile plus token status.
pub fn dashboard(location: &Location, record: &TokenRecord) -> String {
	let rows = [
		("Location ID", Some(location.id.as_str())),
		("Name", Some(location.name.as_str())),
		("Email", location.email.as_deref()),
		("Phone", location.phone.as_deref()),
		("Address", location.address.as_deref()),
		("City", location.city.as_deref()),
		("State", location.state.as_deref()),
		("Country", location.country.as_deref()),
		("Timezone", location.timezone.as_deref()),
		("Website", location.website.as_deref()),
	]
	.into_iter()
	.filter_map(|(label, value)| value.map(|value| row(label, value)))
	.collect::<String>();

	layout(
		"Location Dashboard",
		&format!(
			"<table>\n{rows}</table>\n<h2>Token</h2>\n<table>\n{}{}</table>",
			row("Issued At", &timestamp(record.issued_at)),
			row("Expires At", &timestamp(record.expires_at)),
		),
	)
}

/// Usage counter view for one contact.
pub fn usage(snapshot: &UsageSnapshot) -> String {
	let contact = &snapshot.contact;

	layout(
		"Contact Usage",
		&format!(
			"<table>\n{}{}{}{}{}</table>",
			row("Contact", &contact.display_name()),
			row("Contact ID", &contact.id),
			row("Used", &snapshot.used.to_string()),
			row("Limit", &snapshot.limit.to_string()),
			row("Remaining", &snapshot.remaining.to_string()),
		),
	)
}

/// Error page; `details` carries the upstream payload verbatim.
pub fn error(title: &str, message: &str, details: Option<&str>) -> String {
	let details = details
		.map(|details| format!("\n<h2>Details</h2>\n<pre>{}</pre>", escape(details)))
		.unwrap_or_default();

	layout(title, &format!("<p>{}</p>{details}\n<a href=\"/\">Back</a>", escape(message)))
}

fn layout(title: &str, body: &str) -> String {
	let title = escape(title);

	format!(
		"<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
		 <body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
	)
}

fn row(label: &str, value: &str) -> String {
	format!("<tr><th>{}</th><td>{}</td></tr>\n", escape(label), escape(value))
}

fn timestamp(instant: OffsetDateTime) -> String {
	instant.format(&Rfc3339).unwrap_or_else(|_| instant.to_string())
}

fn escape(raw: &str) -> String {
	let mut buf = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => buf.push_str("&amp;"),
			'<' => buf.push_str("&lt;"),
			'>' => buf.push_str("&gt;"),
			'"' => buf.push_str("&quot;"),
			'\'' => buf.push_str("&#39;"),
			_ => buf.push(c),
		}
	}

	buf
}
