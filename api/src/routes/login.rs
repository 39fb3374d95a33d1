use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use finmock_core::Identity;
use finmock_mcp_runtime::LOGIN_PAGE_PATH;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::{AppForm, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(&format!("/{LOGIN_PAGE_PATH}"), get(login_page))
        .route("/login", post(login_submit))
}

// ──────────────────────────────────────────────
// GET /mockWebPage
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginPageParams {
    /// Session id taken from the `login_url` of a login-required payload
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Login page for a session. Lists the phone numbers that have test data.
#[utoipa::path(
    get,
    path = "/mockWebPage",
    params(LoginPageParams),
    responses(
        (status = 200, description = "Login form HTML"),
        (status = 400, description = "Missing sessionId", body = finmock_core::error::ApiError)
    ),
    tag = "login"
)]
pub async fn login_page(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LoginPageParams>,
) -> Result<Html<String>, AppError> {
    let session_id = params
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation {
            message: "sessionId query parameter is required".to_string(),
            field: Some("sessionId".to_string()),
            received: None,
            docs_hint: Some("Open the login_url returned by tools/call.".to_string()),
        })?;

    let identities = state
        .fixtures
        .identities()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Html(render_login_form(&session_id, &identities)))
}

// ──────────────────────────────────────────────
// POST /login
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginSubmit {
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginSubmit, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session authenticated"),
        (status = 400, description = "Missing sessionId or phoneNumber", body = finmock_core::error::ApiError),
        (status = 404, description = "No test data for phoneNumber", body = finmock_core::error::ApiError),
        (status = 409, description = "Session bound to another phoneNumber", body = finmock_core::error::ApiError)
    ),
    tag = "login"
)]
pub async fn login_submit(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginSubmit>,
) -> Result<Html<String>, AppError> {
    let identity = Identity::new(form.phone_number);
    if identity.as_str().is_empty() {
        return Err(AppError::Validation {
            message: "phoneNumber must not be empty".to_string(),
            field: Some("phoneNumber".to_string()),
            received: None,
            docs_hint: Some("Use one of the phone numbers listed on the login page.".to_string()),
        });
    }

    let outcome = state.gateway.login(&form.session_id, &identity).await?;
    Ok(Html(render_login_success(&outcome.session.id, &identity)))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn render_login_form(session_id: &str, identities: &[Identity]) -> String {
    let options: String = identities
        .iter()
        .map(|identity| {
            let escaped = html_escape(identity.as_str());
            format!("<li><code>{escaped}</code></li>\n")
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>finmock | Login</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 420px; margin: 60px auto; padding: 0 20px; }}
h1 {{ font-size: 1.4em; }}
label {{ display: block; margin-top: 12px; font-weight: 500; }}
input[type="tel"] {{ width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }}
button {{ margin-top: 20px; padding: 10px 24px; background: #111; color: #fff; border: none; cursor: pointer; font-size: 1em; }}
.info {{ color: #666; font-size: 0.9em; margin-top: 8px; }}
</style>
</head>
<body>
<h1>Sign in to finmock</h1>
<p class="info">Session <code>{session_id_escaped}</code></p>
<form method="POST" action="login">
<input type="hidden" name="sessionId" value="{session_id_escaped}">
<label>Phone number<input type="tel" name="phoneNumber" required autofocus></label>
<button type="submit">Login</button>
</form>
<p class="info">Phone numbers with test data:</p>
<ul>
{options}</ul>
</body>
</html>"#,
        session_id_escaped = html_escape(session_id),
    )
}

fn render_login_success(session_id: &str, identity: &Identity) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>finmock | Logged in</title>
</head>
<body>
<h1>Login successful</h1>
<p>Session <code>{session}</code> is now signed in as <code>{identity}</code>.</p>
<p>Return to your client and repeat the tool call.</p>
</body>
</html>"#,
        session = html_escape(session_id),
        identity = html_escape(identity.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_form_escapes_session_id() {
        let html = render_login_form("<script>", &[Identity::new("1010101010")]);
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<code>1010101010</code>"));
        assert!(html.contains("name=\"phoneNumber\""));
        assert!(html.contains("action=\"login\""));
    }
}
