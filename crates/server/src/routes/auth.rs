use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::auth::{domain::{LoginInput, SessionStatus}, service::SESSION_VALUE};

use super::ServerState;
use crate::errors::JsonApiError;

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in, session cookie set"), (status = 401, description = "Invalid email or password", body = crate::openapi::ErrorDoc)))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<serde_json::Value>), JsonApiError> {
    let input = payload.map(|Json(i)| i).unwrap_or_default();
    state.auth.login(&input)?;

    let cookie = Cookie::build((state.auth.cookie_name().to_owned(), SESSION_VALUE))
        .path("/")
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.auth.session_max_age_secs()));
    Ok((jar.add(cookie), Json(serde_json::json!({"success": true}))))
}

#[utoipa::path(get, path = "/auth/session", tag = "auth", responses((status = 200, description = "Session state", body = crate::openapi::SessionDoc)))]
pub async fn session(State(state): State<ServerState>, jar: CookieJar) -> Json<SessionStatus> {
    let value = jar.get(state.auth.cookie_name()).map(|c| c.value());
    Json(state.auth.session(value))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Session cookie removed")))]
pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build((state.auth.cookie_name().to_owned(), "")).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
