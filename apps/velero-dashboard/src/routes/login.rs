use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::SignedCookieJar;

use crate::auth::{safe_next, session_cookie, session_id, LoginCallback, SESSION_COOKIE};
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct LoginQuery {
    next: Option<String>,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<LoginQuery>,
) -> AppResult<Redirect> {
    let next = safe_next(query.next.as_deref());
    let session = session_id(&jar);
    if state.gate.current_identity(session.as_deref()).await.is_some() {
        return Ok(Redirect::to(&next));
    }
    let redirect = state.gate.require_login(&next).await?;
    Ok(Redirect::to(&redirect.location))
}

pub(crate) async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(callback): Query<LoginCallback>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let outcome = state.gate.complete_login(&callback).await?;
    let jar = match outcome.session_id {
        Some(session_id) => jar.add(session_cookie(session_id, state.config.cookie_secure)),
        None => jar,
    };
    Ok((jar, Redirect::to(&safe_next(Some(&outcome.next)))))
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Redirect) {
    let session = session_id(&jar);
    state.gate.logout(session.as_deref()).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/login/callback", get(callback))
        .route("/logout", get(logout))
}
