//! Session cookie middleware.
//!
//! Every request leaves here with a [`SessionId`] in its extensions. Visitors
//! without a valid cookie get a fresh ID, sent back with `Set-Cookie`.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Duration;
use crate::http::AppState;
use crate::session::SessionId;

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl: Duration,
}

impl SessionSettings {
    pub fn set_cookie(&self, sid: &SessionId) -> String {
        format!("{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}", self.cookie_name, sid, self.ttl.as_secs())
    }
}

/// Value of cookie `name`, if the request carries it.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

pub async fn session_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let settings = &state.session;
    let existing = read_cookie(req.headers(), &settings.cookie_name).and_then(SessionId::parse);
    let fresh = existing.is_none();
    let sid = existing.unwrap_or_else(SessionId::generate);
    if fresh {
        tracing::debug!(session_id = %sid, "new session");
    }
    req.extensions_mut().insert(sid.clone());

    let mut resp = next.run(req).await;
    if fresh {
        if let Ok(v) = HeaderValue::from_str(&settings.set_cookie(&sid)) {
            resp.headers_mut().append(SET_COOKIE, v);
        }
    }
    resp
}
