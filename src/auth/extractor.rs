use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{jwt::JwtKeys, repo::User, session::SESSION_COOKIE},
    error::ApiError,
    state::AppState,
};

/// Session gate: resolves the request's session cookie into the
/// authenticated user record, or rejects with 401.
///
/// Missing cookie, bad signature, expired token and vanished account
/// all present the same rejection to the client.
#[derive(Debug)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or_else(|| {
                warn!("session cookie missing");
                ApiError::Unauthorized
            })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Unauthorized
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::Unauthorized
            })?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request, StatusCode};

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/auth/profile");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("token=definitely-not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrongly_named_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("session=whatever"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
