use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UpdateProfileRequest,
            UserResponse,
        },
        extractor::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{self, User},
        session::{clear_session_cookie, session_cookie},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(profile).put(update_profile))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_present(field: &str) -> bool {
    !field.trim().is_empty()
}

#[instrument(skip(state, jar, payload))]
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_present(&payload.name)
        || !is_present(&payload.email)
        || !is_present(&payload.password)
        || !is_present(&payload.phone)
    {
        warn!("register with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Fast-path check only; the unique constraint is the real guard.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(
        &state.db,
        &payload.name,
        &payload.email,
        &hash,
        &payload.phone,
    )
    .await
    {
        Ok(u) => u,
        Err(e) if repo::is_unique_violation(&e) => {
            warn!(email = %payload.email, "lost registration race");
            return Err(ApiError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let jar = jar.add(session_cookie(token, &state.config.cookie));
    Ok((
        jar,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_present(&payload.email) || !is_present(&payload.password) {
        warn!("login with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Authentication("User not found".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Authentication("Invalid password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let jar = jar.add(session_cookie(token, &state.config.cookie));
    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".into(),
            user: user.into(),
        }),
    ))
}

/// Client-side logout: the cookie is overwritten with an expired one.
/// The token itself stays valid until its natural expiry.
#[instrument(skip(jar))]
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(clear_session_cookie());
    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    )
}

#[instrument(skip(user))]
async fn profile(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse { user: user.into() })
}

#[instrument(skip(state, user, payload))]
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if !is_present(&payload.name) || !is_present(&payload.phone) {
        warn!(user_id = %user.id, "profile update with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let updated = User::update_profile(&state.db, user.id, &payload.name, &payload.phone).await?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(UserResponse {
        user: updated.into(),
    }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn presence_check_rejects_blank_fields() {
        assert!(is_present("Ana"));
        assert!(!is_present(""));
        assert!(!is_present("   "));
    }
}
