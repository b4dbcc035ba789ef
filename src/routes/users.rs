use actix_web::{get, post, web, HttpResponse, HttpResponseBuilder};
use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, new_salt, verify_password, CurrentUser};
use crate::error::{ApiError, StoreError};
use crate::schemas::{LoginJson, PublicUser, RegisterJson, User};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Answers with the public user and a fresh session cookie.
fn start_session(
    state: &AppState,
    mut response: HttpResponseBuilder,
    user: &User,
) -> HttpResponse {
    let token = state.sessions.issue(&user.id, Utc::now());
    response
        .cookie(state.sessions.cookie(token))
        .json(PublicUser::from(user))
}

#[post("/users/register")]
async fn register(
    state: web::Data<AppState>,
    json: web::Json<RegisterJson>,
) -> Result<HttpResponse, ApiError> {
    let body = json.into_inner();
    let name = body.name.trim();
    let email = normalize_email(&body.email);
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name can't be empty".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest(format!("'{email}' is not an email")));
    }
    if body.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(format!("{email} is already registered")));
    }

    let salt = new_salt();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        password_hash: hash_password(&body.password, &salt),
        salt,
    };
    // The lookup above can race with another registration
    state.store.insert_user(&user).await.map_err(|err| match err {
        StoreError::Duplicate(email) => {
            ApiError::Conflict(format!("{email} is already registered"))
        }
        other => other.into(),
    })?;
    info!(user = %user.id, "User registered");

    Ok(start_session(&state, HttpResponse::Created(), &user))
}

#[post("/users/login")]
async fn login(
    state: web::Data<AppState>,
    json: web::Json<LoginJson>,
) -> Result<HttpResponse, ApiError> {
    let body = json.into_inner();
    let user = state
        .store
        .find_user_by_email(&normalize_email(&body.email))
        .await?
        .filter(|user| verify_password(&body.password, &user.salt, &user.password_hash))
        .ok_or(ApiError::InvalidCredentials)?;

    info!(user = %user.id, "User logged in");
    Ok(start_session(&state, HttpResponse::Ok(), &user))
}

#[post("/users/logout")]
async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(state.sessions.removal_cookie())
        .json(json!({ "message": "Logged out" }))
}

#[get("/users/me")]
async fn me(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, ApiError> {
    let user = state
        .store
        .find_user(&user.0)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(PublicUser::from(&user)))
}

#[get("/users")]
async fn list_users(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let users: Vec<PublicUser> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}
