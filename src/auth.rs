use crate::{error::ApiError, schemas::UserId, state::AppState};
use actix_web::{
    cookie::{time, Cookie, SameSite},
    dev::Payload,
    http::header::{HeaderValue, AUTHORIZATION},
    web, FromRequest, HttpRequest,
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::{
    future::{ready, Ready},
    num::ParseIntError,
};
use tracing::{debug, error};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "token";

fn mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take a key of any size")
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|n| u8::from_str_radix(&String::from_iter(n), 16))
        .collect::<Result<Vec<u8>, ParseIntError>>()
        .ok()
}

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = mac(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize().into_bytes())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let Some(expected) = from_hex(expected_hash) else {
        return false;
    };
    let mut hasher = mac(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.verify_slice(&expected).is_ok()
}

/// Signs and checks session tokens of the form `{user}.{expires}.{signature}`.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        SessionKeys {
            secret: secret.as_bytes().to_vec(),
            ttl,
        }
    }

    fn sign(&self, payload: &str) -> HmacSha256 {
        let mut hasher = mac(&self.secret);
        hasher.update(payload.as_bytes());
        hasher
    }

    pub fn issue(&self, user: &str, now: DateTime<Utc>) -> String {
        let payload = format!("{}.{}", user, (now + self.ttl).timestamp());
        let signature = to_hex(&self.sign(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
        let (payload, signature) = token.rsplit_once('.')?;
        let (user, expires) = payload.rsplit_once('.')?;
        let signature = from_hex(signature)?;
        self.sign(payload).verify_slice(&signature).ok()?;

        let expires: i64 = expires.parse().ok()?;
        if expires <= now.timestamp() {
            debug!(user, "session token expired");
            return None;
        }
        Some(user.to_string())
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub UserId);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(current_user(request))
    }
}

fn current_user(request: &HttpRequest) -> Result<CurrentUser, ApiError> {
    let Some(state) = request.app_data::<web::Data<AppState>>() else {
        error!("AppState is missing from the application data");
        return Err(ApiError::Unauthorized);
    };
    let token = request
        .cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(request))
        .ok_or(ApiError::Unauthorized)?;
    state
        .sessions
        .verify(&token, Utc::now())
        .map(CurrentUser)
        .ok_or(ApiError::Unauthorized)
}

fn bearer_token(request: &HttpRequest) -> Option<String> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    authorization
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
