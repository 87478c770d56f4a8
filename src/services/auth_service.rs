use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    config::AuthSettings,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    error::{AppError, AppResult},
    models::NewUser,
    repository::Store,
    response::{ApiResponse, Meta},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(settings: &AuthSettings, user_id: Uuid) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    store: &dyn Store,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    payload.validate()?;
    let RegisterRequest {
        username,
        email,
        password,
        ..
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_lowercase();

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "Email address already registered. Please use a different email.".into(),
        ));
    }
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(
            "Username already taken. Please choose a different username.".into(),
        ));
    }

    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash: hash_password(&password)?,
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    log_audit(
        store,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Congratulations! Your account has been created successfully. You can now log in.",
        UserProfile::from(user),
        None,
    ))
}

pub async fn login_user(
    store: &dyn Store,
    settings: &AuthSettings,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let Some(user) = store.find_user_by_email(&email).await? else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = issue_token(settings, user.id)?;

    log_audit(
        store,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        user: UserProfile::from(user),
    };
    Ok(ApiResponse::success(
        "Welcome back! You have successfully logged in.",
        resp,
        Some(Meta::empty()),
    ))
}

/// Drops the server-side session state. The client discards its token.
pub async fn logout_user(
    store: &dyn Store,
    user_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    store.clear_promo(user_id).await?;
    log_audit(store, Some(user_id), "user_logout", Some("users"), None).await;
    Ok(ApiResponse::success(
        "You have been successfully logged out.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
