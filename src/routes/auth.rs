use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::auth::{FormDescriptor, LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::auth_service::{login_user, logout_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration form", body = ApiResponse<FormDescriptor>)
    ),
    tag = "Auth"
)]
pub async fn register_form() -> Json<ApiResponse<FormDescriptor>> {
    Json(ApiResponse::success(
        "Register",
        FormDescriptor::register(),
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserProfile>),
        (status = 409, description = "Email or username already taken"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let resp = register_user(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = ApiResponse<FormDescriptor>)
    ),
    tag = "Auth"
)]
pub async fn login_form() -> Json<ApiResponse<FormDescriptor>> {
    Json(ApiResponse::success(
        "Login",
        FormDescriptor::login(),
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(state.store.as_ref(), &state.auth, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Session state cleared", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = logout_user(state.store.as_ref(), user.user_id).await?;
    Ok(Json(resp))
}
