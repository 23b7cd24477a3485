//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::auth::LoginRequest,
    models::user::RegisterRequest,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// 登录
/// 令牌同时出现在 `Authorization` 响应头和响应体中
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    let bearer = format!("Bearer {}", response.token);
    Ok(([(header::AUTHORIZATION, bearer)], Json(response)))
}

/// 获取当前用户资料
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth_service.get_profile(auth_context.user_id).await?;

    Ok(Json(profile))
}

/// 受保护的示例路由，回显令牌声明
pub async fn protected(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "message": "访问已授权",
        "user": {
            "id": auth_context.user_id,
            "username": auth_context.username,
            "role": auth_context.role,
        }
    })))
}
