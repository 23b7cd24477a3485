//! 健康检查处理器
//! 提供 /、/health 和 /ready 端点

use axum::{extract::State, Json};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{db, middleware::AppState};

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: String,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 应用启动时间（在 main.rs 中设置一次）
static APP_START_TIME: OnceCell<u64> = OnceCell::new();

/// 设置应用启动时间
pub fn set_start_time() {
    let _ = APP_START_TIME.set(unix_now());
}

/// 获取应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START_TIME
        .get()
        .map_or(0, |start| unix_now().saturating_sub(*start))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 服务信息（根路径）
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Auth API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": {
                "path": "/health",
                "method": "GET",
                "description": "Check API health status",
            },
            "register": {
                "path": "/api/v1/auth/register",
                "method": "POST",
                "description": "Register a new user",
            },
            "login": {
                "path": "/api/v1/auth/login",
                "method": "POST",
                "description": "Authenticate user and get token",
            },
            "me": {
                "path": "/api/v1/auth/me",
                "method": "GET",
                "description": "Get current user profile",
            },
            "protected": {
                "path": "/api/v1/protected",
                "method": "GET",
                "description": "Test protected route (requires token)",
            },
        }
    }))
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "auth".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// 就绪探针
/// 检查数据库等依赖
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let mut checks = Vec::new();

    // 数据库检查
    let db_health = db::health_check(&state.db).await;
    checks.push(match db_health {
        db::HealthStatus::Healthy { latency_ms } => HealthCheck {
            name: "database".to_string(),
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            message: None,
        },
        db::HealthStatus::Unhealthy(msg) => HealthCheck {
            name: "database".to_string(),
            status: "unhealthy".to_string(),
            latency_ms: None,
            message: Some(msg),
        },
    });

    let all_healthy = checks.iter().all(|c| c.status == "healthy");

    Json(ReadinessResponse {
        ready: all_healthy,
        checks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_monotonic() {
        set_start_time();
        let first = get_uptime();
        let second = get_uptime();
        assert!(second >= first);
    }
}
