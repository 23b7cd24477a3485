//! 指标处理器
//! 提供 /metrics 端点

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{db, middleware::AppState};

/// 指标响应
#[derive(Serialize)]
pub struct MetricsResponse {
    pub db_pool_size: u32,
    pub db_pool_idle: u32,
    pub process_uptime_secs: u64,
}

/// 指标暴露端点
///
/// 返回基础指标的 JSON 快照；计数器与直方图由 metrics crate
/// 的全局 recorder 收集，生产环境接 Prometheus exporter。
pub async fn metrics_export(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    // 刷新连接池 gauge
    db::record_pool_metrics(&state.db);

    Json(MetricsResponse {
        db_pool_size: state.db.size() as u32,
        db_pool_idle: state.db.num_idle() as u32,
        process_uptime_secs: crate::handlers::health::get_uptime(),
    })
}
