//! # Gatewayエンドポイント
//!
//! ## API エンドポイント
//! - `POST /v1/presign/upload`: アップロード用署名付きURL発行
//! - `POST /v1/presign/download`: ダウンロード用署名付きURL発行
//! - `POST /v1/list`: テナント名前空間内のオブジェクト一覧
//! - `POST /v1/delete`: テナント名前空間内のオブジェクト一括削除
//! - `GET /healthz`: ヘルスチェック

pub mod delete;
pub mod health;
pub mod list;
pub mod presign_download;
pub mod presign_upload;


use std::sync::Arc;

use axum::routing::{get, post};

use crate::config::GatewayState;

pub use delete::handle_delete;
pub use health::handle_health;
pub use list::handle_list;
pub use presign_download::handle_presign_download;
pub use presign_upload::handle_presign_upload;

/// Gatewayのルーターを構築する。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/v1/presign/upload", post(handle_presign_upload))
        .route("/v1/presign/download", post(handle_presign_download))
        .route("/v1/list", post(handle_list))
        .route("/v1/delete", post(handle_delete))
        .route("/healthz", get(handle_health))
        .with_state(state)
}
