//! # POST /v1/delete
//!
//! テナント名前空間内のオブジェクト一括削除。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use objgate_core::TenantId;
use objgate_types::{DeleteRequest, DeleteResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /v1/delete: オブジェクト一括削除。
///
/// 1つでも不正なキーを含むリクエストは、ストレージに触れずに400で拒否する。
/// 一括削除はアトミックではなく、一部のキーの失敗は `errors` に列挙して200で返す。
pub async fn handle_delete(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, GatewayError> {
    let Json(body) = body?;
    let tenant = TenantId::parse(body.tenant_id)?;

    let outcome = state.catalog.delete(&tenant, &body.object_keys).await?;

    Ok(Json(DeleteResponse {
        deleted: outcome.deleted,
        errors: outcome.errors,
    }))
}
