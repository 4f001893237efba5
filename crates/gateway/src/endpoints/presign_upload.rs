//! # POST /v1/presign/upload
//!
//! アップロード用署名付きURL発行。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use objgate_core::{ObjectKey, TenantId};
use objgate_types::{PresignUploadRequest, PresignUploadResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /v1/presign/upload: アップロード用署名付きURL発行。
///
/// オブジェクトキーを検証し、テナント名前空間内の1キーに対するPUTのみを許可するURLを返す。
/// `content_type` を指定した場合、同じContent-Typeでのアップロードのみ受け付けられる。
pub async fn handle_presign_upload(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<PresignUploadRequest>, JsonRejection>,
) -> Result<Json<PresignUploadResponse>, GatewayError> {
    let Json(body) = body?;
    let tenant = TenantId::parse(body.tenant_id)?;
    let key = ObjectKey::parse(body.object_key)?;

    let descriptor = state
        .issuer
        .issue_upload(&tenant, &key, body.content_type.as_deref(), body.max_size)
        .await?;

    Ok(Json(PresignUploadResponse {
        url: descriptor.url,
        method: descriptor.method.as_str().to_string(),
        headers: descriptor.headers,
        expires_at: descriptor.expires_at,
    }))
}
