//! # POST /v1/presign/download
//!
//! ダウンロード用署名付きURL発行。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use objgate_core::{ObjectKey, TenantId};
use objgate_types::{PresignDownloadRequest, PresignDownloadResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /v1/presign/download: ダウンロード用署名付きURL発行。
pub async fn handle_presign_download(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<PresignDownloadRequest>, JsonRejection>,
) -> Result<Json<PresignDownloadResponse>, GatewayError> {
    let Json(body) = body?;
    let tenant = TenantId::parse(body.tenant_id)?;
    let key = ObjectKey::parse(body.object_key)?;

    let descriptor = state.issuer.issue_download(&tenant, &key).await?;

    Ok(Json(PresignDownloadResponse {
        url: descriptor.url,
        expires_at: descriptor.expires_at,
    }))
}
