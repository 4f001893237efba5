//! # POST /v1/list
//!
//! テナント名前空間内のオブジェクト一覧。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use objgate_core::TenantId;
use objgate_types::{ListRequest, ListResponse, ObjectInfo};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /v1/list: オブジェクト一覧。
///
/// 返却するキーからはテナント名前空間のプレフィックスを取り除く。
/// `next_marker` を次回の `marker` に指定すると続きのページを取得できる。
pub async fn handle_list(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<ListRequest>, JsonRejection>,
) -> Result<Json<ListResponse>, GatewayError> {
    let Json(body) = body?;
    let tenant = TenantId::parse(body.tenant_id)?;

    let page = state
        .catalog
        .list(&tenant, &body.prefix, body.limit, body.marker.as_deref())
        .await?;

    let objects = page
        .objects
        .into_iter()
        .map(|obj| ObjectInfo {
            key: obj.key,
            size: obj.size,
            last_modified: obj.last_modified,
            etag: obj.etag,
        })
        .collect();

    Ok(Json(ListResponse {
        objects,
        next_marker: page.next_marker,
        truncated: page.truncated,
    }))
}
