//! # カタログプロキシ
//!
//! テナントの一覧取得・削除リクエストをバックエンド呼び出しに変換し、
//! バックエンドの結果をテナントから見た形式に戻す。

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{DeleteResult, StorageBackend};
use crate::error::CoreError;
use crate::key::ObjectKey;
use crate::namespace::{
    is_within_namespace, to_backend_key, to_backend_prefix, to_tenant_key, TenantId,
};

/// 一覧取得のデフォルト件数
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// テナントから見たオブジェクトの概要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

/// 一覧取得の1ページ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// 次ページ取得用のマーカー。続きがない場合は空文字列。
    pub next_marker: String,
    pub truncated: bool,
}

/// 一括削除の結果。部分的な失敗も正常な結果として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// 削除に成功したテナントキー
    pub deleted: Vec<String>,
    /// キーごとの失敗メッセージ
    pub errors: Vec<String>,
}

/// 未指定または0以下の件数をデフォルト値に置き換える。
pub fn effective_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_LIST_LIMIT),
        _ => DEFAULT_LIST_LIMIT,
    }
}

pub struct CatalogProxy {
    backend: Arc<dyn StorageBackend>,
}

impl CatalogProxy {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// テナントの名前空間配下のオブジェクトを一覧する。
    ///
    /// `marker` はバックエンドの継続トークンとしてそのまま渡す。
    pub async fn list(
        &self,
        tenant: &TenantId,
        prefix: &str,
        limit: Option<i64>,
        marker: Option<&str>,
    ) -> Result<ListPage, CoreError> {
        let backend_prefix = to_backend_prefix(tenant, prefix);
        let limit = effective_limit(limit);
        let marker = marker.filter(|m| !m.is_empty());

        let listing = self
            .backend
            .list_objects(&backend_prefix, limit, marker)
            .await
            .map_err(CoreError::Backend)?;

        let objects = listing
            .objects
            .into_iter()
            .map(|obj| {
                if !is_within_namespace(tenant, &obj.key) {
                    tracing::warn!(
                        tenant_id = %tenant,
                        backend_key = %obj.key,
                        "テナント名前空間外のキーがバックエンドから返されました"
                    );
                }
                ObjectSummary {
                    key: to_tenant_key(tenant, &obj.key),
                    size: obj.size,
                    last_modified: obj.last_modified,
                    etag: obj.etag,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            tenant_id = %tenant,
            backend_prefix = %backend_prefix,
            count = objects.len(),
            truncated = listing.truncated,
            "オブジェクト一覧を取得"
        );

        Ok(ListPage {
            objects,
            next_marker: listing.next_marker.unwrap_or_default(),
            truncated: listing.truncated,
        })
    }

    /// テナントのオブジェクトを一括削除する。
    ///
    /// 全キーを先に検証し、1つでも不正なキーがあればバックエンドを呼ばずに失敗する。
    pub async fn delete(
        &self,
        tenant: &TenantId,
        keys: &[String],
    ) -> Result<DeleteOutcome, CoreError> {
        if keys.is_empty() {
            return Err(CoreError::Validation(
                "object_keys は1件以上必要です".to_string(),
            ));
        }

        let backend_keys = keys
            .iter()
            .map(|k| ObjectKey::parse(k.as_str()).map(|key| to_backend_key(tenant, &key)))
            .collect::<Result<Vec<_>, _>>()?;

        let results = self
            .backend
            .delete_objects(&backend_keys)
            .await
            .map_err(CoreError::Backend)?;

        let mut outcome = DeleteOutcome::default();
        for result in results {
            match result {
                DeleteResult::Deleted { key } => {
                    outcome.deleted.push(to_tenant_key(tenant, &key));
                }
                DeleteResult::Failed { key, message } => {
                    outcome
                        .errors
                        .push(format!("{}: {}", to_tenant_key(tenant, &key), message));
                }
            }
        }

        tracing::info!(
            tenant_id = %tenant,
            requested = keys.len(),
            deleted = outcome.deleted.len(),
            failed = outcome.errors.len(),
            "オブジェクトを一括削除"
        );

        Ok(outcome)
    }
}
