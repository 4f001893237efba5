//! # ストレージバックエンドの抽象インターフェース
//!
//! Coreが外部のオブジェクトストレージに要求する最小限の操作。
//! S3互換ストレージやメモリ内実装などを差し替えられるようにトレイトで抽象化する。
//! 署名アルゴリズム（SigV4等）は実装側の責務とする。

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::BackendError;
use crate::namespace::BackendKey;

/// バックエンドの一覧結果に含まれる1オブジェクト。
/// `key` はバックエンドキーそのまま（名前空間プレフィックス付き）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

/// バックエンドの一覧結果1ページ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendListing {
    pub objects: Vec<BackendObject>,
    /// 次ページ取得用の継続トークン
    pub next_marker: Option<String>,
    /// 続きのページが存在するか
    pub truncated: bool,
}

/// 一括削除のキーごとの結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    /// 削除成功（`key` はバックエンドキー）
    Deleted { key: String },
    /// 削除失敗
    Failed { key: String, message: String },
}

/// ストレージバックエンドのトレイト。
///
/// 各メソッドはリトライしない。リトライが必要な場合は実装側のクライアントで行う。
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// PUT用の署名付きURLを生成する。
    ///
    /// `content_type` が指定された場合、そのContent-Typeでのアップロードのみ
    /// 受け付けるよう署名に含めること。
    async fn sign_upload(
        &self,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError>;

    /// GET用の署名付きURLを生成する。
    async fn sign_download(&self, key: &BackendKey, expiry: Duration)
        -> Result<String, BackendError>;

    /// `prefix` 配下のオブジェクトを最大 `limit` 件取得する。
    async fn list_objects(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> Result<BackendListing, BackendError>;

    /// 複数オブジェクトを削除し、キーごとの結果を返す。
    ///
    /// 呼び出し全体を実行できなかった場合のみ `Err` を返す。
    async fn delete_objects(&self, keys: &[BackendKey])
        -> Result<Vec<DeleteResult>, BackendError>;
}
