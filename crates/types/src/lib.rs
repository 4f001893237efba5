//! # objgate 共有型定義
//!
//! GatewayのHTTP APIで送受信するリクエスト・レスポンスのJSON構造を
//! Rust構造体として提供する。
//!
//! ## エンコーディング規則
//! - 時刻: RFC 3339 (UTC)
//! - オブジェクトキー: テナントから見た相対パス（`tenants/<id>/` プレフィックスは含まない）

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 署名付きURL発行 (POST /v1/presign/upload, POST /v1/presign/download)
// ---------------------------------------------------------------------------

/// アップロード用署名付きURLの発行リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignUploadRequest {
    /// テナントID
    pub tenant_id: String,
    /// テナント名前空間内のオブジェクトキー
    pub object_key: String,
    /// アップロードを許可するContent-Type（指定時は署名に含める）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// 最大アップロードサイズ（バイト）。現状は受理のみで強制しない。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

/// アップロード用署名付きURLの発行レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignUploadResponse {
    /// クライアントがPUTに使用するURL
    pub url: String,
    /// 許可されたHTTPメソッド（常に "PUT"）
    pub method: String,
    /// アップロード時に付与が必須のヘッダー
    pub headers: BTreeMap<String, String>,
    /// URLの有効期限
    pub expires_at: DateTime<Utc>,
}

/// ダウンロード用署名付きURLの発行リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignDownloadRequest {
    /// テナントID
    pub tenant_id: String,
    /// テナント名前空間内のオブジェクトキー
    pub object_key: String,
}

/// ダウンロード用署名付きURLの発行レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignDownloadResponse {
    /// クライアントがGETに使用するURL
    pub url: String,
    /// URLの有効期限
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// 一覧取得 (POST /v1/list)
// ---------------------------------------------------------------------------

/// オブジェクト一覧の取得リクエスト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
    /// テナントID
    pub tenant_id: String,
    /// テナントから見たキーのプレフィックス
    #[serde(default)]
    pub prefix: String,
    /// 1ページあたりの最大件数（未指定または0以下で1000）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// 前ページの `next_marker`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

/// オブジェクトの概要情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// テナントから見たキー
    pub key: String,
    /// サイズ（バイト）
    pub size: u64,
    /// 最終更新時刻
    pub last_modified: DateTime<Utc>,
    /// 整合性タグ
    pub etag: String,
}

/// オブジェクト一覧の取得レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    /// オブジェクト一覧
    pub objects: Vec<ObjectInfo>,
    /// 次ページ取得用のマーカー（続きがない場合は省略）
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_marker: String,
    /// 続きのページが存在するか
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// 削除 (POST /v1/delete)
// ---------------------------------------------------------------------------

/// オブジェクトの一括削除リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// テナントID
    pub tenant_id: String,
    /// 削除するオブジェクトキー（1件以上）
    pub object_keys: Vec<String>,
}

/// オブジェクトの一括削除レスポンス。
///
/// 一部のキーのみ失敗した場合も200で返し、`errors` に失敗理由を列挙する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// 削除に成功したキー
    pub deleted: Vec<String>,
    /// キーごとの失敗メッセージ
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// ヘルスチェック・エラー
// ---------------------------------------------------------------------------

/// GET /healthz のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 常に "healthy"
    pub status: String,
    /// 応答時刻
    pub timestamp: DateTime<Utc>,
}

/// 全エンドポイント共通のエラーレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 人間が読めるエラーメッセージ
    pub error: String,
}
