//! # objgate Core
//!
//! テナント分離と署名付きURL発行のロジックを実装する。
//! HTTP層・ストレージSDKには依存せず、`StorageBackend` トレイト経由で外部と通信する。
//!
//! ## 処理フロー
//! 1. オブジェクトキーを検証する（[`key`]）
//! 2. テナント名前空間付きのバックエンドキーに変換する（[`namespace`]）
//! 3. 署名付きURLを発行する（[`issuer`]）、または一覧取得・削除を行う（[`catalog`]）
//! 4. バックエンドの結果から名前空間プレフィックスを取り除いて返す

pub mod backend;
pub mod catalog;
pub mod error;
pub mod issuer;
pub mod key;
pub mod namespace;

#[cfg(test)]
mod test_helpers;

pub use backend::{BackendListing, BackendObject, DeleteResult, StorageBackend};
pub use catalog::{CatalogProxy, DeleteOutcome, ListPage, ObjectSummary, DEFAULT_LIST_LIMIT};
pub use error::{BackendError, CoreError};
pub use issuer::{AuthorizationDescriptor, AuthorizationIssuer, HttpMethod, PRESIGN_EXPIRY};
pub use key::{validate, ObjectKey};
pub use namespace::{to_backend_key, to_tenant_key, BackendKey, TenantId};
