//! # S3互換ストレージ実装
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用する `StorageBackend` 実装。
//! 署名（SigV4）は `rust-s3` に委ねる。

use std::time::Duration;

use ::s3::creds::Credentials;
use ::s3::{Bucket, Region};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::{header, HeaderMap, HeaderValue};
use objgate_core::{
    BackendError, BackendKey, BackendListing, BackendObject, DeleteResult, StorageBackend,
};

use crate::config::GatewayConfig;

/// S3互換ストレージによる `StorageBackend` 実装。
pub struct S3Storage {
    /// 内部通信用バケット（一覧取得・削除）
    bucket_internal: Bucket,
    /// クライアント向けバケット（署名付きURL生成用）。
    /// Noneの場合はbucket_internalを使用する。
    bucket_public: Option<Bucket>,
}

impl S3Storage {
    pub fn new(bucket_internal: Bucket, bucket_public: Option<Bucket>) -> Self {
        Self {
            bucket_internal,
            bucket_public,
        }
    }

    /// 設定からS3バケットを初期化する。
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => Credentials::new(
                Some(access_key.as_str()),
                Some(secret_key.as_str()),
                None,
                None,
                None,
            )?,
            _ => Credentials::default()?,
        };

        let bucket_internal = Self::init_bucket(
            config.endpoint.as_deref(),
            config.region.as_deref(),
            &config.bucket_name,
            credentials.clone(),
        )?;

        let bucket_public = config
            .public_endpoint
            .as_deref()
            .map(|public_ep| {
                tracing::info!(
                    s3_public_endpoint = %public_ep,
                    "クライアント向けS3エンドポイントを設定"
                );
                Self::init_bucket(
                    Some(public_ep),
                    config.region.as_deref(),
                    &config.bucket_name,
                    credentials.clone(),
                )
            })
            .transpose()?;

        tracing::info!(
            bucket = %config.bucket_name,
            region = config.region.as_deref().unwrap_or("(auto)"),
            "S3ストレージを初期化"
        );

        Ok(Self::new(bucket_internal, bucket_public))
    }

    /// エンドポイント指定時はパススタイルのカスタムリージョン、
    /// 未指定時はAWSリージョン名からバケットを構築する。
    fn init_bucket(
        endpoint: Option<&str>,
        region: Option<&str>,
        bucket_name: &str,
        credentials: Credentials,
    ) -> anyhow::Result<Bucket> {
        let bucket = match endpoint {
            Some(endpoint) => {
                let region = Region::Custom {
                    region: region
                        .map(str::to_string)
                        .unwrap_or_else(|| detect_region(endpoint)),
                    endpoint: endpoint.to_string(),
                };
                Bucket::new(bucket_name, region, credentials)?.with_path_style()
            }
            None => {
                let region: Region = region.unwrap_or("us-east-1").parse()?;
                Bucket::new(bucket_name, region, credentials)?
            }
        };
        Ok(*bucket)
    }

    fn public_bucket(&self) -> &Bucket {
        self.bucket_public.as_ref().unwrap_or(&self.bucket_internal)
    }
}

/// AWS S3エンドポイント（s3.REGION.amazonaws.com）からリージョンを検出する。
/// 非AWSエンドポイントではus-east-1を使用する。
fn detect_region(endpoint: &str) -> String {
    endpoint
        .find("s3.")
        .and_then(|start| {
            let rest = &endpoint[start + 3..];
            rest.find(".amazonaws.com").map(|end| rest[..end].to_string())
        })
        .filter(|region| !region.is_empty())
        .unwrap_or_else(|| "us-east-1".to_string())
}

fn expiry_secs(expiry: Duration) -> u32 {
    u32::try_from(expiry.as_secs()).unwrap_or(u32::MAX)
}

fn parse_last_modified(value: &str) -> Result<DateTime<Utc>, BackendError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| BackendError::Malformed(format!("LastModifiedを解釈できません: {value}: {e}")))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// ListObjectsV2の失敗ステータスをエラーに変換する。
/// 継続トークン指定時の400は、クライアントが渡したマーカーの不正として区別する。
fn list_status_error(status: u16, marker: Option<&str>) -> BackendError {
    match (status, marker) {
        (400, Some(marker)) => BackendError::Rejected(format!(
            "ListObjectsV2失敗: HTTP 400（継続トークンが不正です: {marker}）"
        )),
        _ => BackendError::Rejected(format!("ListObjectsV2失敗: HTTP {status}")),
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn sign_upload(
        &self,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        let headers = match content_type {
            Some(ct) => {
                let value = HeaderValue::from_str(ct)
                    .map_err(|e| BackendError::Malformed(format!("Content-Typeが不正です: {e}")))?;
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, value);
                Some(headers)
            }
            None => None,
        };

        self.public_bucket()
            .presign_put(key.as_str(), expiry_secs(expiry), headers, None)
            .await
            .map_err(|e| BackendError::Rejected(format!("署名付きアップロードURL生成失敗: {e}")))
    }

    async fn sign_download(
        &self,
        key: &BackendKey,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.public_bucket()
            .presign_get(key.as_str(), expiry_secs(expiry), None)
            .await
            .map_err(|e| BackendError::Rejected(format!("署名付きダウンロードURL生成失敗: {e}")))
    }

    async fn list_objects(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> Result<BackendListing, BackendError> {
        let (page, status) = self
            .bucket_internal
            .list_page(
                prefix.to_string(),
                None,
                marker.map(str::to_string),
                None,
                Some(limit),
            )
            .await
            .map_err(|e| BackendError::Unavailable(format!("ListObjectsV2失敗: {e}")))?;

        if !is_success(status) {
            return Err(list_status_error(status, marker));
        }

        let objects = page
            .contents
            .into_iter()
            .map(|obj| {
                Ok(BackendObject {
                    last_modified: parse_last_modified(&obj.last_modified)?,
                    key: obj.key,
                    size: obj.size,
                    etag: obj.e_tag.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        Ok(BackendListing {
            objects,
            next_marker: page.next_continuation_token.filter(|t| !t.is_empty()),
            truncated: page.is_truncated,
        })
    }

    /// キーごとにDELETEを発行する。
    ///
    /// 最初のリクエストで通信に失敗した場合は何も削除されていないため呼び出し全体を失敗とし、
    /// 2件目以降の通信失敗はキーごとの失敗として返す。
    async fn delete_objects(
        &self,
        keys: &[BackendKey],
    ) -> Result<Vec<DeleteResult>, BackendError> {
        let mut results = Vec::with_capacity(keys.len());

        for (index, key) in keys.iter().enumerate() {
            match self.bucket_internal.delete_object(key.as_str()).await {
                Ok(response) if is_success(response.status_code()) => {
                    results.push(DeleteResult::Deleted { key: key.to_string() });
                }
                Ok(response) => {
                    results.push(DeleteResult::Failed {
                        key: key.to_string(),
                        message: format!("削除に失敗しました (HTTP {})", response.status_code()),
                    });
                }
                Err(e) if index == 0 => {
                    return Err(BackendError::Unavailable(format!("DeleteObject失敗: {e}")));
                }
                Err(e) => {
                    tracing::warn!(backend_key = %key, error = %e, "DeleteObject失敗");
                    results.push(DeleteResult::Failed {
                        key: key.to_string(),
                        message: "ストレージに接続できませんでした".to_string(),
                    });
                }
            }
        }

        Ok(results)
    }
}
