//! # メモリ内ストレージ実装
//!
//! S3認証情報のないローカル開発環境・テストで使用する `StorageBackend` 実装。
//! オブジェクトの索引をメモリ内に保持し、署名付きURLはHMAC-SHA256でローカルに署名する。
//! 再起動で内容は失われる。

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use objgate_core::{
    BackendError, BackendKey, BackendListing, BackendObject, DeleteResult, HttpMethod,
    StorageBackend,
};
use reqwest::Url;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

type HmacSha256 = Hmac<Sha256>;

/// メモリ内に保持するオブジェクトのメタデータ。
#[derive(Debug, Clone)]
struct StoredObject {
    size: u64,
    last_modified: DateTime<Utc>,
    etag: String,
}

/// メモリ内ストレージ。
pub struct MemoryStorage {
    bucket: String,
    base_url: Url,
    secret: Vec<u8>,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    /// 削除を失敗させるキーとそのメッセージ
    #[cfg(test)]
    delete_failures: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new(bucket: &str, base_url: &str, secret: &[u8]) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("MEMORY_BASE_URLが不正です: {base_url}");
        }
        Ok(Self {
            bucket: bucket.to_string(),
            base_url,
            secret: secret.to_vec(),
            objects: RwLock::new(BTreeMap::new()),
            #[cfg(test)]
            delete_failures: RwLock::new(HashMap::new()),
        })
    }

    /// オブジェクトのメタデータを登録する（既存のキーは上書き）。
    pub async fn put_object(&self, key: &str, size: u64) {
        let digest = Sha256::digest(format!("{key}:{size}").as_bytes());
        let etag = format!("\"{}\"", &hex::encode(digest)[..32]);
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                size,
                last_modified: Utc::now(),
                etag,
            },
        );
    }

    /// メソッド・キー・有効期限・Content-Typeに対する署名を計算する。
    fn signature(
        &self,
        method: HttpMethod,
        key: &str,
        expires: i64,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| BackendError::Rejected(format!("署名鍵が不正です: {e}")))?;
        mac.update(format!("{method}\n{key}\n{expires}\n{content_type}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn presign(
        &self,
        method: HttpMethod,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        let expires = (Utc::now() + chrono::Duration::seconds(expiry.as_secs() as i64)).timestamp();
        let signature = self.signature(method, key.as_str(), expires, content_type.unwrap_or(""))?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Malformed("ベースURLにパスを追加できません".to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.as_str().split('/'));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("X-Objgate-Method", method.as_str());
            query.append_pair("X-Objgate-Expires", &expires.to_string());
            if let Some(ct) = content_type {
                query.append_pair("X-Objgate-Content-Type", ct);
            }
            query.append_pair("X-Objgate-Signature", &signature);
        }
        Ok(url.to_string())
    }

    #[cfg(not(test))]
    async fn injected_delete_failures(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    #[cfg(test)]
    async fn injected_delete_failures(&self) -> HashMap<String, String> {
        self.delete_failures.read().await.clone()
    }
}

#[cfg(test)]
impl MemoryStorage {
    /// 指定キーの削除を失敗させる。
    pub async fn fail_deletes_for(&self, key: &str, message: &str) {
        self.delete_failures
            .write()
            .await
            .insert(key.to_string(), message.to_string());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// 署名付きURLのクエリから署名を検証する。
    pub fn verify(&self, url: &str, method: HttpMethod, key: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let (Some(expires), Some(signature)) = (
            query.get("X-Objgate-Expires").and_then(|e| e.parse::<i64>().ok()),
            query.get("X-Objgate-Signature"),
        ) else {
            return false;
        };
        if query.get("X-Objgate-Method").map(String::as_str) != Some(method.as_str()) {
            return false;
        }
        let content_type = query
            .get("X-Objgate-Content-Type")
            .map(String::as_str)
            .unwrap_or("");
        expires > Utc::now().timestamp()
            && self
                .signature(method, key, expires, content_type)
                .map(|expected| &expected == signature)
                .unwrap_or(false)
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn sign_upload(
        &self,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.presign(HttpMethod::Put, key, content_type, expiry)
    }

    async fn sign_download(
        &self,
        key: &BackendKey,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.presign(HttpMethod::Get, key, None, expiry)
    }

    /// キー順に列挙する。継続トークンは前ページの最後のキー。
    async fn list_objects(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> Result<BackendListing, BackendError> {
        let objects = self.objects.read().await;
        let mut matching = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| marker.map_or(true, |m| key.as_str() > m));

        let page: Vec<BackendObject> = matching
            .by_ref()
            .take(limit)
            .map(|(key, obj)| BackendObject {
                key: key.clone(),
                size: obj.size,
                last_modified: obj.last_modified,
                etag: obj.etag.clone(),
            })
            .collect();
        let truncated = matching.next().is_some();

        Ok(BackendListing {
            next_marker: if truncated {
                page.last().map(|obj| obj.key.clone())
            } else {
                None
            },
            objects: page,
            truncated,
        })
    }

    /// 存在しないキーの削除は成功として扱う（S3と同じ）。
    async fn delete_objects(
        &self,
        keys: &[BackendKey],
    ) -> Result<Vec<DeleteResult>, BackendError> {
        let failures = self.injected_delete_failures().await;
        let mut objects = self.objects.write().await;

        Ok(keys
            .iter()
            .map(|key| match failures.get(key.as_str()) {
                Some(message) => DeleteResult::Failed {
                    key: key.to_string(),
                    message: message.clone(),
                },
                None => {
                    objects.remove(key.as_str());
                    DeleteResult::Deleted { key: key.to_string() }
                }
            })
            .collect())
    }
}
