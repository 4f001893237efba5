//! # テスト用共通ヘルパー
//!
//! issuer, catalogのテストで共有する、呼び出しを記録するモックバックエンド。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{BackendListing, BackendObject, DeleteResult, StorageBackend};
use crate::error::BackendError;
use crate::issuer::HttpMethod;
use crate::namespace::BackendKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCall {
    pub method: HttpMethod,
    pub key: String,
    pub content_type: Option<String>,
    pub expiry: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub prefix: String,
    pub limit: usize,
    pub marker: Option<String>,
}

/// ネットワーク接続なしで固定の結果を返し、受け取った引数を記録するモック。
#[derive(Default)]
pub struct MockBackend {
    objects: Vec<BackendObject>,
    continuation: Option<String>,
    delete_failures: HashMap<String, String>,
    sign_error: Option<BackendError>,
    unavailable: bool,
    sign_calls: Mutex<Vec<SignCall>>,
    list_calls: Mutex<Vec<ListCall>>,
    delete_calls: Mutex<Vec<Vec<String>>>,
}

impl MockBackend {
    pub fn with_objects(objects: Vec<BackendObject>) -> Self {
        Self {
            objects,
            ..Self::default()
        }
    }

    pub fn failing_signer(error: BackendError) -> Self {
        Self {
            sign_error: Some(error),
            ..Self::default()
        }
    }

    pub fn with_continuation(mut self, token: &str) -> Self {
        self.continuation = Some(token.to_string());
        self
    }

    pub fn fail_delete(mut self, backend_key: &str, message: &str) -> Self {
        self.delete_failures
            .insert(backend_key.to_string(), message.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn sign_calls(&self) -> Vec<SignCall> {
        self.sign_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().unwrap().clone()
    }

    fn record_sign(
        &self,
        method: HttpMethod,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.sign_calls.lock().unwrap().push(SignCall {
            method,
            key: key.to_string(),
            content_type: content_type.map(str::to_string),
            expiry,
        });
        match &self.sign_error {
            Some(e) => Err(e.clone()),
            None => Ok(format!("https://mock-storage/{key}?method={method}&sig=test")),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for MockBackend {
    async fn sign_upload(
        &self,
        key: &BackendKey,
        content_type: Option<&str>,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.record_sign(HttpMethod::Put, key, content_type, expiry)
    }

    async fn sign_download(
        &self,
        key: &BackendKey,
        expiry: Duration,
    ) -> Result<String, BackendError> {
        self.record_sign(HttpMethod::Get, key, None, expiry)
    }

    async fn list_objects(
        &self,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> Result<BackendListing, BackendError> {
        self.list_calls.lock().unwrap().push(ListCall {
            prefix: prefix.to_string(),
            limit,
            marker: marker.map(str::to_string),
        });
        if self.unavailable {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        Ok(BackendListing {
            objects: self.objects.clone(),
            next_marker: self.continuation.clone(),
            truncated: self.continuation.is_some(),
        })
    }

    async fn delete_objects(
        &self,
        keys: &[BackendKey],
    ) -> Result<Vec<DeleteResult>, BackendError> {
        self.delete_calls
            .lock()
            .unwrap()
            .push(keys.iter().map(|k| k.to_string()).collect());
        if self.unavailable {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        Ok(keys
            .iter()
            .map(|k| match self.delete_failures.get(k.as_str()) {
                Some(message) => DeleteResult::Failed {
                    key: k.to_string(),
                    message: message.clone(),
                },
                None => DeleteResult::Deleted { key: k.to_string() },
            })
            .collect())
    }
}
