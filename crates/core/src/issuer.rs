//! # 署名付きURL発行
//!
//! 1つのバックエンドキーに対する1つの操作（PUTまたはGET）のみを許可する、
//! 有効期限付きの署名付きURLを発行する。
//!
//! 「どのキーに触れてよいか」（名前空間マッピング）と「どう証明を作るか」
//! （`StorageBackend` の署名）を分離している。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::backend::StorageBackend;
use crate::error::CoreError;
use crate::key::ObjectKey;
use crate::namespace::{to_backend_key, TenantId};

/// 署名付きURLのデフォルト有効期限（10分）
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(10 * 60);

/// 有効期限の上限（S3の署名付きURLの上限と同じ7日）
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// 署名付きURLが許可するHTTPメソッド。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Put,
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Put => "PUT",
            HttpMethod::Get => "GET",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 発行された署名付きURLと、その利用条件。
///
/// リクエストごとに生成し、永続化・再利用はしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDescriptor {
    /// 署名付きURL
    pub url: String,
    /// 許可されたメソッド（1つのみ）
    pub method: HttpMethod,
    /// 利用時に付与が必須のヘッダー
    pub headers: BTreeMap<String, String>,
    /// 有効期限
    pub expires_at: DateTime<Utc>,
}

/// 署名付きURLの発行者。
pub struct AuthorizationIssuer {
    backend: Arc<dyn StorageBackend>,
    expiry: Duration,
}

impl AuthorizationIssuer {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            expiry: PRESIGN_EXPIRY,
        }
    }

    /// 有効期限を変更する。1秒未満は1秒に、上限超過は [`MAX_PRESIGN_EXPIRY`] に丸める。
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Duration::from_secs(
            expiry
                .as_secs()
                .clamp(1, MAX_PRESIGN_EXPIRY.as_secs()),
        );
        self
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// アップロード用（PUT）の署名付きURLを発行する。
    ///
    /// `content_type` が空でなければ `Content-Type` ヘッダーを必須条件として含める。
    /// `max_size` は受理するが、現状この層では強制しない。
    pub async fn issue_upload(
        &self,
        tenant: &TenantId,
        key: &ObjectKey,
        content_type: Option<&str>,
        max_size: Option<u64>,
    ) -> Result<AuthorizationDescriptor, CoreError> {
        let backend_key = to_backend_key(tenant, key);
        let content_type = content_type.filter(|ct| !ct.is_empty());
        if let Some(ct) = content_type {
            if ct.chars().any(char::is_control) {
                return Err(CoreError::Validation(
                    "content_type に制御文字は使用できません".to_string(),
                ));
            }
        }

        // 署名前の時刻を基準にし、返却する有効期限がURLの実際の期限を超えないようにする
        let issued_at = Utc::now();
        let url = self
            .backend
            .sign_upload(&backend_key, content_type, self.expiry)
            .await
            .map_err(CoreError::Signing)?;

        let mut headers = BTreeMap::new();
        if let Some(ct) = content_type {
            headers.insert("Content-Type".to_string(), ct.to_string());
        }

        tracing::info!(
            tenant_id = %tenant,
            backend_key = %backend_key,
            content_type = content_type.unwrap_or(""),
            max_size = ?max_size,
            "アップロード用署名付きURLを発行"
        );

        Ok(AuthorizationDescriptor {
            url,
            method: HttpMethod::Put,
            headers,
            expires_at: self.expires_at(issued_at),
        })
    }

    /// ダウンロード用（GET）の署名付きURLを発行する。
    pub async fn issue_download(
        &self,
        tenant: &TenantId,
        key: &ObjectKey,
    ) -> Result<AuthorizationDescriptor, CoreError> {
        let backend_key = to_backend_key(tenant, key);

        let issued_at = Utc::now();
        let url = self
            .backend
            .sign_download(&backend_key, self.expiry)
            .await
            .map_err(CoreError::Signing)?;

        tracing::info!(
            tenant_id = %tenant,
            backend_key = %backend_key,
            "ダウンロード用署名付きURLを発行"
        );

        Ok(AuthorizationDescriptor {
            url,
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            expires_at: self.expires_at(issued_at),
        })
    }

    fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        // with_expiryで上限を丸めているためオーバーフローしない
        issued_at + chrono::Duration::seconds(self.expiry.as_secs() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::test_helpers::{MockBackend, SignCall};

    fn acme() -> TenantId {
        TenantId::parse("acme").unwrap()
    }

    #[tokio::test]
    async fn test_issue_upload_scopes_to_tenant_key() {
        let backend = Arc::new(MockBackend::default());
        let issuer = AuthorizationIssuer::new(backend.clone());

        let before = Utc::now();
        let desc = issuer
            .issue_upload(
                &acme(),
                &ObjectKey::parse("report.pdf").unwrap(),
                Some("application/pdf"),
                None,
            )
            .await
            .unwrap();
        let after = Utc::now();

        assert_eq!(desc.method, HttpMethod::Put);
        assert!(desc.url.contains("tenants/acme/report.pdf"));
        assert_eq!(
            desc.headers.get("Content-Type").map(String::as_str),
            Some("application/pdf")
        );

        let window = chrono::Duration::seconds(600);
        assert!(desc.expires_at >= before + window - chrono::Duration::seconds(1));
        assert!(desc.expires_at <= after + window);

        let calls = backend.sign_calls();
        assert_eq!(
            calls,
            vec![SignCall {
                method: HttpMethod::Put,
                key: "tenants/acme/report.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                expiry: PRESIGN_EXPIRY,
            }]
        );
    }

    #[tokio::test]
    async fn test_issue_upload_without_content_type() {
        let backend = Arc::new(MockBackend::default());
        let issuer = AuthorizationIssuer::new(backend.clone());

        let desc = issuer
            .issue_upload(&acme(), &ObjectKey::parse("a.bin").unwrap(), Some(""), Some(1024))
            .await
            .unwrap();

        assert!(desc.headers.is_empty());
        assert_eq!(backend.sign_calls()[0].content_type, None);
    }

    #[tokio::test]
    async fn test_rejects_control_chars_in_content_type() {
        let backend = Arc::new(MockBackend::default());
        let issuer = AuthorizationIssuer::new(backend.clone());

        let err = issuer
            .issue_upload(
                &acme(),
                &ObjectKey::parse("a.txt").unwrap(),
                Some("text/plain\r\nX-Injected: 1"),
                None,
            )
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(backend.sign_calls().is_empty());
    }

    #[tokio::test]
    async fn test_issue_download() {
        let backend = Arc::new(MockBackend::default());
        let issuer = AuthorizationIssuer::new(backend.clone());

        let desc = issuer
            .issue_download(&acme(), &ObjectKey::parse("photos/cat.jpg").unwrap())
            .await
            .unwrap();

        assert_eq!(desc.method, HttpMethod::Get);
        assert!(desc.headers.is_empty());
        assert!(desc.expires_at > Utc::now());
        let calls = backend.sign_calls();
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[0].key, "tenants/acme/photos/cat.jpg");
    }

    #[tokio::test]
    async fn test_signing_failure_is_not_retried() {
        let backend = Arc::new(MockBackend::failing_signer(BackendError::Rejected(
            "InvalidAccessKeyId".to_string(),
        )));
        let issuer = AuthorizationIssuer::new(backend.clone());

        let err = issuer
            .issue_download(&acme(), &ObjectKey::parse("a.txt").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Signing(BackendError::Rejected(_))));
        assert_eq!(backend.sign_calls().len(), 1);
    }

    #[test]
    fn test_expiry_is_clamped() {
        let backend = Arc::new(MockBackend::default());
        let issuer = AuthorizationIssuer::new(backend.clone()).with_expiry(Duration::ZERO);
        assert_eq!(issuer.expiry(), Duration::from_secs(1));

        let issuer = AuthorizationIssuer::new(backend)
            .with_expiry(Duration::from_secs(30 * 24 * 60 * 60));
        assert_eq!(issuer.expiry(), MAX_PRESIGN_EXPIRY);
    }
}
