//! # テナント名前空間マッピング
//!
//! テナントから見たキーとバックエンド上の完全修飾キーを相互変換する。
//! バックエンドキーは常に `tenants/<TenantID>/<ObjectKey>` の形式。

use std::fmt;

use crate::error::CoreError;
use crate::key::ObjectKey;

/// 全テナントの名前空間の共通プレフィックス
const TENANTS_ROOT: &str = "tenants/";

/// テナントID。
///
/// テナント自体の認証は上位層の責務であり、ここでは名前空間の分割キーとしてのみ扱う。
/// 空文字列と `/` を含むIDは拒否する（`acme` と `acme/x` の名前空間が重ならないように）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::Validation("tenant_id は必須です".to_string()));
        }
        if id.contains('/') {
            return Err(CoreError::Validation(format!(
                "tenant_id に '/' は使用できません: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// バックエンド上の完全修飾キー。
///
/// [`to_backend_key`] でのみ構築されるため、必ずいずれか1テナントの名前空間に属する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendKey(String);

impl BackendKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BackendKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// テナントの名前空間ルート（`tenants/<TenantID>/`）を返す。
pub fn tenant_root(tenant: &TenantId) -> String {
    format!("{TENANTS_ROOT}{tenant}/")
}

/// テナントキーをバックエンドキーに変換する。
///
/// 検証は行わない。`ObjectKey` を要求することで検証済みであることを保証する。
pub fn to_backend_key(tenant: &TenantId, key: &ObjectKey) -> BackendKey {
    BackendKey(format!("{}{}", tenant_root(tenant), key))
}

/// 一覧取得用のバックエンドプレフィックスを返す。
///
/// S3のプレフィックス一致は文字列の前方一致であり、結果は常にテナントルートで始まる。
pub fn to_backend_prefix(tenant: &TenantId, prefix: &str) -> String {
    format!("{}{}", tenant_root(tenant), prefix)
}

/// バックエンドキーからテナントの名前空間プレフィックスを取り除く。
///
/// プレフィックスが一致しない、またはキーがプレフィックスと同じ長さ以下の場合は
/// 入力をそのまま返す（エラーにはしない）。
pub fn to_tenant_key(tenant: &TenantId, backend_key: &str) -> String {
    let root = tenant_root(tenant);
    match backend_key.strip_prefix(root.as_str()) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => backend_key.to_string(),
    }
}

/// バックエンドキーがテナントの名前空間に属するか。
pub fn is_within_namespace(tenant: &TenantId, backend_key: &str) -> bool {
    let root = tenant_root(tenant);
    backend_key.len() > root.len() && backend_key.starts_with(&root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::parse(id).unwrap()
    }

    #[test]
    fn test_backend_key_format() {
        let key = ObjectKey::parse("report.pdf").unwrap();
        let backend = to_backend_key(&tenant("acme"), &key);
        assert_eq!(backend.as_str(), "tenants/acme/report.pdf");
        assert!(backend.as_str().starts_with(&tenant_root(&tenant("acme"))));
    }

    #[test]
    fn test_roundtrip() {
        let t = tenant("acme");
        for k in ["a", "photos/cat.jpg", "tenants/acme/x", "dir/"] {
            let key = ObjectKey::parse(k).unwrap();
            let backend = to_backend_key(&t, &key);
            assert_eq!(to_tenant_key(&t, backend.as_str()), k);
        }
    }

    #[test]
    fn test_foreign_key_passes_through() {
        let t = tenant("acme");
        assert_eq!(to_tenant_key(&t, "tenants/other/a.txt"), "tenants/other/a.txt");
        assert_eq!(to_tenant_key(&t, "tenants/acme/"), "tenants/acme/");
        assert_eq!(to_tenant_key(&t, "a.txt"), "a.txt");
        // 長さだけでなくプレフィックスの一致を確認する
        assert_eq!(to_tenant_key(&t, "tenants/acmex/a.txt"), "tenants/acmex/a.txt");
        assert!(!is_within_namespace(&t, "tenants/acmex/a.txt"));
        assert!(is_within_namespace(&t, "tenants/acme/a.txt"));
    }

    #[test]
    fn test_backend_prefix() {
        let t = tenant("acme");
        assert_eq!(to_backend_prefix(&t, "photos/"), "tenants/acme/photos/");
        assert_eq!(to_backend_prefix(&t, ""), "tenants/acme/");
    }

    #[test]
    fn test_tenant_id_rules() {
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("acme/x").is_err());
        assert!(TenantId::parse("acme-01").is_ok());
    }
}
