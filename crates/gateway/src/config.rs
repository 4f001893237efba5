//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use objgate_core::{AuthorizationIssuer, CatalogProxy, StorageBackend, PRESIGN_EXPIRY};

/// ストレージバックエンドの種別（環境変数 `STORAGE_BACKEND`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// S3互換ストレージ（AWS S3, MinIO, Cloudflare R2等）
    S3,
    /// メモリ内ストレージ（ローカル開発・テスト用）
    Memory,
}

/// Gatewayの起動設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 待ち受けポート
    pub port: u16,
    pub storage: StorageKind,
    /// バケット名
    pub bucket_name: String,
    /// リージョン。未指定の場合はエンドポイントから推定する。
    pub region: Option<String>,
    /// S3互換エンドポイント（MinIO等）。未指定の場合はAWS S3を使用する。
    pub endpoint: Option<String>,
    /// クライアント向けエンドポイント（署名付きURL用）。
    /// 内部ホスト名と外部ホスト名が異なる場合に使用する。
    pub public_endpoint: Option<String>,
    /// アクセスキー。未指定の場合はAWSのデフォルト認証情報チェーンを使用する。
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// 署名付きURLの有効期限
    pub presign_expiry: Duration,
    /// メモリ内ストレージの署名用シークレット
    pub memory_signing_secret: String,
    /// メモリ内ストレージが発行するURLのベース
    pub memory_base_url: String,
    /// メモリ内ストレージに起動時に登録するオブジェクト
    pub memory_seed: Vec<SeedObject>,
}

/// 起動時にメモリ内ストレージへ登録するオブジェクト（`MEMORY_SEED`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedObject {
    pub tenant_id: String,
    pub object_key: String,
    pub size: u64,
}

/// `tenant:key:size` をカンマ区切りで並べた文字列を解釈する。キーには `:` を含めてよい。
fn parse_seed(value: &str) -> anyhow::Result<Vec<SeedObject>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (tenant_id, rest) = entry
                .split_once(':')
                .with_context(|| format!("MEMORY_SEEDの形式が不正です: {entry}"))?;
            let (object_key, size) = rest
                .rsplit_once(':')
                .with_context(|| format!("MEMORY_SEEDの形式が不正です: {entry}"))?;
            Ok(SeedObject {
                tenant_id: tenant_id.to_string(),
                object_key: object_key.to_string(),
                size: size
                    .parse()
                    .with_context(|| format!("MEMORY_SEEDのサイズが不正です: {entry}"))?,
            })
        })
        .collect()
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// 任意の参照関数から構築する。未設定の項目はデフォルト値を使用する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("PORTが不正です: {v}"))?,
            None => 8080,
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("s3") => StorageKind::S3,
            Some("memory") => StorageKind::Memory,
            Some(other) => anyhow::bail!("STORAGE_BACKENDが不正です: {other}（s3 または memory）"),
        };

        let presign_expiry = match lookup("PRESIGN_EXPIRY_SECS") {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("PRESIGN_EXPIRY_SECSが不正です: {v}"))?,
            ),
            None => PRESIGN_EXPIRY,
        };

        Ok(Self {
            port,
            storage,
            bucket_name: lookup("S3_BUCKET_NAME").unwrap_or_else(|| "objgate-dev".to_string()),
            region: lookup("AWS_REGION"),
            endpoint: lookup("S3_ENDPOINT"),
            public_endpoint: lookup("S3_PUBLIC_ENDPOINT"),
            access_key: lookup("S3_ACCESS_KEY"),
            secret_key: lookup("S3_SECRET_KEY"),
            presign_expiry,
            memory_signing_secret: lookup("MEMORY_SIGNING_SECRET")
                .unwrap_or_else(|| "objgate-dev-secret".to_string()),
            memory_base_url: lookup("MEMORY_BASE_URL")
                .unwrap_or_else(|| "http://localhost:9000".to_string()),
            memory_seed: lookup("MEMORY_SEED")
                .map(|v| parse_seed(&v))
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 署名付きURL発行
    pub issuer: AuthorizationIssuer,
    /// 一覧取得・削除
    pub catalog: CatalogProxy,
}

impl GatewayState {
    pub fn new(backend: Arc<dyn StorageBackend>, presign_expiry: Duration) -> Self {
        Self {
            issuer: AuthorizationIssuer::new(backend.clone()).with_expiry(presign_expiry),
            catalog: CatalogProxy::new(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<GatewayConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::S3);
        assert_eq!(config.bucket_name, "objgate-dev");
        assert_eq!(config.presign_expiry, Duration::from_secs(600));
        assert!(config.region.is_none());
        assert!(config.access_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "3000"),
            ("STORAGE_BACKEND", "memory"),
            ("S3_BUCKET_NAME", "tenant-objects"),
            ("AWS_REGION", "ap-northeast-1"),
            ("PRESIGN_EXPIRY_SECS", "120"),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.bucket_name, "tenant-objects");
        assert_eq!(config.region.as_deref(), Some("ap-northeast-1"));
        assert_eq!(config.presign_expiry, Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "gcs")]).is_err());
        assert!(config_from(&[("PRESIGN_EXPIRY_SECS", "-1")]).is_err());
        assert!(config_from(&[("MEMORY_SEED", "acme:file1.txt")]).is_err());
    }

    #[test]
    fn test_memory_seed() {
        let config =
            config_from(&[("MEMORY_SEED", "acme:file1.txt:1024, acme:a:b.txt:2048,")]).unwrap();
        assert_eq!(
            config.memory_seed,
            vec![
                SeedObject {
                    tenant_id: "acme".to_string(),
                    object_key: "file1.txt".to_string(),
                    size: 1024,
                },
                SeedObject {
                    tenant_id: "acme".to_string(),
                    object_key: "a:b.txt".to_string(),
                    size: 2048,
                },
            ]
        );
    }
}
