//! # ストレージバックエンド実装
//!
//! `objgate_core::StorageBackend` の実装群。環境変数 `STORAGE_BACKEND` で切り替える。
//!
//! - `s3`: S3互換ストレージ（feature `vendor-aws`）
//! - `memory`: ローカル開発・テスト用のメモリ内実装

pub mod memory;
#[cfg(feature = "vendor-aws")]
pub mod s3;

use std::sync::Arc;

use objgate_core::{to_backend_key, ObjectKey, StorageBackend, TenantId};

use crate::config::{GatewayConfig, StorageKind};

pub use self::memory::MemoryStorage;
#[cfg(feature = "vendor-aws")]
pub use self::s3::S3Storage;

/// 設定に従ってストレージバックエンドを構築する。
pub async fn build_backend(config: &GatewayConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage {
        StorageKind::S3 => build_s3(config),
        StorageKind::Memory => {
            tracing::warn!("メモリ内ストレージで起動します（開発環境用、再起動で内容は消えます）");
            Ok(Arc::new(build_memory(config).await?))
        }
    }
}

/// メモリ内ストレージを構築し、`MEMORY_SEED` のオブジェクトを登録する。
async fn build_memory(config: &GatewayConfig) -> anyhow::Result<MemoryStorage> {
    let storage = MemoryStorage::new(
        &config.bucket_name,
        &config.memory_base_url,
        config.memory_signing_secret.as_bytes(),
    )?;

    for seed in &config.memory_seed {
        let tenant = TenantId::parse(seed.tenant_id.as_str())?;
        let key = ObjectKey::parse(seed.object_key.as_str())?;
        storage
            .put_object(to_backend_key(&tenant, &key).as_str(), seed.size)
            .await;
    }
    if !config.memory_seed.is_empty() {
        tracing::info!(count = config.memory_seed.len(), "メモリ内ストレージにオブジェクトを登録");
    }

    Ok(storage)
}

#[cfg(feature = "vendor-aws")]
fn build_s3(config: &GatewayConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    Ok(Arc::new(S3Storage::from_config(config)?))
}

#[cfg(not(feature = "vendor-aws"))]
fn build_s3(_config: &GatewayConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    anyhow::bail!("S3バックエンドは無効です（feature `vendor-aws` を有効にしてビルドしてください）")
}
