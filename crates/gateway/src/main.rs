//! # objgate Gateway
//!
//! マルチテナント向けのオブジェクトストレージGateway。
//!
//! ## 役割
//! - テナント名前空間（`tenants/<tenant_id>/`）へのキーのマッピングと検証
//! - 1キー・1操作に限定した署名付きURLの発行
//! - テナント名前空間内の一覧取得・一括削除の中継
//!
//! オブジェクト本体はGatewayを経由せず、クライアントとストレージ間で直接転送される。
//! エンドポイント一覧は [`endpoints`] を参照。

mod config;
mod endpoints;
mod error;
mod storage;

use std::sync::Arc;

use crate::config::{GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let backend = storage::build_backend(&config).await?;
    let state = Arc::new(GatewayState::new(backend, config.presign_expiry));

    tracing::info!(
        storage = ?config.storage,
        bucket = %config.bucket_name,
        presign_expiry_secs = state.issuer.expiry().as_secs(),
        "Gateway設定を読み込みました"
    );

    let app = endpoints::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
