//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。レスポンス本文は常に
//! `{"error": "<メッセージ>"}` 形式のJSON。
//! 500系ではバックエンドの詳細をログにのみ出力し、クライアントには返さない。

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use objgate_core::CoreError;
use objgate_types::ErrorResponse;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（JSONの形式不正、必須項目の欠落、キー検証失敗）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 署名付きURLの生成に失敗
    #[error("署名付きURLの生成に失敗: {0}")]
    Signing(String),
    /// ストレージ操作に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
}

impl GatewayError {
    /// クライアントに返すメッセージ。
    fn public_message(&self) -> String {
        match self {
            GatewayError::BadRequest(_) => self.to_string(),
            GatewayError::Signing(_) => "署名付きURLの生成に失敗しました".to_string(),
            GatewayError::Storage(_) => "ストレージ操作に失敗しました".to_string(),
        }
    }
}

impl From<CoreError> for GatewayError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => GatewayError::BadRequest(msg),
            CoreError::Signing(e) => GatewayError::Signing(e.to_string()),
            CoreError::Backend(e) => GatewayError::Storage(e.to_string()),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::BadRequest(rejection.body_text())
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Signing(_) | GatewayError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗");
        }
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
