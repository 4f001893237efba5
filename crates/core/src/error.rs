//! # Core エラー型
//!
//! キー検証・署名発行・カタログ操作で共通のエラー型。
//! HTTPステータスへの変換はGateway側（`GatewayError`）で行う。

/// ストレージバックエンドが返すエラー。
///
/// バックエンド実装（S3互換、メモリ内）はこの型に変換して返す。
/// メッセージは内部ログ用であり、クライアントにはそのまま返さない。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// 接続失敗・タイムアウト等でリクエストを送信できなかった
    #[error("ストレージに接続できません: {0}")]
    Unavailable(String),
    /// バックエンドがリクエストを拒否した（認証情報不正、権限不足等）
    #[error("ストレージがリクエストを拒否しました: {0}")]
    Rejected(String),
    /// バックエンドのレスポンスを解釈できなかった
    #[error("ストレージのレスポンスが不正です: {0}")]
    Malformed(String),
}

/// Coreモジュールのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// テナントIDまたはオブジェクトキーが検証規則に違反している。
    /// バックエンドには一切送信されない。
    #[error("{0}")]
    Validation(String),
    /// 署名付きURLを生成できなかった
    #[error("署名付きURLの生成に失敗しました: {0}")]
    Signing(#[source] BackendError),
    /// 一覧取得・削除のバックエンド呼び出し自体が失敗した
    #[error("ストレージ操作に失敗しました: {0}")]
    Backend(#[source] BackendError),
}

impl CoreError {
    /// 呼び出し側（クライアント）の入力に起因するエラーか。
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}
