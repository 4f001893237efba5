//! # オブジェクトキー検証
//!
//! テナントから受け取ったオブジェクトキーを、名前空間へのマッピング前に検証する。
//!
//! ## 検証規則（順に適用）
//! 1. 空文字列は不可
//! 2. 先頭が `/` または `.` は不可
//! 3. 連続する `..` をどこかに含むものは不可（`a..b` も拒否する）
//! 4. 上記以外は可
//!
//! 規則3は実際のパストラバーサルでないキーも拒否するが、既存クライアントが
//! この拒否集合に依存しうるため緩和しない。

use std::fmt;

use crate::error::CoreError;

/// オブジェクトキーが検証規則を満たすか判定する。
pub fn validate(key: &str) -> bool {
    let bytes = key.as_bytes();
    match bytes.first() {
        None | Some(b'/') | Some(b'.') => return false,
        Some(_) => {}
    }
    !bytes.windows(2).any(|pair| pair == b"..")
}

/// 検証済みのオブジェクトキー。
///
/// `ObjectKey::parse` を通してのみ構築できるため、
/// この型の値は常に [`validate`] を満たす。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// キーを検証して `ObjectKey` を構築する。
    pub fn parse(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        if !validate(&key) {
            return Err(CoreError::Validation(format!("不正なオブジェクトキーです: {key}")));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
