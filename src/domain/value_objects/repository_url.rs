use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// RepositoryURL関連のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryUrlError {
    #[error("Invalid repository URL: {0}")]
    InvalidFormat(String),

    #[error("Unsupported URL scheme for subversion: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Invalid characters in URL: {0}")]
    InvalidCharacters(String),
}

/// Subversionリポジトリの所在
///
/// `http`, `https`, `svn`, `svn+ssh`, `file` のURLか、
/// クライアントが直接読める絶対パスを受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryUrl {
    raw: String,
    scheme: Option<String>,
}

impl RepositoryUrl {
    /// 新しいRepositoryUrlインスタンスを作成
    pub fn new(url: &str) -> Result<Self, RepositoryUrlError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(RepositoryUrlError::InvalidFormat("Empty URL".to_string()));
        }

        if let Some(ch) = trimmed.chars().find(|ch| ch.is_control()) {
            return Err(RepositoryUrlError::InvalidCharacters(format!(
                "Control character detected: {:?}",
                ch
            )));
        }

        // ローカルの絶対パス
        if trimmed.starts_with('/') {
            return Ok(Self {
                raw: trimmed.to_string(),
                scheme: None,
            });
        }

        let parsed =
            Url::parse(trimmed).map_err(|_| RepositoryUrlError::InvalidFormat(url.to_string()))?;
        let scheme = parsed.scheme().to_string();

        if !matches!(
            scheme.as_str(),
            "http" | "https" | "svn" | "svn+ssh" | "file"
        ) {
            return Err(RepositoryUrlError::UnsupportedScheme(scheme));
        }

        if scheme != "file" && parsed.host_str().map_or(true, str::is_empty) {
            return Err(RepositoryUrlError::MissingHost(url.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme: Some(scheme),
        })
    }

    /// 元のURL文字列を取得
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// URLスキーム（ローカルパスの場合はNone）
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// `<url>@<peg>` 形式のペグリビジョン付きパス
    pub fn at_revision(&self, revision: impl fmt::Display) -> String {
        format!("{}@{}", self.raw, revision)
    }
}

impl TryFrom<String> for RepositoryUrl {
    type Error = RepositoryUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RepositoryUrl> for String {
    fn from(url: RepositoryUrl) -> Self {
        url.raw
    }
}

impl fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
