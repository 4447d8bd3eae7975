use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::common::fallback::{first_present, first_present_or};
use crate::domain::value_objects::{ClientSide, RepositoryUrl, RevisionSpec};

/// Default svn client name when no override is configured
pub const DEFAULT_CLIENT: &str = "svn";

/// Default checkout operation alias
pub const DEFAULT_CHECKOUT_ALIAS: &str = "checkout";

/// Default temp directory on both sides of a relay transfer
pub const DEFAULT_TMPDIR: &str = "/tmp";

fn default_checkout_alias() -> String {
    DEFAULT_CHECKOUT_ALIAS.to_string()
}

/// リポジトリへのアクセス設定
///
/// 1回の実行中は不変。全コンポーネントに参照で渡される。
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// リモートホストから見たリポジトリURL
    pub repository: RepositoryUrl,

    /// ローカルから見たリポジトリURL（未指定なら `repository` と同じ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_repository: Option<RepositoryUrl>,

    /// 両側共通のsvnクライアントパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub svn: Option<String>,

    /// ローカル側のsvnクライアントパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub local_svn: Option<String>,

    /// リモート側のsvnクライアントパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub remote_svn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub username: Option<String>,

    /// 汎用パスワード（ログイン用と共通）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// svn専用パスワード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svn_password: Option<String>,

    /// 汎用の鍵パスフレーズ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,

    /// svn専用の鍵パスフレーズ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svn_passphrase: Option<String>,

    /// チェックアウト操作のエイリアス（`checkout`, `co`, `export` など）
    #[serde(default = "default_checkout_alias")]
    #[validate(length(min = 1))]
    pub checkout: String,

    /// デプロイ対象リビジョン（未指定なら最新）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<RevisionSpec>,

    /// リモートホストからリポジトリへ到達できない場合はtrue
    #[serde(default)]
    pub repository_unreachable_from_remote: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpdir_local: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub tmpdir_remote: Option<String>,
}

impl RepositoryConfig {
    /// 最小構成の設定を作成
    pub fn new(repository: RepositoryUrl) -> Self {
        Self {
            repository,
            local_repository: None,
            svn: None,
            local_svn: None,
            remote_svn: None,
            username: None,
            password: None,
            svn_password: None,
            passphrase: None,
            svn_passphrase: None,
            checkout: default_checkout_alias(),
            revision: None,
            repository_unreachable_from_remote: false,
            tmpdir_local: None,
            tmpdir_remote: None,
        }
    }

    pub fn with_local_repository(mut self, url: RepositoryUrl) -> Self {
        self.local_repository = Some(url);
        self
    }

    pub fn with_svn(mut self, path: impl Into<String>) -> Self {
        self.svn = Some(path.into());
        self
    }

    pub fn with_local_svn(mut self, path: impl Into<String>) -> Self {
        self.local_svn = Some(path.into());
        self
    }

    pub fn with_remote_svn(mut self, path: impl Into<String>) -> Self {
        self.remote_svn = Some(path.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_svn_password(mut self, password: impl Into<String>) -> Self {
        self.svn_password = Some(password.into());
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn with_svn_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.svn_passphrase = Some(passphrase.into());
        self
    }

    pub fn with_checkout_alias(mut self, alias: impl Into<String>) -> Self {
        self.checkout = alias.into();
        self
    }

    pub fn with_revision(mut self, revision: RevisionSpec) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_relay_only(mut self, relay_only: bool) -> Self {
        self.repository_unreachable_from_remote = relay_only;
        self
    }

    pub fn with_tmpdir_local(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmpdir_local = Some(dir.into());
        self
    }

    pub fn with_tmpdir_remote(mut self, dir: impl Into<String>) -> Self {
        self.tmpdir_remote = Some(dir.into());
        self
    }

    /// URL used by the local client (log, diff, relay export)
    pub fn local_repository(&self) -> &RepositoryUrl {
        self.local_repository.as_ref().unwrap_or(&self.repository)
    }

    /// Client executable for the given side: side override, then `svn`, then the default name
    pub fn client_path(&self, side: ClientSide) -> &str {
        let side_override = match side {
            ClientSide::Local => self.local_svn.as_deref(),
            ClientSide::Remote => self.remote_svn.as_deref(),
        };
        first_present_or(&[side_override, self.svn.as_deref()], DEFAULT_CLIENT)
    }

    /// Username passed with `--username`; an empty value counts as unset
    pub fn svn_username(&self) -> Option<&str> {
        first_present(&[self.username.as_deref()])
    }

    /// Password sent to svn prompts: `svn_password`, then `password`
    pub fn svn_password(&self) -> Option<&str> {
        first_present(&[self.svn_password.as_deref(), self.password.as_deref()])
    }

    /// Passphrase sent to key prompts: `svn_passphrase`, then `passphrase`, then the svn password
    pub fn svn_passphrase(&self) -> Option<&str> {
        first_present(&[
            self.svn_passphrase.as_deref(),
            self.passphrase.as_deref(),
            self.svn_password(),
        ])
    }

    pub fn checkout_alias(&self) -> &str {
        first_present_or(&[Some(self.checkout.as_str())], DEFAULT_CHECKOUT_ALIAS)
    }

    pub fn is_relay_only(&self) -> bool {
        self.repository_unreachable_from_remote
    }

    pub fn tmpdir_local(&self) -> &Path {
        self.tmpdir_local
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_TMPDIR))
    }

    pub fn tmpdir_remote(&self) -> &str {
        first_present_or(&[self.tmpdir_remote.as_deref()], DEFAULT_TMPDIR)
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("repository", &self.repository)
            .field("local_repository", &self.local_repository)
            .field("svn", &self.svn)
            .field("local_svn", &self.local_svn)
            .field("remote_svn", &self.remote_svn)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("svn_password", &redact(&self.svn_password))
            .field("passphrase", &redact(&self.passphrase))
            .field("svn_passphrase", &redact(&self.svn_passphrase))
            .field("checkout", &self.checkout)
            .field("revision", &self.revision)
            .field(
                "repository_unreachable_from_remote",
                &self.repository_unreachable_from_remote,
            )
            .field("tmpdir_local", &self.tmpdir_local)
            .field("tmpdir_remote", &self.tmpdir_remote)
            .finish()
    }
}
