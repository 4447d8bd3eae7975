use crate::common::error::DeployError;

/// svndeploy全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use svndeploy::common::result::DeployResult;
/// use svndeploy::common::error::DeployError;
///
/// fn example_function() -> DeployResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> DeployResult<()> {
///     Err(DeployError::internal_error("Something went wrong"))
/// }
/// ```
pub type DeployResult<T> = Result<T, DeployError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// Noneをリビジョン解決エラーに変換する
    ///
    /// # Examples
    ///
    /// ```
    /// use svndeploy::common::result::{DeployResult, OptionExt};
    ///
    /// let none_value: Option<u64> = None;
    /// let result: DeployResult<u64> = none_value.ok_or_resolution("no revision");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_resolution(self, message: impl Into<String>) -> DeployResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_resolution(self, message: impl Into<String>) -> DeployResult<T> {
        self.ok_or_else(|| DeployError::resolution(message))
    }
}

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// リレー転送の特定ステップの失敗として変換
    ///
    /// # Arguments
    ///
    /// * `host` - 転送先ホスト
    /// * `step` - 失敗したステップ名
    fn with_transfer_step(self, host: &str, step: &str) -> DeployResult<T>
    where
        E: std::error::Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_transfer_step(self, host: &str, step: &str) -> DeployResult<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.map_err(|e| DeployError::transfer_with_source(host, step, e.to_string(), e))
    }
}
