//! Error types for the admin update path
//!
//! Two families live here:
//! - [`Error`]: infrastructure failures (store I/O, reconciliation queue,
//!   settings validation).
//! - [`Rejection`]: an update that was refused. Rejections are returned to
//!   the operator verbatim, localized through [`Rejection::message`].

use thiserror::Error;

use crate::locale::Lang;

/// Result type alias for admin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the admin update path
#[derive(Error, Debug)]
pub enum Error {
    /// Config store errors (load or save)
    #[error("Config store error: {0}")]
    Store(String),

    /// Reconciliation queue or job errors
    #[error("Reconciliation error: {0}")]
    Reconcile(String),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An update refused by policy
    #[error("Update rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a reconciliation error
    pub fn reconcile(msg: impl Into<String>) -> Self {
        Self::Reconcile(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Why an update was refused
///
/// Every variant except [`Rejection::Store`] is a policy decision taken
/// before anything is written. `Store` carries the store's own message
/// and is produced after validation passed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The payload could not be decoded into the update shape
    #[error("payload could not be parsed")]
    MalformedPayload,

    /// First-time setup from a public origin after the trust window
    #[error(
        "public first-time setup is only allowed within {window_minutes} minutes of service start"
    )]
    PublicFirstTimeSetup {
        /// Trust window length in minutes
        window_minutes: u64,
    },

    /// First credentials set after the trust window
    #[error(
        "credentials can only be set for the first time within {window_minutes} minutes of service start; restart the service"
    )]
    LateCredentials {
        /// Trust window length in minutes
        window_minutes: u64,
    },

    /// Wan access enabled without a username and password
    #[error("public access requires both a username and password")]
    WanCredentialsRequired,

    /// Password entropy below the applicable threshold
    #[error("password too weak")]
    WeakPassword,

    /// A command-based address source changed while no credentials are set
    #[error("changing a command-based address source requires credentials to be set first")]
    CommandChangeNeedsCredentials,

    /// Config store failure
    #[error("{0}")]
    Store(String),
}

impl Rejection {
    /// Operator-facing message in the given language
    pub fn message(&self, lang: Lang) -> String {
        match (self, lang) {
            (Self::MalformedPayload, Lang::En) => {
                "Failed to parse the submitted data, please refresh the page and try again"
                    .to_string()
            }
            (Self::MalformedPayload, Lang::Zh) => "数据解析失败, 请刷新页面重试".to_string(),
            (Self::PublicFirstTimeSetup { window_minutes }, Lang::En) => format!(
                "When accessed over a public network, first-time setup is only allowed within {window_minutes} minutes of service start"
            ),
            (Self::PublicFirstTimeSetup { window_minutes }, Lang::Zh) => {
                format!("若通过公网访问, 仅允许在服务启动后 {window_minutes} 分钟内完成首次配置")
            }
            (Self::LateCredentials { window_minutes }, Lang::En) => format!(
                "If no username/password has ever been set, it may only be set within {window_minutes} minutes of service start. Please restart the service"
            ),
            (Self::LateCredentials { window_minutes }, Lang::Zh) => format!(
                "若从未设置过帐号密码, 仅允许在服务启动后 {window_minutes} 分钟内设置, 请重启服务"
            ),
            (Self::WanCredentialsRequired, Lang::En) => {
                "Public network access is enabled, a login username and password are required"
                    .to_string()
            }
            (Self::WanCredentialsRequired, Lang::Zh) => {
                "启用外网访问, 必须输入登录用户名/密码".to_string()
            }
            (Self::WeakPassword, Lang::En) => {
                "Password is not secure! Try using a longer password".to_string()
            }
            (Self::WeakPassword, Lang::Zh) => "密码不安全！尝试使用更长的密码".to_string(),
            (Self::CommandChangeNeedsCredentials, Lang::En) => {
                "Changing 'get address by command' requires a username and password, please set them first"
                    .to_string()
            }
            (Self::CommandChangeNeedsCredentials, Lang::Zh) => {
                "修改 '通过命令获取' 必须设置帐号密码，请先设置帐号密码".to_string()
            }
            (Self::Store(msg), _) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_rejection_is_verbatim_in_every_language() {
        let rejection = Rejection::Store("disk full".to_string());
        assert_eq!(rejection.message(Lang::En), "disk full");
        assert_eq!(rejection.message(Lang::Zh), "disk full");
    }

    #[test]
    fn window_length_is_rendered() {
        let rejection = Rejection::PublicFirstTimeSetup { window_minutes: 5 };
        assert!(rejection.message(Lang::En).contains("5 minutes"));
        assert!(rejection.message(Lang::Zh).contains("5 分钟"));
    }

    #[test]
    fn rejection_converts_into_error() {
        let err: Error = Rejection::WeakPassword.into();
        assert!(matches!(err, Error::Rejected(Rejection::WeakPassword)));
        assert_eq!(err.to_string(), "Update rejected: password too weak");
    }
}
