use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeofenceError {
    InvalidAddress(String),
    InvalidConfiguration(String),
    Provider(String),
    Cache(String),
}

impl GeofenceError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeofenceError::InvalidAddress(_) => "E001",
            GeofenceError::InvalidConfiguration(_) => "E002",
            GeofenceError::Provider(_) => "E003",
            GeofenceError::Cache(_) => "E004",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeofenceError::InvalidAddress(_) => "Invalid Address",
            GeofenceError::InvalidConfiguration(_) => "Invalid Configuration",
            GeofenceError::Provider(_) => "Provider Error",
            GeofenceError::Cache(_) => "Cache Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeofenceError::InvalidAddress(msg) => msg,
            GeofenceError::InvalidConfiguration(msg) => msg,
            GeofenceError::Provider(msg) => msg,
            GeofenceError::Cache(msg) => msg,
        }
    }

    /// 调用方修正输入后可重试的错误
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GeofenceError::InvalidAddress(_))
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    #[cfg(feature = "cli")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeofenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeofenceError {}

// 便捷的构造函数
impl GeofenceError {
    pub fn invalid_address<T: Into<String>>(msg: T) -> Self {
        GeofenceError::InvalidAddress(msg.into())
    }

    pub fn invalid_configuration<T: Into<String>>(msg: T) -> Self {
        GeofenceError::InvalidConfiguration(msg.into())
    }

    pub fn provider<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Provider(msg.into())
    }

    pub fn cache<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Cache(msg.into())
    }
}

impl From<redis::RedisError> for GeofenceError {
    fn from(err: redis::RedisError) -> Self {
        GeofenceError::Cache(err.to_string())
    }
}

impl From<ureq::Error> for GeofenceError {
    fn from(err: ureq::Error) -> Self {
        GeofenceError::Provider(err.to_string())
    }
}

impl From<config::ConfigError> for GeofenceError {
    fn from(err: config::ConfigError) -> Self {
        GeofenceError::InvalidConfiguration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeofenceError>;
