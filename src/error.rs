//! 页面翻译统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 翻译服务返回错误
    #[error("翻译服务错误: {0}")]
    ApiError(String),

    /// 响应条目数与请求不一致
    #[error("响应条目数不匹配: 期望 {expected} 条，实际 {actual} 条")]
    LengthMismatch { expected: usize, actual: usize },

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 语言状态存储错误
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 文本收集错误
    #[error("文本收集错误: {0}")]
    CollectionError(String),

    /// 并发操作错误
    #[error("并发操作错误: {0}")]
    ConcurrencyError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::ApiError(_) => true,
            TranslationError::ConcurrencyError(_) => true,
            TranslationError::LengthMismatch { .. } => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::StorageError(_) => false,
            TranslationError::CollectionError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::ApiError(_) => ErrorSeverity::Warning,
            TranslationError::LengthMismatch { .. } => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::StorageError(_) => ErrorSeverity::Error,
            TranslationError::CollectionError(_) => ErrorSeverity::Error,
            TranslationError::ConcurrencyError(_) => ErrorSeverity::Warning,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::ApiError(_) => ErrorCategory::Service,
            TranslationError::LengthMismatch { .. } => ErrorCategory::Service,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::StorageError(_) => ErrorCategory::Storage,
            TranslationError::CollectionError(_) => ErrorCategory::Collection,
            TranslationError::ConcurrencyError(_) => ErrorCategory::Concurrency,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let current_msg = self.to_string();
        let new_msg = format!("{} (上下文: {})", current_msg, context);

        match &mut self {
            TranslationError::ConfigError(ref mut msg) => *msg = new_msg,
            TranslationError::NetworkError(ref mut msg) => *msg = new_msg,
            TranslationError::ApiError(ref mut msg) => *msg = new_msg,
            TranslationError::SerializationError(ref mut msg) => *msg = new_msg,
            TranslationError::StorageError(ref mut msg) => *msg = new_msg,
            TranslationError::CollectionError(ref mut msg) => *msg = new_msg,
            TranslationError::ConcurrencyError(ref mut msg) => *msg = new_msg,
            TranslationError::LengthMismatch { .. } => {
                return TranslationError::ApiError(new_msg);
            }
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Serialization,
    Storage,
    Collection,
    Concurrency,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StorageError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::NetworkError(format!("请求超时: {}", error))
        } else if error.is_connect() {
            TranslationError::NetworkError(format!("连接失败: {}", error))
        } else {
            TranslationError::NetworkError(format!("请求失败: {}", error))
        }
    }
}

/// 翻译结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;
