//! 语言选择的持久化存储
//!
//! 对应浏览器端的持久化键值存储：固定键 `siteLanguage` 映射到语言码，
//! 每次切换语言时写入，启动时读取一次。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::{constants, EngineConfig};
use crate::error::{TranslationError, TranslationResult};

/// 语言状态存储接口
pub trait LanguageStore {
    /// 读取已保存的语言码，从未保存过时返回 None
    fn load(&self) -> TranslationResult<Option<String>>;

    /// 保存语言码，覆盖旧值
    fn save(&self, code: &str) -> TranslationResult<()>;
}

/// 存储文件的内容结构
#[derive(Debug, Serialize, Deserialize)]
struct StoredLanguage {
    #[serde(rename = "siteLanguage")]
    site_language: String,
    #[serde(default)]
    updated_at: Option<String>,
}

/// 基于 TOML 文件的语言存储
pub struct FileLanguageStore {
    path: PathBuf,
}

impl FileLanguageStore {
    /// 使用指定文件路径创建存储
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// 按配置中的路径创建存储，支持波浪号展开
    pub fn from_config(config: &EngineConfig) -> Self {
        let expanded = shellexpand::tilde(&config.language_file);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }

    /// 存储文件路径
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl LanguageStore for FileLanguageStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let stored: StoredLanguage = toml::from_str(&content)
            .map_err(|e| TranslationError::StorageError(format!("解析语言存储失败: {}", e)))?;

        Ok(Some(stored.site_language))
    }

    fn save(&self, code: &str) -> TranslationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let stored = StoredLanguage {
            site_language: code.to_string(),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
        };

        let content = toml::to_string_pretty(&stored)
            .map_err(|e| TranslationError::StorageError(format!("序列化语言存储失败: {}", e)))?;
        std::fs::write(&self.path, content)?;

        tracing::debug!("语言选择已保存: {} -> {}", code, self.path.display());
        Ok(())
    }
}

/// 内存语言存储，用于测试和无持久化环境
#[derive(Debug, Default)]
pub struct MemoryLanguageStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建已保存某个语言的存储
    pub fn with_language(code: &str) -> Self {
        let store = Self::new();
        let mut values = store
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(constants::STORAGE_KEY.to_string(), code.to_string());
        drop(values);
        store
    }
}

impl LanguageStore for MemoryLanguageStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| TranslationError::ConcurrencyError("语言存储锁不可用".to_string()))?;
        Ok(values.get(constants::STORAGE_KEY).cloned())
    }

    fn save(&self, code: &str) -> TranslationResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| TranslationError::ConcurrencyError("语言存储锁不可用".to_string()))?;
        values.insert(constants::STORAGE_KEY.to_string(), code.to_string());
        Ok(())
    }
}
