//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{TranslationError, TranslationResult};

/// 翻译引擎配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // 基础配置
    pub api_url: String,
    pub base_lang: String,

    // 批次配置
    pub chunk_size: usize,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,

    // 收集配置
    pub min_text_length: usize,

    // 语言状态存储位置
    pub language_file: String,
}

impl EngineConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            base_lang: constants::BASE_LANGUAGE.to_string(),

            chunk_size: constants::CHUNK_SIZE,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            min_text_length: constants::MIN_TEXT_LENGTH,

            language_file: constants::DEFAULT_LANGUAGE_FILE.to_string(),
        }
    }

    /// 创建指向指定后端的默认配置
    pub fn default_with_api_url(api_url: &str) -> Self {
        let mut config = Self::default();
        config.api_url = api_url.to_string();
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.chunk_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(TranslationError::ConfigError("最大并发数不能为0".to_string()));
        }

        if self.api_url.trim().is_empty() {
            return Err(TranslationError::ConfigError("API地址不能为空".to_string()));
        }

        if self.base_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("基准语言不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_url) = std::env::var("PAGETRANS_API_URL") {
            self.api_url = api_url;
        }

        if let Ok(base_lang) = std::env::var("PAGETRANS_BASE_LANG") {
            self.base_lang = base_lang;
        }

        if let Ok(value) = std::env::var("PAGETRANS_CHUNK_SIZE") {
            match value.parse::<usize>() {
                Ok(size) => self.chunk_size = size,
                Err(_) => tracing::warn!("PAGETRANS_CHUNK_SIZE 的值无效: {}", value),
            }
        }

        if let Ok(value) = std::env::var("PAGETRANS_MAX_CONCURRENT") {
            match value.parse::<usize>() {
                Ok(n) => self.max_concurrent_requests = n,
                Err(_) => tracing::warn!("PAGETRANS_MAX_CONCURRENT 的值无效: {}", value),
            }
        }

        if let Ok(value) = std::env::var("PAGETRANS_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!("PAGETRANS_TIMEOUT_SECS 的值无效: {}", value),
            }
        }

        if let Ok(path) = std::env::var("PAGETRANS_LANGUAGE_FILE") {
            self.language_file = path;
        }
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default()
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<EngineConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        // 尝试TOML格式
        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            // 尝试JSON格式
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env.development", ".env.production", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                if dotenv::from_filename(env_file).is_ok() {
                    tracing::info!("已加载环境变量文件: {}", env_file);
                    break;
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.base_lang, "en");
    }

    #[test]
    fn test_validation_rejects_zero_chunk_size() {
        let mut config = EngineConfig::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_api_url() {
        let mut config = EngineConfig::default();
        config.api_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        // 缺失的字段应回落到默认值
        let config: EngineConfig = toml::from_str("chunk_size = 10").expect("partial config");
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.api_url, constants::DEFAULT_API_URL);
        assert_eq!(config.min_text_length, constants::MIN_TEXT_LENGTH);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = EngineConfig::default_with_api_url("http://translate.internal/api/");
        let content = toml::to_string_pretty(&config).expect("serialize config");
        let parsed: EngineConfig = toml::from_str(&content).expect("parse config");
        assert_eq!(parsed.api_url, "http://translate.internal/api/");
        assert_eq!(parsed.chunk_size, config.chunk_size);
    }

    #[test]
    fn test_env_override_applies() {
        let mut config = EngineConfig::default();
        std::env::set_var("PAGETRANS_CHUNK_SIZE", "7");
        config.apply_env_overrides();
        std::env::remove_var("PAGETRANS_CHUNK_SIZE");
        assert_eq!(config.chunk_size, 7);
    }

    #[test]
    fn test_request_timeout_conversion() {
        let mut config = EngineConfig::default();
        config.request_timeout_secs = 5;
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_generate_example_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pagetrans.toml");
        let path_str = path.to_str().expect("utf8 path");

        ConfigManager::generate_example_config(path_str).expect("write example");
        let parsed = ConfigManager::load_from_file(path_str).expect("reload example");
        assert_eq!(parsed.chunk_size, constants::CHUNK_SIZE);
    }
}
