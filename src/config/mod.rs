//! 翻译引擎配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, EngineConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const CHUNK_SIZE: usize = 50;
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/translate/batch/";

    // 基准语言（页面原始标记语言）
    pub const BASE_LANGUAGE: &str = "en";

    // 可收集的标签类别：标题、段落、行内文本、链接、按钮、标签、列表和表格单元格
    pub const TRANSLATABLE_TAGS: &[&str] = &[
        "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "a", "button", "label", "li", "td", "th",
    ];

    // 标记约定
    pub const OPT_IN_CLASS: &str = "translate";
    pub const OPT_OUT_ATTR: &str = "data-no-translate";
    pub const DONE_ATTR: &str = "data-translated";
    pub const DONE_ATTR_VALUE: &str = "true";
    pub const PLACEHOLDER_ATTR: &str = "placeholder";

    // 跳过整个子树的上下文
    pub const SKIP_CONTEXTS: &[&str] = &["script", "style", "code", "pre"];

    // 语言状态持久化
    pub const STORAGE_KEY: &str = "siteLanguage";
    pub const DEFAULT_LANGUAGE_FILE: &str = "~/.config/pagetrans/language.toml";

    // 支持的语言及其本地化显示名称
    pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
        ("en", "English"),
        ("hi", "हिन्दी"),
        ("bn", "বাংলা"),
        ("ta", "தமிழ்"),
        ("mr", "मराठी"),
    ];

    // 翻译失败时的用户提示
    pub const ALERT_TEXT: &str = "Translation failed. Please try again or use English.";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "pagetrans.toml",
        "config.toml",
        ".pagetrans.toml",
        "~/.config/pagetrans/config.toml",
        "/etc/pagetrans/config.toml",
    ];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS.iter().any(|path| {
        let expanded = shellexpand::tilde(path);
        std::path::Path::new(expanded.as_ref()).exists()
    })
}

/// 查找语言的本地化显示名称
pub fn display_name_for(code: &str) -> Option<&'static str> {
    constants::SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// 向后兼容的配置加载函数
pub fn load_engine_config() -> EngineConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.get_config().clone(),
        Err(e) => {
            tracing::warn!("创建配置管理器失败，使用默认配置: {}", e);
            EngineConfig::default()
        }
    }
}
