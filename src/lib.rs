//! # PageTrans Library
//!
//! 浏览器页面的整页翻译引擎：收集可翻译元素，分批调用翻译服务，
//! 将译文破坏性写回文档树，并管理持久化的语言选择。
//!
//! ## 模块组织
//!
//! - `collector` - 可翻译元素收集与嵌套去重
//! - `client` - 批量翻译客户端（分块、并发、原文回退）
//! - `applier` - 译文写回与完成标记
//! - `controller` - 语言状态管理与翻译过程编排
//! - `page` - HTML 文档树与 UI 树抽象
//! - `storage` - 语言选择的持久化存储
//! - `config` - 配置加载与常量定义
//! - `dom` - DOM 节点辅助函数
//! - `error` - 错误类型定义

pub mod applier;
pub mod client;
pub mod collector;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod page;
pub mod storage;

// Re-export commonly used items for convenience
pub use client::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use page::*;
pub use storage::*;

// ============================================================================
// 模块信息和元数据
// ============================================================================

/// 引擎版本信息
pub const VERSION: &str = "0.2.0";

/// 初始化日志订阅器，过滤规则来自 RUST_LOG，未设置时默认 info 级别
///
/// 重复调用时静默忽略，方便在测试中随意调用
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 模块初始化
pub fn init() {
    tracing::info!("页面翻译引擎 v{} 已加载", VERSION);
}

/// 运行引擎自检
pub async fn self_check() -> TranslationResult<()> {
    tracing::info!("开始翻译引擎自检...");

    // 检查配置管理器
    let manager = ConfigManager::new()?;
    let config = manager.get_config().clone();
    tracing::debug!("✓ 配置管理器正常");

    // 检查元素收集器
    let page = HtmlPage::parse("<html><body><p>Hello World</p></body></html>");
    let units = page.collect_candidates()?;
    if units.len() != 1 {
        return Err(TranslationError::CollectionError(
            "元素收集器异常".to_string(),
        ));
    }
    tracing::debug!("✓ 元素收集器正常");

    // 检查批量翻译客户端
    let _client = BatchTranslationClient::new(&config)?;
    tracing::debug!("✓ 批量翻译客户端正常");

    // 检查语言存储
    let store = MemoryLanguageStore::new();
    store.save("en")?;
    if store.load()? != Some("en".to_string()) {
        return Err(TranslationError::StorageError("语言存储异常".to_string()));
    }
    tracing::debug!("✓ 语言存储正常");

    tracing::info!("翻译引擎自检完成，所有组件正常");
    Ok(())
}
