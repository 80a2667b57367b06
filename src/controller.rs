//! 语言状态管理器
//!
//! 以单一控制器对象管理页面语言：
//! - 持久化当前语言选择，启动时读取并在需要时自动翻译
//! - 切换到基准语言时请求整页刷新（文本被破坏性改写，刷新是唯一的恢复方式）
//! - 进行中标志保证同一时刻至多一次翻译过程，重复请求被静默忽略
//! - 翻译失败时弹出阻塞提示并回到空闲状态，已写回的部分保持原样

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::applier;
use crate::client::{BatchTranslationClient, ClientStatsSnapshot};
use crate::config::{self, constants, EngineConfig};
use crate::error::TranslationResult;
use crate::page::UiTree;
use crate::storage::LanguageStore;

/// 当前语言状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageState {
    /// 语言码，如 "en"、"hi"
    pub code: String,
    /// 本地化显示名称
    pub display_name: String,
}

impl LanguageState {
    /// 从语言码解析状态，目录中没有的语言码以自身作为显示名称
    pub fn resolve(code: &str) -> Self {
        let display_name = config::display_name_for(code)
            .map(|name| name.to_string())
            .unwrap_or_else(|| code.to_string());

        Self {
            code: code.to_string(),
            display_name,
        }
    }
}

/// 页面宿主接口
///
/// 对应浏览器环境中的加载遮罩、alert 对话框、整页刷新和语言按钮标签；
/// 无头环境可以只记录日志
pub trait PageHost {
    /// 显示加载遮罩
    fn show_overlay(&self);

    /// 隐藏加载遮罩
    fn hide_overlay(&self);

    /// 弹出阻塞式用户提示
    fn alert(&self, message: &str);

    /// 请求整页刷新以恢复基准语言的原始标记
    fn request_reload(&self);

    /// 语言显示发生变化
    fn language_changed(&self, state: &LanguageState);
}

/// 默认宿主实现，所有反馈只写日志
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl PageHost for HeadlessHost {
    fn show_overlay(&self) {
        tracing::info!("显示翻译遮罩");
    }

    fn hide_overlay(&self) {
        tracing::info!("隐藏翻译遮罩");
    }

    fn alert(&self, message: &str) {
        tracing::error!("用户提示: {}", message);
    }

    fn request_reload(&self) {
        tracing::info!("请求整页刷新以恢复基准语言");
    }

    fn language_changed(&self, state: &LanguageState) {
        tracing::info!("当前语言: {} ({})", state.display_name, state.code);
    }
}

/// 语言切换的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// 已有翻译在进行中，本次请求被静默忽略
    Ignored,
    /// 目标为基准语言，已请求整页刷新
    ReloadRequested,
    /// 翻译过程完成
    Translated(PassReport),
}

/// 单次翻译过程的摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// 收集到的单元数
    pub collected: usize,
    /// 成功写回的单元数
    pub applied: usize,
    /// 本次过程发出的批次数
    pub chunks_dispatched: usize,
    /// 以原文回退的批次数
    pub chunks_fallen_back: usize,
    /// 总耗时
    pub elapsed: Duration,
}

/// 页面翻译控制器
///
/// 持有当前语言、进行中标志、批量客户端、语言存储与宿主回调，
/// 驱动完整的 收集 → 翻译 → 写回 流程
pub struct PageTranslator<S: LanguageStore, H: PageHost> {
    config: EngineConfig,
    client: BatchTranslationClient,
    store: S,
    host: H,
    state: Mutex<LanguageState>,
    translating: AtomicBool,
}

impl<S: LanguageStore, H: PageHost> PageTranslator<S, H> {
    /// 创建控制器，启动时读取持久化的语言选择，默认基准语言
    pub fn new(config: EngineConfig, store: S, host: H) -> TranslationResult<Self> {
        config.validate()?;
        let client = BatchTranslationClient::new(&config)?;

        let initial_code = store.load()?.unwrap_or_else(|| config.base_lang.clone());
        let state = LanguageState::resolve(&initial_code);
        tracing::info!("翻译控制器已初始化，当前语言: {}", state.code);

        Ok(Self {
            config,
            client,
            store,
            host,
            state: Mutex::new(state),
            translating: AtomicBool::new(false),
        })
    }

    /// 当前语言状态
    pub fn current_language(&self) -> LanguageState {
        self.lock_state().clone()
    }

    /// 是否有翻译过程正在进行
    pub fn is_translating(&self) -> bool {
        self.translating.load(Ordering::Acquire)
    }

    /// 引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 客户端统计快照
    pub fn stats_snapshot(&self) -> ClientStatsSnapshot {
        self.client.stats_snapshot()
    }

    /// 启动流程：发布当前语言显示，持久化语言不是基准语言时立即翻译
    pub async fn startup<T: UiTree>(&self, tree: &T) -> TranslationResult<Option<PassReport>> {
        let state = self.current_language();
        self.host.language_changed(&state);

        if state.code == self.config.base_lang {
            tracing::debug!("当前为基准语言，无需翻译");
            return Ok(None);
        }

        match self.run_pass(tree, &state.code).await? {
            SwitchOutcome::Translated(report) => Ok(Some(report)),
            _ => Ok(None),
        }
    }

    /// 切换页面语言
    ///
    /// 持久化选择后：目标为基准语言时请求整页刷新且不发起任何网络请求，
    /// 否则执行一次翻译过程。已有过程进行中时本次请求被忽略。
    pub async fn select_language<T: UiTree>(
        &self,
        tree: &T,
        code: &str,
    ) -> TranslationResult<SwitchOutcome> {
        if self.is_translating() {
            tracing::debug!("翻译正在进行，忽略语言切换: {}", code);
            return Ok(SwitchOutcome::Ignored);
        }

        let previous = self.current_language();
        let next = LanguageState::resolve(code);
        tracing::info!("切换语言: {} -> {}", previous.code, next.code);

        self.store.save(code)?;
        self.host.language_changed(&next);
        *self.lock_state() = next.clone();

        if next.code == self.config.base_lang {
            self.host.request_reload();
            return Ok(SwitchOutcome::ReloadRequested);
        }

        let result = self.run_pass(tree, &next.code).await;
        if result.is_err() {
            // 失败后回到之前的空闲语言；持久化的选择保留，刷新后会重试
            *self.lock_state() = previous;
        }
        result
    }

    /// 执行一次翻译过程，全程持有进行中标志并展示遮罩
    async fn run_pass<T: UiTree>(
        &self,
        tree: &T,
        target_lang: &str,
    ) -> TranslationResult<SwitchOutcome> {
        if self
            .translating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("翻译正在进行，忽略重复请求");
            return Ok(SwitchOutcome::Ignored);
        }

        self.host.show_overlay();
        let result = self.translate_tree(tree, target_lang).await;

        self.translating.store(false, Ordering::Release);
        self.host.hide_overlay();

        match result {
            Ok(report) => {
                tracing::info!(
                    "页面翻译完成: {} 个单元，{} 个批次，耗时 {:?}",
                    report.applied,
                    report.chunks_dispatched,
                    report.elapsed
                );
                Ok(SwitchOutcome::Translated(report))
            }
            Err(e) => {
                tracing::error!("页面翻译失败 [{:?}]: {}", e.severity(), e);
                self.host.alert(constants::ALERT_TEXT);
                Err(e)
            }
        }
    }

    /// 收集 → 翻译 → 写回
    async fn translate_tree<T: UiTree>(
        &self,
        tree: &T,
        target_lang: &str,
    ) -> TranslationResult<PassReport> {
        let started = Instant::now();
        let stats_before = self.client.stats_snapshot();

        let mut units = tree.collect_candidates()?;
        tracing::info!("发现 {} 个待翻译元素", units.len());

        if units.is_empty() {
            return Ok(PassReport {
                collected: 0,
                applied: 0,
                chunks_dispatched: 0,
                chunks_fallen_back: 0,
                elapsed: started.elapsed(),
            });
        }

        let texts: Vec<String> = units.iter().map(|unit| unit.original_text.clone()).collect();
        let translations = self.client.translate_batch(&texts, target_lang).await;

        let applied =
            applier::apply_translations(tree, &self.client, &mut units, &translations, target_lang)
                .await;

        let stats_after = self.client.stats_snapshot();

        Ok(PassReport {
            collected: units.len(),
            applied,
            chunks_dispatched: stats_after.chunks_dispatched - stats_before.chunks_dispatched,
            chunks_fallen_back: stats_after.chunks_fallen_back - stats_before.chunks_fallen_back,
            elapsed: started.elapsed(),
        })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LanguageState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::error::TranslationError;
    use crate::page::TranslatableUnit;
    use crate::storage::MemoryLanguageStore;

    /// 测试用虚拟文档树
    struct TestTree {
        texts: RefCell<Vec<String>>,
        marked: RefCell<Vec<bool>>,
        fail_collect: bool,
    }

    impl TestTree {
        fn with_texts(texts: &[&str]) -> Self {
            Self {
                texts: RefCell::new(texts.iter().map(|t| t.to_string()).collect()),
                marked: RefCell::new(vec![false; texts.len()]),
                fail_collect: false,
            }
        }

        fn failing() -> Self {
            let mut tree = Self::with_texts(&["Broken page"]);
            tree.fail_collect = true;
            tree
        }
    }

    impl UiTree for TestTree {
        type Node = usize;

        fn collect_candidates(&self) -> TranslationResult<Vec<TranslatableUnit<usize>>> {
            if self.fail_collect {
                return Err(TranslationError::CollectionError("注入的收集失败".to_string()));
            }

            let marked = self.marked.borrow();
            Ok(self
                .texts
                .borrow()
                .iter()
                .enumerate()
                .filter(|(index, _)| !marked[*index])
                .map(|(index, text)| TranslatableUnit::new(index, text.clone()))
                .collect())
        }

        fn apply_text(&self, unit: &TranslatableUnit<usize>, text: &str) {
            self.texts.borrow_mut()[unit.node] = text.to_string();
        }

        fn mark_done(&self, unit: &TranslatableUnit<usize>) {
            self.marked.borrow_mut()[unit.node] = true;
        }

        fn placeholder_of(&self, _unit: &TranslatableUnit<usize>) -> Option<String> {
            None
        }

        fn set_placeholder(&self, _unit: &TranslatableUnit<usize>, _value: &str) {}
    }

    /// 记录宿主回调顺序的测试实现
    #[derive(Debug, Default)]
    struct RecordingHost {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn push(&self, event: impl Into<String>) {
            self.events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    impl PageHost for RecordingHost {
        fn show_overlay(&self) {
            self.push("overlay_shown");
        }

        fn hide_overlay(&self) {
            self.push("overlay_hidden");
        }

        fn alert(&self, message: &str) {
            self.push(format!("alert:{}", message));
        }

        fn request_reload(&self) {
            self.push("reload");
        }

        fn language_changed(&self, state: &LanguageState) {
            self.push(format!("lang:{}", state.code));
        }
    }

    fn new_translator() -> PageTranslator<MemoryLanguageStore, RecordingHost> {
        PageTranslator::new(
            EngineConfig::default(),
            MemoryLanguageStore::new(),
            RecordingHost::default(),
        )
        .expect("translator")
    }

    #[test]
    fn test_resolve_language_state() {
        let hi = LanguageState::resolve("hi");
        assert_eq!(hi.code, "hi");
        assert_eq!(hi.display_name, "हिन्दी");

        // 目录外的语言码用码本身作显示名称
        let unknown = LanguageState::resolve("xx");
        assert_eq!(unknown.display_name, "xx");
    }

    #[test]
    fn test_initial_state_defaults_to_base_language() {
        let translator = new_translator();
        assert_eq!(translator.current_language().code, "en");
        assert!(!translator.is_translating());
    }

    #[test]
    fn test_initial_state_reads_store() {
        let translator = PageTranslator::new(
            EngineConfig::default(),
            MemoryLanguageStore::with_language("ta"),
            RecordingHost::default(),
        )
        .expect("translator");
        assert_eq!(translator.current_language().code, "ta");
    }

    #[tokio::test]
    async fn test_base_language_selection_requests_reload() {
        let translator = new_translator();
        let tree = TestTree::with_texts(&["Welcome home"]);

        let outcome = translator
            .select_language(&tree, "en")
            .await
            .expect("select");
        assert_eq!(outcome, SwitchOutcome::ReloadRequested);

        let events = translator.host.events();
        assert!(events.contains(&"reload".to_string()));
        // 刷新路径不展示遮罩，也不应有任何批次发出
        assert!(!events.contains(&"overlay_shown".to_string()));
        assert_eq!(translator.stats_snapshot().chunks_dispatched, 0);

        // 选择仍被持久化
        assert_eq!(
            translator.store.load().expect("load"),
            Some("en".to_string())
        );
    }

    #[tokio::test]
    async fn test_switch_ignored_while_translating() {
        let translator = new_translator();
        let tree = TestTree::with_texts(&["Some text"]);

        translator.translating.store(true, Ordering::Release);
        let outcome = translator
            .select_language(&tree, "hi")
            .await
            .expect("select");
        assert_eq!(outcome, SwitchOutcome::Ignored);

        // 被忽略的请求不持久化、不回调宿主
        assert_eq!(translator.store.load().expect("load"), None);
        assert!(translator.host.events().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_completes_without_requests() {
        let translator = new_translator();
        let tree = TestTree::with_texts(&[]);

        let outcome = translator
            .select_language(&tree, "hi")
            .await
            .expect("select");

        match outcome {
            SwitchOutcome::Translated(report) => {
                assert_eq!(report.collected, 0);
                assert_eq!(report.chunks_dispatched, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let events = translator.host.events();
        assert!(events.contains(&"overlay_shown".to_string()));
        assert!(events.contains(&"overlay_hidden".to_string()));
        assert_eq!(translator.current_language().code, "hi");
        assert!(!translator.is_translating());
    }

    #[tokio::test]
    async fn test_pipeline_failure_alerts_and_reverts_state() {
        let translator = new_translator();
        let tree = TestTree::failing();

        let result = translator.select_language(&tree, "hi").await;
        assert!(result.is_err());

        let events = translator.host.events();
        assert!(events.contains(&"overlay_shown".to_string()));
        assert!(events.contains(&"overlay_hidden".to_string()));
        assert!(events
            .iter()
            .any(|event| event.starts_with("alert:Translation failed")));

        // 内存中的语言状态回退，持久化的选择保留
        assert_eq!(translator.current_language().code, "en");
        assert_eq!(
            translator.store.load().expect("load"),
            Some("hi".to_string())
        );
        assert!(!translator.is_translating());
    }

    #[tokio::test]
    async fn test_startup_with_base_language_does_nothing() {
        let translator = new_translator();
        let tree = TestTree::with_texts(&["Hello world"]);

        let report = translator.startup(&tree).await.expect("startup");
        assert!(report.is_none());

        let events = translator.host.events();
        assert_eq!(events, vec!["lang:en".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.chunk_size = 0;

        let result = PageTranslator::new(
            config,
            MemoryLanguageStore::new(),
            RecordingHost::default(),
        );
        assert!(result.is_err());
    }
}
