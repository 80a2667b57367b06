//! 可翻译元素收集器
//!
//! 按文档顺序遍历 DOM，选出携带直接文本的候选元素：
//! - 标签类别：标题、段落、行内文本、链接、按钮、标签、列表和表格单元格
//! - 显式加入：class 中带有 `translate` 标记的任意元素
//! - 排除：显式退出标记、已翻译标记、纯数字文本、过短文本、
//!   以及 script/style/code/pre 上下文中的元素
//! - 嵌套去重：若一个入选元素是另一个入选元素的祖先，则丢弃祖先，保留最内层

use std::collections::HashSet;
use std::sync::OnceLock;

use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

use crate::config::constants;
use crate::config::EngineConfig;
use crate::dom::{direct_text, get_node_attr, get_node_name, get_parent_node, node_id};
use crate::page::TranslatableUnit;

/// 收集规则
#[derive(Debug, Clone)]
pub struct CollectorRules {
    /// 参与收集的标签名
    pub tags: Vec<String>,
    /// 直接文本的最小长度（字符数）
    pub min_text_length: usize,
}

impl CollectorRules {
    /// 创建默认规则
    pub fn default() -> Self {
        Self {
            tags: constants::TRANSLATABLE_TAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            min_text_length: constants::MIN_TEXT_LENGTH,
        }
    }

    /// 从引擎配置派生规则
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut rules = Self::default();
        rules.min_text_length = config.min_text_length;
        rules
    }
}

impl Default for CollectorRules {
    fn default() -> Self {
        Self::default()
    }
}

/// 元素被排除的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 不属于任何收集类别
    NotCandidate,
    /// 带有显式退出标记
    OptedOut,
    /// 已带有翻译完成标记
    AlreadyTranslated,
    /// 没有直接文本
    EmptyText,
    /// 直接文本为纯数字
    NumericOnly,
    /// 直接文本过短
    TooShort,
}

/// 收集统计
#[derive(Debug, Default, Clone)]
pub struct CollectionStats {
    pub visited_elements: usize,
    pub selected: usize,
    pub skipped_opt_out: usize,
    pub skipped_marked: usize,
    pub skipped_numeric: usize,
    pub skipped_short: usize,
    pub dropped_nested: usize,
}

static NUMERIC_ONLY_REGEX: OnceLock<Regex> = OnceLock::new();

/// 判断文本是否为纯数字
fn is_numeric_only(text: &str) -> bool {
    let regex = NUMERIC_ONLY_REGEX
        .get_or_init(|| Regex::new(r"^\d+$").unwrap_or_else(|_| Regex::new(r"").unwrap()));
    regex.is_match(text)
}

/// 检查元素是否带有显式加入标记
fn has_opt_in_class(node: &Handle) -> bool {
    get_node_attr(node, "class")
        .map(|classes| {
            classes
                .split_whitespace()
                .any(|c| c == constants::OPT_IN_CLASS)
        })
        .unwrap_or(false)
}

/// 评估单个元素，入选则返回其直接文本
pub fn classify_element(node: &Handle, rules: &CollectorRules) -> Result<String, SkipReason> {
    let tag = match get_node_name(node) {
        Some(tag) => tag,
        None => return Err(SkipReason::NotCandidate),
    };

    let tag_matches = rules.tags.iter().any(|t| t == tag);
    if !tag_matches && !has_opt_in_class(node) {
        return Err(SkipReason::NotCandidate);
    }

    if get_node_attr(node, constants::OPT_OUT_ATTR).is_some() {
        return Err(SkipReason::OptedOut);
    }

    if get_node_attr(node, constants::DONE_ATTR).is_some() {
        return Err(SkipReason::AlreadyTranslated);
    }

    let text = direct_text(node);
    if text.is_empty() {
        return Err(SkipReason::EmptyText);
    }

    if is_numeric_only(&text) {
        return Err(SkipReason::NumericOnly);
    }

    if text.chars().count() < rules.min_text_length {
        return Err(SkipReason::TooShort);
    }

    Ok(text)
}

/// 收集文档中所有可翻译单元，按文档顺序返回
pub fn collect_translatable_units(
    root: &Handle,
    rules: &CollectorRules,
) -> Vec<TranslatableUnit<Handle>> {
    let mut stats = CollectionStats::default();
    let mut candidates: Vec<(Handle, String)> = Vec::new();

    collect_recursive(root, rules, &mut candidates, &mut stats);
    let kept = deduplicate_nested(candidates, &mut stats);

    tracing::debug!(
        "元素收集完成: 访问 {} 个元素，入选 {} 个，嵌套去重丢弃 {} 个",
        stats.visited_elements,
        kept.len(),
        stats.dropped_nested
    );

    kept.into_iter()
        .map(|(node, text)| TranslatableUnit::new(node, text))
        .collect()
}

/// 深度优先遍历文档树
fn collect_recursive(
    node: &Handle,
    rules: &CollectorRules,
    out: &mut Vec<(Handle, String)>,
    stats: &mut CollectionStats,
) {
    if let NodeData::Element { ref name, .. } = node.data {
        // 脚本、样式、代码和预格式化子树整体跳过
        if constants::SKIP_CONTEXTS.contains(&name.local.as_ref()) {
            return;
        }

        stats.visited_elements += 1;

        match classify_element(node, rules) {
            Ok(text) => {
                out.push((node.clone(), text));
                stats.selected += 1;
            }
            Err(SkipReason::OptedOut) => stats.skipped_opt_out += 1,
            Err(SkipReason::AlreadyTranslated) => stats.skipped_marked += 1,
            Err(SkipReason::NumericOnly) => stats.skipped_numeric += 1,
            Err(SkipReason::TooShort) => stats.skipped_short += 1,
            Err(_) => {}
        }
    }

    for child in node.children.borrow().iter() {
        collect_recursive(child, rules, out, stats);
    }
}

/// 嵌套去重：丢弃作为其他入选元素祖先的元素
fn deduplicate_nested(
    candidates: Vec<(Handle, String)>,
    stats: &mut CollectionStats,
) -> Vec<(Handle, String)> {
    if candidates.len() < 2 {
        return candidates;
    }

    let selected_ids: HashSet<usize> = candidates.iter().map(|(node, _)| node_id(node)).collect();
    let mut dropped: HashSet<usize> = HashSet::new();

    for (node, _) in &candidates {
        let mut current = get_parent_node(node);
        while let Some(ancestor) = current {
            if selected_ids.contains(&node_id(&ancestor)) {
                dropped.insert(node_id(&ancestor));
            }
            current = get_parent_node(&ancestor);
        }
    }

    stats.dropped_nested = dropped.len();

    candidates
        .into_iter()
        .filter(|(node, _)| !dropped.contains(&node_id(node)))
        .collect()
}
