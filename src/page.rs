//! UI 树适配层
//!
//! 引擎核心不直接依赖具体文档实现，而是通过 `UiTree` 接口完成
//! 候选收集、文本写回和完成标记，便于在测试中替换虚拟文档树。
//! `HtmlPage` 是基于 html5ever 解析结果的默认实现。

use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::collector::{self, CollectorRules};
use crate::config::constants;
use crate::dom;
use crate::error::TranslationResult;

/// 一次翻译过程中的可翻译单元
///
/// 节点本身归文档所有，单元只在单次翻译过程中存在
#[derive(Debug, Clone)]
pub struct TranslatableUnit<N> {
    /// 对应的文档节点
    pub node: N,
    /// 收集时的直接文本
    pub original_text: String,
    /// 写回后记录的译文
    pub translated_text: Option<String>,
}

impl<N> TranslatableUnit<N> {
    pub fn new(node: N, original_text: String) -> Self {
        Self {
            node,
            original_text,
            translated_text: None,
        }
    }
}

/// UI 树适配接口
pub trait UiTree {
    type Node: Clone;

    /// 收集当前文档中的全部可翻译单元，按文档顺序返回
    fn collect_candidates(&self) -> TranslationResult<Vec<TranslatableUnit<Self::Node>>>;

    /// 将译文写入单元对应元素的直接文本节点，保持子元素结构不变
    fn apply_text(&self, unit: &TranslatableUnit<Self::Node>, text: &str);

    /// 为元素打上翻译完成标记
    fn mark_done(&self, unit: &TranslatableUnit<Self::Node>);

    /// 读取元素的占位符属性
    fn placeholder_of(&self, unit: &TranslatableUnit<Self::Node>) -> Option<String>;

    /// 写入已翻译的占位符属性
    fn set_placeholder(&self, unit: &TranslatableUnit<Self::Node>, value: &str);
}

/// 基于 html5ever 的页面文档
pub struct HtmlPage {
    dom: RcDom,
    rules: CollectorRules,
}

impl HtmlPage {
    /// 从 UTF-8 字符串解析页面
    pub fn parse(html: &str) -> Self {
        Self::from_bytes(html.as_bytes(), "utf-8")
    }

    /// 从字节与字符集标签解析页面
    pub fn from_bytes(data: &[u8], document_encoding: &str) -> Self {
        Self {
            dom: dom::html_to_dom(data, document_encoding.to_string()),
            rules: CollectorRules::default(),
        }
    }

    /// 替换收集规则
    pub fn with_rules(mut self, rules: CollectorRules) -> Self {
        self.rules = rules;
        self
    }

    /// 文档根节点
    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    /// 将当前文档序列化为 HTML
    pub fn to_html(&self) -> String {
        let mut buf: Vec<u8> = Vec::new();
        let serializable: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut buf, &serializable, SerializeOpts::default())
            .expect("Unable to serialize DOM into buffer");
        String::from_utf8_lossy(&buf).to_string()
    }
}

impl UiTree for HtmlPage {
    type Node = Handle;

    fn collect_candidates(&self) -> TranslationResult<Vec<TranslatableUnit<Handle>>> {
        Ok(collector::collect_translatable_units(
            &self.dom.document,
            &self.rules,
        ))
    }

    fn apply_text(&self, unit: &TranslatableUnit<Handle>, text: &str) {
        // 只改写非空的直接文本节点，子元素保持原样
        for child in unit.node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child.data {
                let mut text_content = contents.borrow_mut();
                if !text_content.trim().is_empty() {
                    text_content.clear();
                    text_content.push_slice(text);
                }
            }
        }
    }

    fn mark_done(&self, unit: &TranslatableUnit<Handle>) {
        dom::set_node_attr(
            &unit.node,
            constants::DONE_ATTR,
            Some(constants::DONE_ATTR_VALUE.to_string()),
        );
    }

    fn placeholder_of(&self, unit: &TranslatableUnit<Handle>) -> Option<String> {
        dom::get_node_attr(&unit.node, constants::PLACEHOLDER_ATTR)
            .filter(|value| !value.trim().is_empty())
    }

    fn set_placeholder(&self, unit: &TranslatableUnit<Handle>, value: &str) {
        dom::set_node_attr(
            &unit.node,
            constants::PLACEHOLDER_ATTR,
            Some(value.to_string()),
        );
    }
}
