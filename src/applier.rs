//! 文本写回组件
//!
//! 将等长的译文列表按位置写回收集得到的单元：只改写直接文本节点，
//! 子元素结构保持不变，并为处理过的元素打上完成标记保证幂等。
//! 带占位符属性的元素会追加一次单条翻译，按尽力而为处理。

use crate::client::BatchTranslationClient;
use crate::page::{TranslatableUnit, UiTree};

/// 将译文写回对应单元并打标记，返回写回的单元数量
///
/// `translations` 必须与 `units` 等长且顺序一致，这由批量客户端的
/// 长度不变式保证。占位符翻译失败只记录日志，不影响返回值。
pub async fn apply_translations<T: UiTree>(
    tree: &T,
    client: &BatchTranslationClient,
    units: &mut [TranslatableUnit<T::Node>],
    translations: &[String],
    target_lang: &str,
) -> usize {
    debug_assert_eq!(units.len(), translations.len());

    let mut applied = 0;

    for (unit, translated) in units.iter_mut().zip(translations.iter()) {
        tree.apply_text(unit, translated);
        tree.mark_done(unit);
        unit.translated_text = Some(translated.clone());
        applied += 1;

        if let Some(placeholder) = tree.placeholder_of(unit) {
            match client.translate_single(&placeholder, target_lang).await {
                Ok(value) => tree.set_placeholder(unit, &value),
                Err(e) => tracing::debug!("占位符翻译失败，保留原值: {}", e),
            }
        }
    }

    tracing::debug!("写回完成: {} 个单元", applied);
    applied
}
