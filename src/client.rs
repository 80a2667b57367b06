//! 批量翻译客户端
//!
//! 将有序文本列表按固定大小切分为批次，通过后端批量翻译接口并发请求，
//! 并保证合并结果与输入顺序一致：
//! - 每个批次一次 `POST` 请求，载荷为 `{texts, target_language}`
//! - 批次失败（网络错误、非成功响应、条目数不匹配）时回退为该批次的原文
//! - 输出长度恒等于输入长度，任何情况下不丢条目

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use url::Url;

use crate::config::EngineConfig;
use crate::error::{TranslationError, TranslationResult};

/// 批次请求体
#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    texts: &'a [String],
    target_language: &'a str,
}

/// 批次响应体
#[derive(Debug, Deserialize)]
struct BatchResponse {
    success: bool,
    #[serde(default)]
    translations: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// 批量翻译客户端
pub struct BatchTranslationClient {
    http: reqwest::Client,
    api_url: Url,
    chunk_size: usize,
    max_concurrent: usize,
    stats: ClientStats,
}

impl BatchTranslationClient {
    /// 根据引擎配置创建客户端
    pub fn new(config: &EngineConfig) -> TranslationResult<Self> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| TranslationError::ConfigError(format!("API地址无效: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("构建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            http,
            api_url,
            chunk_size: config.chunk_size,
            max_concurrent: config.max_concurrent_requests,
            stats: ClientStats::default(),
        })
    }

    /// 翻译接口地址
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// 翻译一组文本，返回与输入等长、顺序一致的结果
    ///
    /// 批次并发执行但按批次位置合并；失败的批次以原文回退，
    /// 因此该方法本身不会失败。
    pub async fn translate_batch(&self, texts: &[String], target_lang: &str) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        self.stats
            .texts_requested
            .fetch_add(texts.len(), Ordering::Relaxed);

        let chunks: Vec<&[String]> = texts.chunks(self.chunk_size).collect();
        tracing::info!(
            "开始翻译 {} 条文本，目标语言 {}，共 {} 个批次",
            texts.len(),
            target_lang,
            chunks.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut tagged: Vec<(usize, Vec<String>)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    self.stats.chunks_dispatched.fetch_add(1, Ordering::Relaxed);

                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            self.stats.chunks_fallen_back.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!("批次 {} 获取并发许可失败，使用原文回退: {}", index + 1, e);
                            return (index, chunk.to_vec());
                        }
                    };

                    match self.request_chunk(chunk, target_lang, index).await {
                        Ok(translations) => {
                            self.stats
                                .texts_translated
                                .fetch_add(translations.len(), Ordering::Relaxed);
                            tracing::debug!("批次 {} 完成", index + 1);
                            (index, translations)
                        }
                        Err(e) => {
                            self.stats.chunks_fallen_back.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!("批次 {} 失败，使用原文回退: {}", index + 1, e);
                            (index, chunk.to_vec())
                        }
                    }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // 无论网络完成顺序如何，都按批次位置重组
        tagged.sort_by_key(|(index, _)| *index);

        let merged: Vec<String> = tagged.into_iter().flat_map(|(_, chunk)| chunk).collect();
        debug_assert_eq!(merged.len(), texts.len());
        merged
    }

    /// 翻译单条文本（占位符等附属内容使用，单元素批次）
    pub async fn translate_single(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        self.stats.single_requests.fetch_add(1, Ordering::Relaxed);

        let texts = [text.to_string()];
        let mut translations = self.request_chunk(&texts, target_lang, 0).await?;
        translations
            .pop()
            .ok_or_else(|| TranslationError::ApiError("响应中没有译文".to_string()))
    }

    /// 发送单个批次请求并校验响应契约
    async fn request_chunk(
        &self,
        chunk: &[String],
        target_lang: &str,
        index: usize,
    ) -> TranslationResult<Vec<String>> {
        tracing::debug!("发送批次 {}: {} 条文本", index + 1, chunk.len());

        let request = BatchRequest {
            texts: chunk,
            target_language: target_lang,
        };

        let response = self
            .http
            .post(self.api_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::ApiError(format!("HTTP状态异常: {}", status)));
        }

        let body = response.text().await?;
        let parsed: BatchResponse = serde_json::from_str(&body)?;

        if !parsed.success {
            return Err(TranslationError::ApiError(
                parsed
                    .error
                    .unwrap_or_else(|| "翻译服务未给出原因".to_string()),
            ));
        }

        if parsed.translations.len() != chunk.len() {
            return Err(TranslationError::LengthMismatch {
                expected: chunk.len(),
                actual: parsed.translations.len(),
            });
        }

        Ok(parsed.translations)
    }

    /// 获取请求统计快照
    pub fn stats_snapshot(&self) -> ClientStatsSnapshot {
        self.stats.snapshot()
    }
}

/// 客户端请求统计
#[derive(Debug, Default)]
pub struct ClientStats {
    texts_requested: AtomicUsize,
    texts_translated: AtomicUsize,
    chunks_dispatched: AtomicUsize,
    chunks_fallen_back: AtomicUsize,
    single_requests: AtomicUsize,
}

impl ClientStats {
    /// 生成当前统计快照
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            texts_requested: self.texts_requested.load(Ordering::Relaxed),
            texts_translated: self.texts_translated.load(Ordering::Relaxed),
            chunks_dispatched: self.chunks_dispatched.load(Ordering::Relaxed),
            chunks_fallen_back: self.chunks_fallen_back.load(Ordering::Relaxed),
            single_requests: self.single_requests.load(Ordering::Relaxed),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub texts_requested: usize,
    pub texts_translated: usize,
    pub chunks_dispatched: usize,
    pub chunks_fallen_back: usize,
    pub single_requests: usize,
}

impl ClientStatsSnapshot {
    /// 批次回退比例
    pub fn fallback_rate(&self) -> f64 {
        if self.chunks_dispatched == 0 {
            0.0
        } else {
            self.chunks_fallen_back as f64 / self.chunks_dispatched as f64
        }
    }
}
