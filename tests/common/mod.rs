// 集成测试公共模块
//
// 提供模拟翻译服务、测试页面和记录宿主回调的辅助工具

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use pagetrans::config::EngineConfig;
use pagetrans::controller::{LanguageState, PageHost};

/// 响应延迟序列，按请求到达顺序循环使用，打乱并发批次的完成顺序
const RESPONSE_DELAYS_MS: [u64; 5] = [60, 0, 40, 20, 80];

/// 按 `{目标语言}:{原文}` 规则回应批量请求的模拟翻译服务
pub struct PrefixTranslator {
    served: AtomicUsize,
}

impl PrefixTranslator {
    pub fn new() -> Self {
        Self {
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for PrefixTranslator {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(value) => value,
            Err(_) => return ResponseTemplate::new(400),
        };

        let target = body["target_language"].as_str().unwrap_or("xx").to_string();
        let translations: Vec<String> = body["texts"]
            .as_array()
            .map(|texts| {
                texts
                    .iter()
                    .map(|text| format!("{}:{}", target, text.as_str().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default();

        let order = self.served.fetch_add(1, Ordering::Relaxed);
        let delay = RESPONSE_DELAYS_MS[order % RESPONSE_DELAYS_MS.len()];

        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(delay))
            .set_body_json(serde_json::json!({
                "success": true,
                "translations": translations,
            }))
    }
}

/// 挂载标准翻译路由
pub async fn mount_translation_service(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/translate/batch/"))
        .respond_with(PrefixTranslator::new())
        .mount(server)
        .await;
}

/// 指向模拟服务的引擎配置
pub fn test_config(server: &MockServer) -> EngineConfig {
    EngineConfig::default_with_api_url(&format!("{}/api/translate/batch/", server.uri()))
}

/// 记录宿主回调的测试实现，克隆后仍指向同一份事件列表
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingHost {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
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

/// 构建一个覆盖各类收集规则的测试页面
///
/// 共 10 个可翻译单元；纯数字单元格、退出标记、script 和 pre
/// 上下文都应被跳过
pub fn sample_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Community Garden</title>
    <meta charset="UTF-8">
    <script>var count = 42;</script>
</head>
<body>
    <h1>Welcome to the garden</h1>
    <p>Growing together since last spring.</p>
    <nav>
        <ul>
            <li><a href="/plots">Available plots</a></li>
            <li><a href="/events">Upcoming events</a></li>
        </ul>
    </nav>
    <table>
        <tr><th>Plot</th><td>12</td></tr>
        <tr><th>Size</th><td>Ten square meters</td></tr>
    </table>
    <span data-no-translate>GardenOS v3</span>
    <div class="translate">Opt-in block of text</div>
    <textarea class="translate" placeholder="Enter your name">Write here</textarea>
    <button>Sign up</button>
    <pre><p>raw text sample</p></pre>
</body>
</html>"#
        .to_string()
}
