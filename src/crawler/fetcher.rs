use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BrowserOptions;

/// 取得页面渲染后的 HTML
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// 失败时记录日志并返回 None，由调用方跳过该章节
#[instrument(skip(fetcher))]
pub async fn fetch_page<F: PageFetcher>(fetcher: &F, url: &str) -> Option<String> {
    match fetcher.fetch(url).await {
        Ok(content) => Some(content),
        Err(e) => {
            error!("Error accessing URL {}: {:#}", url, e);
            None
        }
    }
}

/// 每次请求启动一个独立的无头浏览器，用完即关闭
pub struct BrowserFetcher {
    options: BrowserOptions,
    user_agent: String,
}

impl BrowserFetcher {
    pub fn new(options: BrowserOptions, user_agent: &str) -> Self {
        Self {
            options,
            user_agent: user_agent.to_owned(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.options.timeout())
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", self.user_agent));

        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(chrome_path) = &self.options.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("浏览器配置错误: {}", e))
    }

    async fn render(browser: &Browser, url: &str) -> Result<String> {
        let page = browser.new_page(url).await.context("无法打开页面")?;
        page.wait_for_navigation().await.context("页面加载超时")?;
        let content = page.content().await.context("无法获取页面内容")?;

        if let Err(e) = page.close().await {
            warn!("关闭页面失败: {}", e);
        }
        Ok(content)
    }
}

impl PageFetcher for BrowserFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("正在加载页面");
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .context("无法启动浏览器")?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件错误: {}", e);
                }
            }
        });

        let rendered = tokio::time::timeout(self.options.timeout(), Self::render(&browser, url))
            .await
            .unwrap_or_else(|_| Err(anyhow::anyhow!("页面加载超时")));

        let closed = browser.close().await;
        let _ = browser.wait().await;
        handle.abort();

        let content = rendered?;
        closed.context("关闭浏览器失败")?;
        debug!("页面加载完成，共 {} 字节", content.len());
        Ok(content)
    }
}
