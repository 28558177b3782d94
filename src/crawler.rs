pub mod chapters;
pub mod fetcher;
pub mod manifest;
pub mod parser;
pub mod processor;

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;
use tracing::{info, instrument, warn};

pub use fetcher::{BrowserFetcher, PageFetcher, fetch_page};
pub use manifest::Manifest;
pub use parser::{ImageRecord, Parser};
pub use processor::Processor;

use crate::config::{Config, Naming};

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub chapters_processed: usize,
    pub chapters_skipped: usize,
    pub images_found: usize,
    pub images_saved: usize,
    pub images_failed: usize,
}

impl RunSummary {
    /// 所有章节都已处理完毕（单个章节或图片失败不影响）
    pub fn is_done(&self, chapters: usize) -> bool {
        self.chapters_processed + self.chapters_skipped == chapters
    }
}

pub struct ComicCrawler<F: PageFetcher> {
    config: Config,
    fetcher: F,
    processor: Processor,
}

impl ComicCrawler<BrowserFetcher> {
    pub fn new(config: Config) -> Result<Self> {
        let user_agent = ua_generator::ua::spoof_ua();
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("无法创建 HTTP 客户端")?;
        let fetcher = BrowserFetcher::new(config.browser.clone(), user_agent);
        Ok(Self::with_fetcher(config, fetcher, client))
    }
}

impl<F: PageFetcher> ComicCrawler<F> {
    pub fn with_fetcher(config: Config, fetcher: F, client: Client) -> Self {
        let processor = Processor::new(client, config.quality);
        Self {
            config,
            fetcher,
            processor,
        }
    }

    /// 依次处理所有章节，只有目录或清单文件出错才会中止
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<RunSummary> {
        let mut manifest = Manifest::create(&self.config.manifest)?;
        let mut summary = RunSummary::default();

        for url in chapters::chapter_urls(&self.config.url_template, self.config.chapters) {
            match fetch_page(&self.fetcher, &url).await {
                Some(content) if !content.trim().is_empty() => {
                    self.chapter(&url, &content, &mut manifest, &mut summary)
                        .await?;
                    summary.chapters_processed += 1;
                }
                Some(_) => {
                    warn!("Empty content returned for URL: {}", url);
                    summary.chapters_skipped += 1;
                }
                // 失败已在 fetch_page 中记录
                None => summary.chapters_skipped += 1,
            }
        }

        manifest.finish()?;

        println!("Done");
        info!(
            "共处理 {} 章，跳过 {} 章，保存图片 {}/{}",
            summary.chapters_processed,
            summary.chapters_skipped,
            summary.images_saved,
            summary.images_found
        );
        Ok(summary)
    }

    #[instrument(skip(self, content, manifest, summary))]
    async fn chapter(
        &self,
        url: &str,
        content: &str,
        manifest: &mut Manifest,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let dir_name = chapters::chapter_dir_name(url, self.config.dir_naming)?;
        let output_dir = self.config.output_dir.join(dir_name);
        fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("无法创建目录 {}", output_dir.display()))?;

        let parser = Parser::new(&self.config.locator);
        let document = parser.parse(content);

        let chapter_name = match self.config.naming {
            Naming::PageTitle => parser.chapter_names(&document).last(),
            Naming::ImageTitle => None,
        };
        if self.config.naming == Naming::PageTitle && chapter_name.is_none() {
            warn!("未找到章节标题，使用内容哈希命名: {}", url);
        }

        for (index, record) in parser.images(&document).enumerate() {
            summary.images_found += 1;
            manifest.append(&record.url)?;

            let name = file_stem(self.config.naming, chapter_name.as_deref(), index, record.name);
            println!("{}", name.as_deref().unwrap_or(&record.url));

            if self.save(&record.url, &output_dir, name.as_deref()).await {
                summary.images_saved += 1;
            } else {
                summary.images_failed += 1;
            }
        }
        Ok(())
    }

    async fn save(&self, url: &str, dir: &Path, name: Option<&str>) -> bool {
        self.processor.save(url, dir, name).await.is_some()
    }
}

/// 图片文件名（不含扩展名），None 表示使用内容哈希
fn file_stem(
    naming: Naming,
    chapter_name: Option<&str>,
    index: usize,
    image_title: Option<String>,
) -> Option<String> {
    match naming {
        Naming::PageTitle => chapter_name.map(|chapter| format!("{} - {:02}", chapter, index)),
        Naming::ImageTitle => image_title,
    }
}
