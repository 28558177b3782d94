use scraper::{ElementRef, Html};
use tracing::{debug, instrument, warn};

use crate::config::LocatorConfig;

/// 页面中的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub url: String,
    pub name: Option<String>,
}

#[derive(Clone, Copy)]
pub struct Parser<'c> {
    config: &'c LocatorConfig,
}

impl<'c> Parser<'c> {
    pub fn new(config: &'c LocatorConfig) -> Self {
        Self { config }
    }

    /// html5ever 不会解析失败，只记录它报告的问题
    #[instrument(skip_all)]
    pub fn parse(&self, content: &str) -> Html {
        let document = Html::parse_document(content);
        if !document.errors.is_empty() {
            debug!("页面解析时发现 {} 处问题", document.errors.len());
        }
        document
    }

    /// 按文档顺序惰性地产出图片，缺少链接的元素会被跳过
    pub fn images<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ImageRecord> + 'a {
        document
            .select(&self.config.images)
            .filter_map(move |image| self.image_record(image))
    }

    fn image_record(&self, image: ElementRef) -> Option<ImageRecord> {
        let Some(url) = self.config.src.extract(image) else {
            warn!("跳过没有链接的图片: {}", image.html());
            return None;
        };
        let name = self
            .config
            .name
            .as_ref()
            .and_then(|extractor| extractor.extract(image));

        Some(ImageRecord { url, name })
    }

    /// 页面标题，每个标题容器产出一个
    pub fn chapter_names<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = String> + 'a {
        document
            .select(&self.config.title_container)
            .filter_map(move |container| self.config.title.extract(container))
    }
}
