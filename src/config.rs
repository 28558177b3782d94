use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use scraper::Selector;
use serde::Deserialize;

use crate::extractor::{
    Attr, Extractor, Text, deserialize_selector, parse_selector,
};

static ENV_PREFIX: &str = "COMIC";

pub static DEFAULT_CONFIG_FILE: &str = "comic.toml";

/// 章节目录的命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirNaming {
    /// 由 URL 生成的标题，例如 `Myst Might Mayhem Chapter 1`
    Title,
    /// URL 中原样的 slug
    Slug,
}

/// 图片文件的命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Naming {
    /// 页面标题 + 两位序号
    PageTitle,
    /// 每张图片自带的标题
    ImageTitle,
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_chapters")]
    pub chapters: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
    #[serde(default = "default_dir_naming")]
    pub dir_naming: DirNaming,
    #[serde(default = "default_naming")]
    pub naming: Naming,
    #[serde(default = "default_quality")]
    pub quality: f32,
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(default)]
    pub locator: LocatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserOptions {
    #[serde(default = "default_headless")]
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BrowserOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 页面中图片和标题的位置
#[derive(Deserialize)]
pub struct LocatorConfig {
    #[serde(
        default = "default_images_selector",
        deserialize_with = "deserialize_selector"
    )]
    pub images: Selector,
    #[serde(default = "default_src")]
    pub src: Box<dyn Extractor>,
    #[serde(
        default = "default_title_container",
        deserialize_with = "deserialize_selector"
    )]
    pub title_container: Selector,
    #[serde(default = "default_title")]
    pub title: Box<dyn Extractor>,
    /// 相对于每个图片元素的标题位置
    #[serde(default)]
    pub name: Option<Box<dyn Extractor>>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            images: default_images_selector(),
            src: default_src(),
            title_container: default_title_container(),
            title: default_title(),
            name: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            chapters: default_chapters(),
            output_dir: default_output_dir(),
            manifest: default_manifest(),
            error_log: default_error_log(),
            dir_naming: default_dir_naming(),
            naming: default_naming(),
            quality: default_quality(),
            browser: BrowserOptions::default(),
            locator: LocatorConfig::default(),
        }
    }
}

/// 命令行中给出的覆盖项
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub chapters: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub name_location: Option<String>,
}

impl Config {
    /// 默认值 -> 配置文件(可选) -> `COMIC_*` 环境变量 -> 命令行
    pub fn load(config_path: &Path, overrides: Overrides) -> Result<Self> {
        let mut config: Config = config::Config::builder()
            .add_source(
                config::File::from(config_path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("{} 反序列化失败: {}", config_path.display(), e))?;

        config.apply(overrides)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(chapters) = overrides.chapters {
            self.chapters = chapters;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(location) = overrides.name_location {
            self.set_name_location(&location)?;
        }
        Ok(())
    }

    /// 从每个图片元素的 `title` 属性取名字
    pub fn set_name_location(&mut self, location: &str) -> Result<()> {
        let selector = parse_selector(location).map_err(|e| anyhow::anyhow!(e))?;
        self.locator.name = Some(Box::new(Attr::new(Some(selector), "title")));
        self.naming = Naming::ImageTitle;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chapters == 0 {
            anyhow::bail!("章节数必须大于 0");
        }
        if !self.url_template.contains("{n}") {
            anyhow::bail!("URL 模板 '{}' 缺少 {{n}} 占位符", self.url_template);
        }
        if !(0.0..=100.0).contains(&self.quality) {
            anyhow::bail!("图片质量 {} 不在 0-100 之间", self.quality);
        }
        if self.naming == Naming::ImageTitle && self.locator.name.is_none() {
            anyhow::bail!("image-title 命名需要配置 locator.name");
        }
        Ok(())
    }
}

fn default_url_template() -> String {
    "https://asuratoon.com/7367709877-myst-might-mayhem-chapter-{n}/".to_owned()
}

fn default_chapters() -> usize {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Pictures")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("links.csv")
}

fn default_error_log() -> PathBuf {
    PathBuf::from("error.log")
}

fn default_dir_naming() -> DirNaming {
    DirNaming::Title
}

fn default_naming() -> Naming {
    Naming::PageTitle
}

fn default_quality() -> f32 {
    95.0
}

fn default_headless() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_images_selector() -> Selector {
    Selector::parse("img.ts-main-image").expect("无法创建图片选择器")
}

fn default_src() -> Box<dyn Extractor> {
    Box::new(Attr::new(None, "src"))
}

fn default_title_container() -> Selector {
    Selector::parse("div.headpost").expect("无法创建标题选择器")
}

fn default_title() -> Box<dyn Extractor> {
    let selector = Selector::parse("h1.entry-title").expect("无法创建标题选择器");
    Box::new(Text::new(Some(selector)))
}
