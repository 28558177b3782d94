use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use comic_fetch::config::DEFAULT_CONFIG_FILE;
use comic_fetch::utils::display_elapsed_time;
use comic_fetch::{ComicCrawler, Config, Overrides, logger};

/// 下载漫画章节图片并转存为 WebP
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// 要下载的章节数（从第 1 章开始）
    #[arg(short, long)]
    chapters: Option<usize>,

    /// 每张图片标题的位置（CSS 选择器，相对于图片元素）
    #[arg(short, long)]
    name_location: Option<String>,

    /// 配置文件
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 图片保存目录
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(
        &cli.config,
        Overrides {
            chapters: cli.chapters,
            output_dir: cli.output_dir,
            name_location: cli.name_location,
        },
    )?;
    logger::init(&config.error_log)?;

    println!("\n=== comic-fetch ===");
    println!("正在下载 {} 章...", config.chapters);
    let start = Instant::now();

    let crawler = ComicCrawler::new(config)?;
    crawler.run().await?;

    display_elapsed_time(start.elapsed());
    Ok(())
}
