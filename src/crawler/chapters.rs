use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use url::Url;

use crate::config::DirNaming;
use crate::utils::{sanitize_filename, title_case};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{n\}").expect("正则表达式编译失败"));

/// 按顺序生成第 1..=count 章的链接
pub fn chapter_urls(template: &str, count: usize) -> impl Iterator<Item = String> + '_ {
    (1..=count).map(move |n| chapter_url(template, n))
}

pub fn chapter_url(template: &str, n: usize) -> String {
    PLACEHOLDER
        .replace_all(template, n.to_string().as_str())
        .into_owned()
}

/// 章节目录名，由链接最后一段路径生成
pub fn chapter_dir_name(chapter_url: &str, naming: DirNaming) -> Result<String> {
    let url = Url::parse(chapter_url)?;
    let slug = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| anyhow::anyhow!("无法从 {} 获取章节名", chapter_url))?;

    let name = match naming {
        DirNaming::Slug => slug.to_owned(),
        DirNaming::Title => {
            // 去掉开头的作品编号
            let rest = slug.split_once('-').map_or(slug, |(_, rest)| rest);
            title_case(&rest.replace('-', " "))
        }
    };

    let name = sanitize_filename(&name).trim().to_owned();
    if name.is_empty() {
        anyhow::bail!("无法从 {} 获取章节名", chapter_url);
    }
    Ok(name)
}
