pub mod attr;
pub mod text;

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Deserializer};

pub use attr::Attr;
pub use text::Text;

/// 从元素中取出一个字符串值，取不到时返回 None
#[typetag::deserialize(tag = "type")]
pub trait Extractor: Send + Sync {
    fn extract(&self, element: ElementRef) -> Option<String>;
}

/// 先匹配元素自身，再匹配其后代
fn select_first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if selector.matches(&element) {
        return Some(element);
    }
    element.select(selector).next()
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector, String> {
    Selector::parse(s).map_err(|e| format!("Invalid selector '{}': {}", s, e))
}

pub(crate) fn deserialize_selector<'de, D>(deserializer: D) -> Result<Selector, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;

    parse_selector(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_nullable_selector<'de, D>(
    deserializer: D,
) -> Result<Option<Selector>, D::Error>
where
    D: Deserializer<'de>,
{
    let option_str: Option<String> = Option::deserialize(deserializer)?;

    match option_str {
        Some(s) if s.trim().is_empty() => Ok(None), // 空字符串也视为 None
        Some(s) => parse_selector(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
