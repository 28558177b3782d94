use scraper::{ElementRef, Selector};
use serde::Deserialize;

use super::{Extractor, deserialize_nullable_selector, select_first};

/// 读取属性值（去掉首尾空白），空值视为没有
#[derive(Deserialize)]
pub struct Attr {
    #[serde(default, deserialize_with = "deserialize_nullable_selector")]
    pub selector: Option<Selector>,
    pub name: String,
}

impl Attr {
    pub fn new(selector: Option<Selector>, name: &str) -> Self {
        Self {
            selector,
            name: name.to_owned(),
        }
    }
}

#[typetag::deserialize]
impl Extractor for Attr {
    fn extract(&self, element: ElementRef) -> Option<String> {
        let element = match &self.selector {
            Some(selector) => select_first(element, selector)?,
            None => element,
        };

        element
            .value()
            .attr(&self.name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}
