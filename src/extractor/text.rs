use scraper::{ElementRef, Selector};
use serde::Deserialize;

use super::{Extractor, deserialize_nullable_selector, select_first};

#[derive(Debug, Deserialize)]
pub struct Text {
    #[serde(default, deserialize_with = "deserialize_nullable_selector")]
    pub selector: Option<Selector>,
}

impl Text {
    pub fn new(selector: Option<Selector>) -> Self {
        Self { selector }
    }
}

#[typetag::deserialize]
impl Extractor for Text {
    fn extract(&self, element: ElementRef) -> Option<String> {
        let elem = match &self.selector {
            Some(selector) => select_first(element, selector)?,
            None => element,
        };

        let text = elem.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::extractor::parse_selector;

    #[test]
    fn collects_nested_text() {
        let html = Html::parse_document(
            r#"<div class="headpost"><h1 class="entry-title"> Myst, <b>Might</b> </h1></div>"#,
        );
        let text = Text::new(Some(parse_selector("h1.entry-title").unwrap()));
        assert_eq!(
            text.extract(html.root_element()).as_deref(),
            Some("Myst, Might")
        );
    }

    #[test]
    fn empty_text_is_none() {
        let html = Html::parse_document(r#"<h1 class="entry-title">  </h1>"#);
        let text = Text::new(Some(parse_selector("h1").unwrap()));
        assert_eq!(text.extract(html.root_element()), None);
        let missing = Text::new(Some(parse_selector("h2").unwrap()));
        assert_eq!(missing.extract(html.root_element()), None);
    }
}
