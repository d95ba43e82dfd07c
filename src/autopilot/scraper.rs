use serde::Deserialize;

use super::js_string;
use crate::browser::PageChannel;
use crate::config::SelectorConfig;
use crate::course::{CourseItem, ItemKind};
use crate::error::Result;

/// Which on-page list a scrape came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    Required,
    Supplementary,
    None,
}

/// One list item as read off the page, before any interpretation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub title: String,
    pub icon_color: String,
    pub icon_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedList {
    pub source: ListSource,
    pub items: Vec<RawItem>,
}

/// Reads the course-material list and normalizes it into `CourseItem`s.
/// The list is re-read on every call; there is nothing stable to cache.
pub struct Scraper {
    selectors: SelectorConfig,
}

impl Scraper {
    pub fn new(selectors: SelectorConfig) -> Self {
        Self { selectors }
    }

    /// Scrape the required list, falling back to the supplementary list
    /// when the required one is absent or empty. Neither existing is not
    /// an error here; the caller decides how loudly to complain.
    pub async fn scrape(&self, page: &mut PageChannel) -> Result<ScrapedList> {
        let value = page.eval(&self.scrape_js()).await?;
        if value.is_null() {
            return Ok(ScrapedList {
                source: ListSource::None,
                items: Vec::new(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Interpret one raw row. An item counts as passed when the status
    /// icon carries the done color OR the text contains a completion
    /// marker; the two signals may disagree and either one wins.
    pub fn classify(&self, raw: &RawItem) -> CourseItem {
        let passed = raw.icon_color == self.selectors.done_color
            || self
                .selectors
                .completion_markers
                .iter()
                .any(|marker| raw.text.contains(marker.as_str()));
        let kind = if raw.icon_type == self.selectors.supplement_icon_type {
            ItemKind::Supplement
        } else {
            ItemKind::Main
        };

        CourseItem {
            title: raw.title.clone(),
            passed,
            kind,
        }
    }

    pub fn classify_all(&self, list: &ScrapedList) -> Vec<CourseItem> {
        list.items.iter().map(|raw| self.classify(raw)).collect()
    }

    fn scrape_js(&self) -> String {
        format!(
            r#"(function() {{
  var source = 'required';
  var list = document.querySelector({required});
  if (!list || list.children.length === 0) {{
    source = 'supplementary';
    list = document.querySelector({supplementary});
  }}
  if (!list) {{ return {{ source: 'none', items: [] }}; }}
  var rows = [];
  var items = list.querySelectorAll(':scope > li');
  for (var i = 0; i < items.length; i++) {{
    var item = items[i];
    var label = item.querySelector({title});
    var icon = item.querySelector({icon});
    rows.push({{
      title: label && label.textContent ? label.textContent.trim() : '',
      iconColor: icon ? window.getComputedStyle(icon).color : '',
      iconType: icon ? (icon.getAttribute('type') || '') : '',
      text: item.textContent || ''
    }});
  }}
  return {{ source: source, items: rows }};
}})()"#,
            required = js_string(&self.selectors.required_list_selector()),
            supplementary = js_string(&self.selectors.supplementary_list_selector()),
            title = js_string(&self.selectors.item_title),
            icon = js_string(&self.selectors.item_icon),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> Scraper {
        Scraper::new(SelectorConfig::default())
    }

    fn raw(title: &str, color: &str, icon_type: &str, text: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            icon_color: color.to_string(),
            icon_type: icon_type.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn done_color_alone_marks_passed() {
        let item = scraper().classify(&raw("intro", "rgb(0, 197, 65)", "", "1. intro"));

        assert!(item.passed);
        assert_eq!(item.kind, ItemKind::Main);
    }

    #[test]
    fn completion_marker_alone_marks_passed() {
        let item = scraper().classify(&raw("intro", "rgb(0, 0, 0)", "", "1. intro 視聴済み"));

        assert!(item.passed);
    }

    #[test]
    fn second_marker_also_counts() {
        let item = scraper().classify(&raw("quiz", "", "", "2. quiz 理解済み"));

        assert!(item.passed);
    }

    #[test]
    fn neither_signal_means_pending() {
        let item = scraper().classify(&raw("intro", "rgb(128, 128, 128)", "", "1. intro 10:00"));

        assert!(!item.passed);
    }

    #[test]
    fn supplement_icon_type_sets_kind() {
        let item = scraper().classify(&raw("bonus", "", "movie-rounded-plus", "bonus"));

        assert_eq!(item.kind, ItemKind::Supplement);
    }

    #[test]
    fn scraped_list_deserializes_from_page_shape() {
        let value = serde_json::json!({
            "source": "required",
            "items": [
                { "title": "A", "iconColor": "rgb(0, 197, 65)", "iconType": "", "text": "A 視聴済み" },
                { "title": "B", "iconColor": "", "iconType": "movie-rounded-plus", "text": "B" }
            ]
        });

        let list: ScrapedList = serde_json::from_value(value).unwrap();

        assert_eq!(list.source, ListSource::Required);
        assert_eq!(list.items.len(), 2);

        let items = scraper().classify_all(&list);
        assert!(items[0].passed);
        assert_eq!(items[1].kind, ItemKind::Supplement);
    }

    #[test]
    fn fallback_source_deserializes() {
        let value = serde_json::json!({ "source": "supplementary", "items": [] });
        let list: ScrapedList = serde_json::from_value(value).unwrap();

        assert_eq!(list.source, ListSource::Supplementary);
    }

    #[test]
    fn scrape_js_embeds_both_list_selectors() {
        let js = scraper().scrape_js();

        assert!(js.contains("必修教材リスト"));
        assert!(js.contains("参考教材リスト"));
        assert!(js.contains(":scope > li"));
    }
}
