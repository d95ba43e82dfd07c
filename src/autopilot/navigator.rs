use async_trait::async_trait;
use serde_json::Value;

use super::js_string;
use crate::browser::PageChannel;
use crate::config::SelectorConfig;
use crate::error::{ClasspilotError, Result};

/// Strategy for moving the host application to a material-list position.
/// The automaton only depends on this seam, so a different mechanism (a
/// documented navigation API, say) can be substituted without touching it.
#[async_trait]
pub trait Navigate: Send + Sync {
    /// Advance to the 1-based position within the active material list.
    async fn advance_to(&self, page: &mut PageChannel, position: usize) -> Result<()>;
}

/// Default driver: dispatch a synthetic bubbling, cancelable click on the
/// clickable child of the item, the same interaction the host wires its
/// own handlers to. Resolves the list with the scraper's fallback order.
pub struct SyntheticClickNavigator {
    required: String,
    supplementary: String,
}

impl SyntheticClickNavigator {
    pub fn new(selectors: &SelectorConfig) -> Self {
        Self {
            required: selectors.required_list_selector(),
            supplementary: selectors.supplementary_list_selector(),
        }
    }

    fn click_js(&self, position: usize) -> String {
        format!(
            r#"(function() {{
  var list = document.querySelector({required});
  if (!list || list.children.length === 0) {{
    list = document.querySelector({supplementary});
  }}
  if (!list) {{ return {{ clicked: false }}; }}
  var target = list.querySelector(':scope > li:nth-child({position}) div');
  if (!target) {{ return {{ clicked: false }}; }}
  target.dispatchEvent(new MouseEvent('click', {{ bubbles: true, cancelable: true, view: window }}));
  return {{ clicked: true }};
}})()"#,
            required = js_string(&self.required),
            supplementary = js_string(&self.supplementary),
            position = position,
        )
    }

    /// A missing position means the list changed shape since the scrape;
    /// that is fatal for this attempt, not something to retry.
    fn interpret(position: usize, value: &Value) -> Result<()> {
        if value.get("clicked").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(ClasspilotError::ItemNotFound(position))
        }
    }
}

#[async_trait]
impl Navigate for SyntheticClickNavigator {
    async fn advance_to(&self, page: &mut PageChannel, position: usize) -> Result<()> {
        let value = page.eval(&self.click_js(position)).await?;
        Self::interpret(position, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator() -> SyntheticClickNavigator {
        SyntheticClickNavigator::new(&SelectorConfig::default())
    }

    #[test]
    fn click_js_targets_the_requested_position() {
        let js = navigator().click_js(4);

        assert!(js.contains("li:nth-child(4) div"));
        assert!(js.contains("bubbles: true"));
        assert!(js.contains("cancelable: true"));
    }

    #[test]
    fn successful_dispatch_is_ok() {
        let value = serde_json::json!({ "clicked": true });

        assert!(SyntheticClickNavigator::interpret(2, &value).is_ok());
    }

    #[test]
    fn missing_position_is_item_not_found() {
        let value = serde_json::json!({ "clicked": false });
        let result = SyntheticClickNavigator::interpret(9, &value);

        assert!(matches!(result, Err(ClasspilotError::ItemNotFound(9))));
    }

    #[test]
    fn malformed_result_is_item_not_found() {
        let result = SyntheticClickNavigator::interpret(1, &Value::Null);

        assert!(matches!(result, Err(ClasspilotError::ItemNotFound(1))));
    }
}
