mod engine;
mod locator;
mod navigator;
mod overlay;
mod scraper;
mod state;

pub use engine::Autopilot;
pub use locator::{bootstrap_js, FlagEvent, Locator, PlayerStatus, ProbeSnapshot};
pub use navigator::{Navigate, SyntheticClickNavigator};
pub use overlay::Overlay;
pub use scraper::{ListSource, RawItem, ScrapedList, Scraper};
pub use state::{AutomatonState, BackgroundGate, Phase};

/// Quote a string for embedding into injected JavaScript source.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

#[cfg(test)]
mod tests {
    use super::js_string;

    #[test]
    fn js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string("a\"b"), r#""a\"b""#);
        assert_eq!(js_string("a\nb"), r#""a\nb""#);
    }
}
