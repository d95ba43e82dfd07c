use serde::{Deserialize, Serialize};

/// DOM selection contracts for the host application.
///
/// These are the only parts of the page the rest of the crate knows
/// about. The host can change shape without notice, so every one of
/// them can be overridden from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Title attribute of the iframe embedding the lesson material
    #[serde(default = "default_frame_title")]
    pub frame_title: String,

    /// Accessible name of the required-materials list
    #[serde(default = "default_required_list_label")]
    pub required_list_label: String,

    /// Accessible name of the supplementary-materials list
    #[serde(default = "default_supplementary_list_label")]
    pub supplementary_list_label: String,

    /// Selector of the title node inside a list item
    #[serde(default = "default_item_title")]
    pub item_title: String,

    /// Selector of the status icon inside a list item
    #[serde(default = "default_item_icon")]
    pub item_icon: String,

    /// Computed icon color marking an item as done
    #[serde(default = "default_done_color")]
    pub done_color: String,

    /// Icon type attribute marking an item as supplementary
    #[serde(default = "default_supplement_icon_type")]
    pub supplement_icon_type: String,

    /// Text fragments marking an item as done ("watched" / "understood").
    /// Either the icon color or any of these counts; the two signals are
    /// not guaranteed to agree.
    #[serde(default = "default_completion_markers")]
    pub completion_markers: Vec<String>,
}

fn default_frame_title() -> String {
    "教材".to_string()
}

fn default_required_list_label() -> String {
    "必修教材リスト".to_string()
}

fn default_supplementary_list_label() -> String {
    "参考教材リスト".to_string()
}

fn default_item_title() -> String {
    "div div div span:nth-child(2)".to_string()
}

fn default_item_icon() -> String {
    "div > svg".to_string()
}

fn default_done_color() -> String {
    "rgb(0, 197, 65)".to_string()
}

fn default_supplement_icon_type() -> String {
    "movie-rounded-plus".to_string()
}

fn default_completion_markers() -> Vec<String> {
    vec!["視聴済み".to_string(), "理解済み".to_string()]
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            frame_title: default_frame_title(),
            required_list_label: default_required_list_label(),
            supplementary_list_label: default_supplementary_list_label(),
            item_title: default_item_title(),
            item_icon: default_item_icon(),
            done_color: default_done_color(),
            supplement_icon_type: default_supplement_icon_type(),
            completion_markers: default_completion_markers(),
        }
    }
}

impl SelectorConfig {
    pub fn frame_selector(&self) -> String {
        format!(r#"iframe[title="{}"]"#, self.frame_title)
    }

    pub fn required_list_selector(&self) -> String {
        format!(r#"ul[aria-label="{}"]"#, self.required_list_label)
    }

    pub fn supplementary_list_selector(&self) -> String {
        format!(r#"ul[aria-label="{}"]"#, self.supplementary_list_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selectors_target_the_known_host_markup() {
        let selectors = SelectorConfig::default();

        assert_eq!(selectors.frame_selector(), r#"iframe[title="教材"]"#);
        assert_eq!(
            selectors.required_list_selector(),
            r#"ul[aria-label="必修教材リスト"]"#
        );
        assert_eq!(selectors.done_color, "rgb(0, 197, 65)");
        assert_eq!(selectors.supplement_icon_type, "movie-rounded-plus");
        assert_eq!(selectors.completion_markers.len(), 2);
    }
}
