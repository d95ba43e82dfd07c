use serde::Deserialize;

use super::js_string;
use crate::browser::PageChannel;
use crate::config::SelectorConfig;
use crate::error::Result;

/// Page-side bootstrap. One namespaced object holds everything the
/// automaton needs to observe: the structural-change generation counter,
/// the cached player handle (with the iframe it was reached through),
/// the recorded ended signal, the user-gesture flag, and pending overlay
/// toggle events. Installed through Page.addScriptToEvaluateOnNewDocument
/// so it survives real navigations; `token` identifies the document so a
/// fresh page load is distinguishable from in-place mutation.
pub fn bootstrap_js() -> &'static str {
    r#"(function() {
  if (window.__classpilot) { return; }
  var cp = {
    token: Math.random().toString(36).slice(2),
    generation: 0,
    frame: null,
    player: null,
    endedSeen: false,
    interacted: false,
    events: []
  };
  window.__classpilot = cp;
  var observe = function() {
    if (!document.body) { setTimeout(observe, 50); return; }
    new MutationObserver(function() { cp.generation++; }).observe(document.body, { childList: true, subtree: true });
  };
  observe();
})();"#
}

const PROBE_JS: &str = r#"(function() {
  var cp = window.__classpilot;
  if (!cp) { return null; }
  var player = cp.player;
  if (player && (!player.isConnected || !cp.frame || !cp.frame.isConnected)) {
    cp.player = null;
    cp.frame = null;
    player = null;
  }
  return {
    token: cp.token,
    generation: cp.generation,
    path: window.location.pathname,
    hidden: document.hidden === true,
    interacted: cp.interacted === true,
    endedSeen: cp.endedSeen === true,
    player: player ? { ended: player.ended === true, paused: player.paused === true } : null,
    events: cp.events.splice(0, cp.events.length)
  };
})()"#;

const PLAY_JS: &str = r#"(function() {
  var cp = window.__classpilot;
  if (cp && cp.player) {
    var p = cp.player.play();
    if (p && p.catch) { p.catch(function() {}); }
  }
})()"#;

const CLEAR_ENDED_JS: &str = r#"(function() {
  var cp = window.__classpilot;
  if (cp) { cp.endedSeen = false; }
})()"#;

/// Playback state of the located media element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlayerStatus {
    pub ended: bool,
    pub paused: bool,
}

/// An overlay toggle the user clicked since the last probe.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagEvent {
    pub key: String,
    pub value: bool,
}

/// Everything the automaton reads from the page, captured in one round
/// trip per tick.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSnapshot {
    pub token: String,
    pub generation: u64,
    pub path: String,
    pub hidden: bool,
    pub interacted: bool,
    pub ended_seen: bool,
    pub player: Option<PlayerStatus>,
    #[serde(default)]
    pub events: Vec<FlagEvent>,
}

/// Finds the media element, which may live inside an asynchronously
/// loaded same-origin iframe, and keeps the page-side handle fresh.
pub struct Locator {
    frame_selector: String,
}

impl Locator {
    pub fn new(selectors: &SelectorConfig) -> Self {
        Self {
            frame_selector: selectors.frame_selector(),
        }
    }

    /// Snapshot the page state. `None` means the bootstrap is not
    /// installed in the current document yet.
    pub async fn probe(&self, page: &mut PageChannel) -> Result<Option<ProbeSnapshot>> {
        let value = page.eval(PROBE_JS).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Resolve the player: reuse the cached handle while it is still
    /// reachable, otherwise search the embedding frame's document. On
    /// first discovery the element is marked for inline muted autoplay
    /// with visible controls and a one-shot ended listener is attached.
    /// Cross-origin and not-yet-attached failures all come back as
    /// `None`; the iframe is routinely blank during navigation.
    pub async fn locate(&self, page: &mut PageChannel) -> Result<Option<PlayerStatus>> {
        let value = page.eval(&self.locate_js()).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Non-caching lookup used by `status`: reports whether a player is
    /// currently reachable without touching the page state.
    pub async fn peek(&self, page: &mut PageChannel) -> Result<Option<PlayerStatus>> {
        let value = page.eval(&self.peek_js()).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    pub async fn play(&self, page: &mut PageChannel) -> Result<()> {
        page.eval(PLAY_JS).await?;
        Ok(())
    }

    /// Consume the recorded ended signal after handling it.
    pub async fn clear_ended(&self, page: &mut PageChannel) -> Result<()> {
        page.eval(CLEAR_ENDED_JS).await?;
        Ok(())
    }

    fn locate_js(&self) -> String {
        format!(
            r#"(function() {{
  var cp = window.__classpilot;
  if (!cp) {{ return null; }}
  try {{
    if (cp.player && cp.frame && cp.frame.isConnected && cp.player.isConnected) {{
      return {{ ended: cp.player.ended === true, paused: cp.player.paused === true }};
    }}
    cp.frame = null;
    cp.player = null;
    cp.endedSeen = false;
    var frame = document.querySelector({frame});
    if (!frame) {{ return null; }}
    var doc = frame.contentDocument || (frame.contentWindow && frame.contentWindow.document);
    if (!doc) {{ return null; }}
    var video = doc.querySelector('video');
    if (!video) {{ return null; }}
    video.setAttribute('playsinline', '');
    video.setAttribute('muted', '');
    video.setAttribute('autoplay', '');
    video.setAttribute('controls', '');
    video.addEventListener('ended', function() {{ cp.endedSeen = true; }}, {{ once: true }});
    cp.frame = frame;
    cp.player = video;
    return {{ ended: video.ended === true, paused: video.paused === true }};
  }} catch (err) {{
    return null;
  }}
}})()"#,
            frame = js_string(&self.frame_selector)
        )
    }

    fn peek_js(&self) -> String {
        format!(
            r#"(function() {{
  try {{
    var frame = document.querySelector({frame});
    if (!frame) {{ return null; }}
    var doc = frame.contentDocument || (frame.contentWindow && frame.contentWindow.document);
    if (!doc) {{ return null; }}
    var video = doc.querySelector('video');
    if (!video) {{ return null; }}
    return {{ ended: video.ended === true, paused: video.paused === true }};
  }} catch (err) {{
    return null;
  }}
}})()"#,
            frame = js_string(&self.frame_selector)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_js_embeds_the_configured_frame_selector() {
        let locator = Locator::new(&SelectorConfig::default());
        let js = locator.locate_js();

        assert!(js.contains(r#""iframe[title=\"教材\"]""#));
        assert!(js.contains("contentDocument"));
        assert!(js.contains("addEventListener('ended'"));
    }

    #[test]
    fn probe_snapshot_deserializes() {
        let value = serde_json::json!({
            "token": "abc",
            "generation": 7,
            "path": "/courses/a/chapters/b/movie",
            "hidden": false,
            "interacted": true,
            "endedSeen": true,
            "player": { "ended": true, "paused": false },
            "events": [ { "key": "enabled", "value": false } ]
        });

        let snapshot: ProbeSnapshot = serde_json::from_value(value).unwrap();

        assert_eq!(snapshot.generation, 7);
        assert!(snapshot.ended_seen);
        assert!(snapshot.player.unwrap().ended);
        assert_eq!(snapshot.events.len(), 1);
        assert!(!snapshot.events[0].value);
    }

    #[test]
    fn probe_snapshot_tolerates_absent_player() {
        let value = serde_json::json!({
            "token": "abc",
            "generation": 0,
            "path": "/",
            "hidden": true,
            "interacted": false,
            "endedSeen": false,
            "player": null,
            "events": []
        });

        let snapshot: ProbeSnapshot = serde_json::from_value(value).unwrap();

        assert!(snapshot.player.is_none());
        assert!(snapshot.hidden);
    }
}
