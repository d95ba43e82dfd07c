use super::js_string;
use crate::browser::PageChannel;
use crate::error::Result;
use crate::settings::Settings;

const BUTTON_STYLE: &str = "position: absolute; z-index: 99999; padding: 10px; \
background-color: #007bff; color: white; border: none; border-radius: 5px; \
cursor: pointer; display: flex; justify-content: space-between; \
align-items: center; right: 40px; min-width: 120px; max-width: 200px;";

/// On-page toggle buttons and alerts. Clicks are recorded into the
/// bootstrap's event queue and drained by the automaton on its next
/// probe; the buttons themselves never write settings.
pub struct Overlay;

impl Overlay {
    /// Create or refresh the toggle buttons. Idempotent, and careful to
    /// write the DOM only when a label actually changes so steady-state
    /// calls do not feed the mutation observer.
    pub async fn ensure(&self, page: &mut PageChannel, settings: Settings) -> Result<()> {
        page.eval(&ensure_js(settings)).await?;
        Ok(())
    }

    /// One-shot "Play Video" affordance for the user-gesture policy.
    pub async fn ensure_gesture(&self, page: &mut PageChannel) -> Result<()> {
        page.eval(&gesture_js()).await?;
        Ok(())
    }

    pub async fn remove(&self, page: &mut PageChannel) -> Result<()> {
        page.eval(REMOVE_JS).await?;
        Ok(())
    }

    /// Page alert, deferred so the evaluate call returns before the
    /// dialog blocks the page's main thread.
    pub async fn alert(&self, page: &mut PageChannel, message: &str) -> Result<()> {
        let js = format!(
            "(function() {{ setTimeout(function() {{ window.alert({}); }}, 0); }})()",
            js_string(message)
        );
        page.eval(&js).await?;
        Ok(())
    }
}

const REMOVE_JS: &str = r#"(function() {
  var ids = ['classpilot-autoplay', 'classpilot-enabled', 'classpilot-background', 'classpilot-gesture'];
  for (var i = 0; i < ids.length; i++) {
    var el = document.getElementById(ids[i]);
    if (el) { el.remove(); }
  }
})()"#;

fn ensure_js(settings: Settings) -> String {
    format!(
        r#"(function() {{
  var cp = window.__classpilot;
  if (!cp || !document.body) {{ return; }}
  var toggles = [
    {{ id: 'classpilot-autoplay', key: 'autoPlayEnabled', label: 'Automatic', bottom: 90, value: {autoplay} }},
    {{ id: 'classpilot-enabled', key: 'enabled', label: 'Extension', bottom: 50, value: {enabled} }},
    {{ id: 'classpilot-background', key: 'backgroundAutoPlay', label: 'Background', bottom: 10, value: {background} }}
  ];
  var render = function(button, label, value) {{
    button.innerHTML = '<span style="flex-grow: 1; text-align: left;">' + label +
      ':</span><span>' + (value ? 'ON' : 'OFF') + '</span>';
    button.dataset.value = value ? '1' : '';
  }};
  for (var i = 0; i < toggles.length; i++) {{
    (function(entry) {{
      var button = document.getElementById(entry.id);
      var fresh = false;
      if (!button) {{
        fresh = true;
        button = document.createElement('button');
        button.id = entry.id;
        button.style.cssText = {style};
        button.style.bottom = entry.bottom + 'px';
        button.addEventListener('click', function() {{
          var next = button.dataset.value !== '1';
          render(button, entry.label, next);
          cp.events.push({{ key: entry.key, value: next }});
        }});
        document.body.appendChild(button);
      }}
      var current = button.dataset.value === '1';
      if (fresh || current !== entry.value) {{
        render(button, entry.label, entry.value);
      }}
    }})(toggles[i]);
  }}
}})()"#,
        autoplay = settings.auto_play_enabled,
        enabled = settings.enabled,
        background = settings.background_auto_play,
        style = js_string(BUTTON_STYLE),
    )
}

fn gesture_js() -> String {
    format!(
        r#"(function() {{
  var cp = window.__classpilot;
  if (!cp || cp.interacted || !document.body) {{ return; }}
  if (document.getElementById('classpilot-gesture')) {{ return; }}
  var button = document.createElement('button');
  button.id = 'classpilot-gesture';
  button.style.cssText = {style};
  button.style.bottom = '130px';
  button.textContent = 'Play Video';
  button.addEventListener('click', function() {{
    cp.interacted = true;
    if (cp.player && cp.player.paused) {{
      var p = cp.player.play();
      if (p && p.catch) {{ p.catch(function() {{}}); }}
    }}
    button.remove();
  }});
  document.body.appendChild(button);
}})()"#,
        style = js_string(BUTTON_STYLE),
    )
}
