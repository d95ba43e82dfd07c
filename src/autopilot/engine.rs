use std::time::Instant;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::locator::{bootstrap_js, FlagEvent, Locator, ProbeSnapshot};
use super::navigator::{Navigate, SyntheticClickNavigator};
use super::overlay::Overlay;
use super::scraper::{ListSource, Scraper};
use super::state::{AutomatonState, BackgroundGate};
use crate::browser::{PageChannel, SessionManager};
use crate::config::Config;
use crate::course::{find_next_index, LessonPath};
use crate::error::Result;
use crate::settings::{Settings, SettingsStore};

const COMPLETION_MESSAGE: &str = "All videos have been completed.";

struct PendingRedirect {
    due: Instant,
    path: String,
}

/// The advancement automaton. Owns the page channel, all timers and
/// flags, and every decision; the locator, scraper and navigator only
/// ever run inside its tick.
pub struct Autopilot {
    session: SessionManager,
    config: Config,
    settings_store: SettingsStore,
    settings_rx: watch::Receiver<Settings>,
    settings: Settings,
    locator: Locator,
    scraper: Scraper,
    navigator: Box<dyn Navigate>,
    overlay: Overlay,
    state: AutomatonState,
    channel: Option<PageChannel>,
    document_token: Option<String>,
    overlay_generation: Option<u64>,
    pending_redirect: Option<PendingRedirect>,
}

impl Autopilot {
    pub fn new(session: SessionManager, config: Config, settings_store: SettingsStore) -> Self {
        let settings_rx = settings_store.subscribe();
        let settings = settings_store.current();
        let locator = Locator::new(&config.selectors);
        let scraper = Scraper::new(config.selectors.clone());
        let navigator: Box<dyn Navigate> =
            Box::new(SyntheticClickNavigator::new(&config.selectors));

        Self {
            session,
            config,
            settings_store,
            settings_rx,
            settings,
            locator,
            scraper,
            navigator,
            overlay: Overlay,
            state: AutomatonState::new(),
            channel: None,
            document_token: None,
            overlay_generation: None,
            pending_redirect: None,
        }
    }

    /// Attach to the course tab and run until Ctrl-C. One tick every
    /// poll interval; a failed tick drops the channel and the next tick
    /// re-attaches, so a closed or crashed tab is not fatal.
    pub async fn run(mut self) -> Result<()> {
        self.ensure_channel().await?;

        info!(
            "Extension is {}.",
            if self.settings.enabled { "enabled" } else { "disabled" }
        );
        info!("Watching for lesson videos. Press Ctrl-C to stop.");

        let mut ticker = tokio::time::interval(self.config.timing.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        debug!("Tick failed, will re-attach: {}", e);
                        self.channel = None;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping.");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        if self.settings_store.reload_if_changed().is_some() {
            debug!("Settings changed on disk.");
        }
        if self.settings_rx.has_changed().unwrap_or(false) {
            self.apply_settings_change().await;
        }

        self.ensure_channel().await?;
        let now = Instant::now();

        if let Some(redirect) = self.pending_redirect.take() {
            if now >= redirect.due {
                info!("Moving to the chapter page.");
                self.goto_path(&redirect.path).await?;
                return Ok(());
            }
            self.pending_redirect = Some(redirect);
        }

        let Some(snapshot) = self.probe_page().await? else {
            return Ok(());
        };

        if self.document_token.as_deref() != Some(snapshot.token.as_str()) {
            if self.document_token.is_some() {
                debug!("New document loaded, resetting.");
                self.state = AutomatonState::new();
            }
            self.document_token = Some(snapshot.token.clone());
            self.overlay_generation = None;
        }

        if !snapshot.events.is_empty() {
            self.apply_flag_events(&snapshot.events);
        }
        if snapshot.interacted {
            self.state.user_has_interacted = true;
        }

        if self.state.observe_generation(snapshot.generation) {
            debug!("Document structure changed, re-resolving player.");
            self.overlay_generation = None;
        }

        if !self.settings.hide_ui && self.overlay_generation != Some(snapshot.generation) {
            if let Some(page) = self.channel.as_mut() {
                self.overlay.ensure(page, self.settings).await?;
            }
            self.overlay_generation = Some(snapshot.generation);
        }

        if !self.state.check_path(&snapshot.path) {
            self.state.set_idle();
            return Ok(());
        }

        if !self.state.player_bound {
            self.state.enter_locating();
            let located = {
                let Some(page) = self.channel.as_mut() else {
                    return Ok(());
                };
                self.locator.locate(page).await?
            };

            match located {
                Some(status) => {
                    self.state.bind_player();
                    if !self.state.player_ever_seen {
                        info!("Video player found.");
                        self.state.player_ever_seen = true;
                    }

                    if self.config.behavior.require_user_gesture
                        && !self.state.user_has_interacted
                        && !self.settings.hide_ui
                    {
                        if let Some(page) = self.channel.as_mut() {
                            self.overlay.ensure_gesture(page).await?;
                        }
                    }

                    if status.ended || snapshot.ended_seen {
                        self.handle_video_end(now, &snapshot).await?;
                    } else if self.autoplay_allowed() && status.paused {
                        debug!("Starting playback.");
                        if let Some(page) = self.channel.as_mut() {
                            self.locator.play(page).await?;
                        }
                    }
                }
                None => {
                    if self
                        .state
                        .should_log_player_missing(now, self.config.timing.cooldown())
                    {
                        info!("Video player not found.");
                    }
                }
            }
            return Ok(());
        }

        match snapshot.player {
            None => {
                debug!("Cached player handle went stale.");
                self.state.unbind_player();
            }
            Some(_) if snapshot.ended_seen => {
                self.handle_video_end(now, &snapshot).await?;
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// End-of-video handler. Guard order matters and mirrors the
    /// behavior the host's users rely on: enabled gate, both cooldowns,
    /// then the background policy; only then is the signal consumed.
    async fn handle_video_end(&mut self, now: Instant, snapshot: &ProbeSnapshot) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        if !self
            .state
            .cooldowns_elapsed(now, self.config.timing.cooldown())
        {
            return Ok(());
        }
        self.state.note_end_handled(now);

        match self
            .state
            .gate_background(snapshot.hidden, self.settings.background_auto_play)
        {
            BackgroundGate::SkipLogged => {
                info!("Did not move because the tab is in the background.");
                return Ok(());
            }
            BackgroundGate::SkipSilent => return Ok(()),
            BackgroundGate::ProceedBackground => {
                info!("Playback proceeds in the background.");
            }
            BackgroundGate::Proceed => {}
        }

        info!("Video ended.");

        let scraped = {
            let Some(page) = self.channel.as_mut() else {
                return Ok(());
            };
            self.locator.clear_ended(page).await?;
            self.scraper.scrape(page).await?
        };

        if scraped.source == ListSource::None {
            error!("Course material list not found.");
            return Ok(());
        }

        let items = self.scraper.classify_all(&scraped);
        match find_next_index(&items) {
            Some(index) => {
                let outcome = {
                    let Some(page) = self.channel.as_mut() else {
                        return Ok(());
                    };
                    self.navigator.advance_to(page, index + 1).await
                };
                match outcome {
                    Ok(()) => {
                        info!("Moving to the next video: {}", items[index].title);
                        self.state.note_advanced(now);
                    }
                    Err(e) => {
                        // The list changed shape under us; the next
                        // structural change restarts locating.
                        error!("Failed to advance to position {}: {}", index + 1, e);
                    }
                }
            }
            None => self.complete_course(now, &snapshot.path).await?,
        }

        Ok(())
    }

    async fn complete_course(&mut self, now: Instant, path: &str) -> Result<()> {
        if !self.state.latch_completed() {
            return Ok(());
        }

        info!("{}", COMPLETION_MESSAGE);
        if let Some(page) = self.channel.as_mut() {
            if let Err(e) = self.overlay.alert(page, COMPLETION_MESSAGE).await {
                debug!("Completion alert failed: {}", e);
            }
        }

        if !self.settings.return_to_chapter {
            return Ok(());
        }
        let Some(lesson) = LessonPath::parse(path) else {
            debug!("Cannot derive the chapter URL from {}", path);
            return Ok(());
        };

        let delay = self.config.timing.redirect_delay();
        info!("Moving to the chapter page in {} seconds...", delay.as_secs());
        self.pending_redirect = Some(PendingRedirect {
            due: now + delay,
            path: lesson.chapter_path(),
        });

        Ok(())
    }

    fn autoplay_allowed(&self) -> bool {
        self.settings.auto_play_enabled
            && (!self.config.behavior.require_user_gesture || self.state.user_has_interacted)
    }

    /// Snapshot the page. `None` with a successful eval means the
    /// bootstrap is missing in this document; install it and report
    /// nothing for this tick.
    async fn probe_page(&mut self) -> Result<Option<ProbeSnapshot>> {
        let Some(page) = self.channel.as_mut() else {
            return Ok(None);
        };
        if let Some(snapshot) = self.locator.probe(page).await? {
            return Ok(Some(snapshot));
        }
        page.eval(bootstrap_js()).await?;
        Ok(None)
    }

    async fn ensure_channel(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }

        let page = self.session.find_course_page().await?;
        info!("Attached to tab: {}", page.url);

        let mut channel = self.session.open_channel(&page).await?;
        channel.install_on_new_document(bootstrap_js()).await?;
        channel.eval(bootstrap_js()).await?;

        self.channel = Some(channel);
        self.state = AutomatonState::new();
        self.document_token = None;
        self.overlay_generation = None;
        Ok(())
    }

    /// Relative navigation through the page itself, so the browser
    /// resolves the path against the current origin.
    async fn goto_path(&mut self, path: &str) -> Result<()> {
        let Some(page) = self.channel.as_mut() else {
            return Ok(());
        };
        let js = format!("window.location.href = {};", super::js_string(path));
        page.eval(&js).await?;
        Ok(())
    }

    /// Overlay toggles observed since the last probe. The buttons only
    /// record intents; this is the single place they become settings
    /// writes.
    fn apply_flag_events(&mut self, events: &[FlagEvent]) {
        for event in events {
            let result = self.settings_store.update(|s| match event.key.as_str() {
                "enabled" => s.enabled = event.value,
                "autoPlayEnabled" => s.auto_play_enabled = event.value,
                "backgroundAutoPlay" => s.background_auto_play = event.value,
                "returnToChapter" => s.return_to_chapter = event.value,
                "hideUI" => s.hide_ui = event.value,
                other => debug!("Ignoring unknown toggle: {}", other),
            });
            if let Err(e) = result {
                error!("Failed to persist settings: {}", e);
            }
        }
    }

    async fn apply_settings_change(&mut self) {
        let next = *self.settings_rx.borrow_and_update();
        let previous = std::mem::replace(&mut self.settings, next);
        if previous == next {
            return;
        }

        if previous.enabled != next.enabled {
            let message = if next.enabled {
                "Extension is now enabled"
            } else {
                "Extension is now disabled"
            };
            info!("{}", message);
            if let Some(page) = self.channel.as_mut() {
                if let Err(e) = self.overlay.alert(page, message).await {
                    debug!("Alert failed: {}", e);
                }
            }
        }

        if let Some(page) = self.channel.as_mut() {
            let result = if next.hide_ui {
                self.overlay.remove(page).await
            } else {
                self.overlay.ensure(page, next).await
            };
            if let Err(e) = result {
                debug!("Overlay update failed: {}", e);
            }
        }
    }
}
