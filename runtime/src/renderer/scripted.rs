// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory renderer driven by page scripts.
//!
//! Backs offline tests and fixture replays. A [`PageScript`] describes what a
//! URL renders: a sequence of text frames returned by successive
//! `evaluate_text` calls (the last frame repeats), the regions each selector
//! matches, and what clicking a selector navigates to. Every interaction is
//! appended to a shared [`SessionEvent`] log so callers can assert on exactly
//! which operations a component performed.

use super::{Region, RenderMode, RenderedSession, Renderer};
use crate::error::{AcquireError, AcquireResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// One observable interaction with a scripted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened(RenderMode),
    Navigated(String),
    TextRead,
    Filled { selector: String, value: String },
    Clicked(String),
    Snapshot(PathBuf),
    Closed,
}

/// What a URL renders.
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    frames: Vec<String>,
    regions: HashMap<String, Vec<Region>>,
    clicks: HashMap<String, String>,
    redirect: Option<String>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text returned by successive `evaluate_text` calls; the last one repeats.
    pub fn frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    /// A region matched by `selector`. May be called repeatedly.
    pub fn region(mut self, selector: &str, text: impl Into<String>, markup: impl Into<String>) -> Self {
        self.regions
            .entry(selector.to_string())
            .or_default()
            .push(Region::new(text, markup));
        self
    }

    /// Clicking `selector` loads `url`.
    pub fn on_click(mut self, selector: &str, url: &str) -> Self {
        self.clicks.insert(selector.to_string(), url.to_string());
        self
    }

    /// Report `url` as the location after navigating here.
    pub fn redirect_to(mut self, url: &str) -> Self {
        self.redirect = Some(url.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    pages: HashMap<(String, Option<RenderMode>), PageScript>,
    crashes: HashMap<String, u32>,
    unavailable: bool,
    events: Vec<SessionEvent>,
    sessions_opened: usize,
}

/// Renderer serving [`PageScript`]s from memory.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serve `script` at `url` in every mode.
    pub fn page(self, url: &str, script: PageScript) -> Self {
        self.lock().pages.insert((url.to_string(), None), script);
        self
    }

    /// Serve `script` at `url` only in `mode`; takes precedence over [`Self::page`].
    pub fn page_in_mode(self, url: &str, mode: RenderMode, script: PageScript) -> Self {
        self.lock().pages.insert((url.to_string(), Some(mode)), script);
        self
    }

    /// The next `times` navigations to `url` crash the session.
    pub fn crash_on(self, url: &str, times: u32) -> Self {
        self.lock().crashes.insert(url.to_string(), times);
        self
    }

    /// Every `open_session` call fails.
    pub fn unavailable(self) -> Self {
        self.lock().unavailable = true;
        self
    }

    /// All interactions so far, across sessions.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().events.clone()
    }

    /// URLs navigated to so far, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Navigated(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn open_session(&self, mode: RenderMode) -> AcquireResult<Box<dyn RenderedSession>> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(AcquireError::BackendUnavailable("scripted backend disabled".into()));
        }
        state.sessions_opened += 1;
        state.events.push(SessionEvent::Opened(mode));
        drop(state);

        Ok(Box::new(ScriptedSession {
            renderer: self.clone(),
            mode,
            location: "about:blank".to_string(),
            page: None,
            frame: Mutex::new(0),
        }))
    }
}

struct ScriptedSession {
    renderer: ScriptedRenderer,
    mode: RenderMode,
    location: String,
    page: Option<PageScript>,
    frame: Mutex<usize>,
}

impl ScriptedSession {
    fn record(&self, event: SessionEvent) {
        self.renderer.lock().events.push(event);
    }

    fn load(&mut self, url: &str) -> AcquireResult<()> {
        let mut state = self.renderer.lock();
        state.events.push(SessionEvent::Navigated(url.to_string()));

        if let Some(remaining) = state.crashes.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AcquireError::SessionCrash(format!("scripted crash at {url}")));
            }
        }

        let script = state
            .pages
            .get(&(url.to_string(), Some(self.mode)))
            .or_else(|| state.pages.get(&(url.to_string(), None)))
            .cloned()
            .ok_or_else(|| AcquireError::navigation(url, "unreachable"))?;
        drop(state);

        self.location = script.redirect.clone().unwrap_or_else(|| url.to_string());
        self.page = Some(script);
        *self.frame.lock().unwrap_or_else(|p| p.into_inner()) = 0;
        Ok(())
    }
}

#[async_trait]
impl RenderedSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> AcquireResult<()> {
        self.load(url)
    }

    async fn evaluate_text(&self) -> AcquireResult<String> {
        self.record(SessionEvent::TextRead);
        let Some(page) = &self.page else {
            return Ok(String::new());
        };
        let mut frame = self.frame.lock().unwrap_or_else(|p| p.into_inner());
        let text = page
            .frames
            .get(*frame)
            .or_else(|| page.frames.last())
            .cloned()
            .unwrap_or_default();
        *frame += 1;
        Ok(text)
    }

    async fn find_regions(&self, selector: &str) -> AcquireResult<Vec<Region>> {
        Ok(self
            .page
            .as_ref()
            .and_then(|p| p.regions.get(selector))
            .cloned()
            .unwrap_or_default())
    }

    async fn current_location(&self) -> AcquireResult<String> {
        Ok(self.location.clone())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> AcquireResult<()> {
        self.record(SessionEvent::Filled {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> AcquireResult<bool> {
        let target = self
            .page
            .as_ref()
            .and_then(|p| p.clicks.get(selector))
            .cloned();
        match target {
            Some(url) => {
                self.record(SessionEvent::Clicked(selector.to_string()));
                self.load(&url)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn snapshot(&self, path: &Path) {
        self.record(SessionEvent::Snapshot(path.to_path_buf()));
    }

    fn mode(&self) -> RenderMode {
        self.mode
    }

    async fn close(self: Box<Self>) {
        self.record(SessionEvent::Closed);
    }
}
