// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendering session abstraction.
//!
//! Defines the `Renderer` and `RenderedSession` traits that abstract over
//! the browser engine (Chromium via chromiumoxide in production, a scripted
//! in-memory page for tests). The engine never touches the browser directly:
//! it navigates, reads visible text, inspects regions and, for the search
//! workflow, fills and clicks.
//!
//! Whatever backs a session must present as an ordinary interactive client;
//! the portal serves a script-less shell to obvious automation.

pub mod chromium;
pub mod scripted;

use crate::error::AcquireResult;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the browser window is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// No visible window.
    Headless,
    /// A real window; some documents only render correctly this way.
    Visible,
}

impl RenderMode {
    /// The other mode.
    pub fn alternate(self) -> Self {
        match self {
            Self::Headless => Self::Visible,
            Self::Visible => Self::Headless,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headless => "headless",
            Self::Visible => "visible",
        }
    }
}

/// A snapshot of one page region matched by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    text: String,
    markup: String,
}

impl Region {
    pub fn new(text: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: markup.into(),
        }
    }

    /// Visible text of the region.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Outer HTML of the region.
    pub fn raw_markup(&self) -> &str {
        &self.markup
    }

    /// First `href` in the region: the region's own when it is a link,
    /// otherwise the first descendant link.
    pub fn href(&self) -> Option<String> {
        let fragment = Html::parse_fragment(&self.markup);
        let selector = Selector::parse("[href]").ok()?;
        fragment
            .select(&selector)
            .find_map(|el| el.value().attr("href"))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
    }
}

/// A browser engine that can open sessions in a given mode.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh session. Failure here means the backend itself is
    /// unusable and surfaces as `BackendUnavailable`.
    async fn open_session(&self, mode: RenderMode) -> AcquireResult<Box<dyn RenderedSession>>;
}

/// A single controllable page.
#[async_trait]
pub trait RenderedSession: Send + Sync {
    /// Load `url`, waiting at most `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> AcquireResult<()>;
    /// Visible text of the whole document.
    async fn evaluate_text(&self) -> AcquireResult<String>;
    /// Regions matching a CSS selector, in document order.
    async fn find_regions(&self, selector: &str) -> AcquireResult<Vec<Region>>;
    /// Current location after redirects and client-side routing.
    async fn current_location(&self) -> AcquireResult<String>;
    /// Replace the value of the first input matching `selector`.
    async fn fill(&mut self, selector: &str, value: &str) -> AcquireResult<()>;
    /// Click the first element matching `selector`. `Ok(false)` when nothing matched.
    async fn click(&mut self, selector: &str) -> AcquireResult<bool>;
    /// Best-effort diagnostic capture. Never fails.
    async fn snapshot(&self, path: &Path);
    /// Mode this session was opened in.
    fn mode(&self) -> RenderMode;
    /// Release the underlying resources.
    async fn close(self: Box<Self>);
}
