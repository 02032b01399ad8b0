// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.
//!
//! Each session launches its own browser process because the headless flag
//! is a launch-time property. Sessions are short-lived (one document) so the
//! extra process start is cheap next to the readiness budget.

use super::{Region, RenderMode, RenderedSession, Renderer};
use crate::error::{AcquireError, AcquireResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Explicit configuration
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. NORMAS_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("NORMAS_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. ~/.normas/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".normas/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".normas/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".normas/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".normas/chromium/chrome-linux64/chrome"),
                home.join(".normas/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 4. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 5. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    chrome_path: PathBuf,
}

impl ChromiumRenderer {
    /// Locate a Chromium binary. Fails with `BackendUnavailable` when none exists.
    pub fn new(explicit: Option<&Path>) -> AcquireResult<Self> {
        let chrome_path = find_chromium(explicit).ok_or_else(|| {
            AcquireError::BackendUnavailable(
                "Chromium not found; set NORMAS_CHROMIUM_PATH or install Chrome".into(),
            )
        })?;
        Ok(Self { chrome_path })
    }

    fn browser_config(&self, mode: RenderMode) -> AcquireResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--lang=pt-BR")
            .arg(format!("--user-agent={USER_AGENT}"));

        builder = match mode {
            RenderMode::Headless => builder.arg("--headless=new"),
            RenderMode::Visible => builder.with_head(),
        };

        builder
            .build()
            .map_err(|e| AcquireError::BackendUnavailable(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self, mode: RenderMode) -> AcquireResult<Box<dyn RenderedSession>> {
        let config = self.browser_config(mode)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AcquireError::BackendUnavailable(format!("failed to launch Chromium: {e}")))?;

        // Spawn the handler task
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AcquireError::BackendUnavailable(format!("failed to create page: {e}")))?;

        if let Err(e) = page.enable_stealth_mode_with_agent(USER_AGENT).await {
            tracing::debug!("stealth setup failed: {e}");
        }

        tracing::debug!(mode = mode.as_str(), "Chromium session opened");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            mode,
        }))
    }
}

/// A single Chromium page with its own browser process.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    mode: RenderMode,
}

/// Transport-level failures mean the browser is gone, not that the page is bad.
fn classify(err: CdpError) -> AcquireError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    let crashed = matches!(err, CdpError::Ws(_) | CdpError::ChannelSendError(_))
        || lower.contains("websocket")
        || lower.contains("channel")
        || lower.contains("connection closed")
        || lower.contains("target closed");
    if crashed {
        AcquireError::SessionCrash(msg)
    } else {
        AcquireError::ContentNotFound(msg)
    }
}

#[async_trait]
impl RenderedSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> AcquireResult<()> {
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => match classify(e) {
                crash @ AcquireError::SessionCrash(_) => Err(crash),
                other => Err(AcquireError::navigation(url, other)),
            },
            Err(_) => Err(AcquireError::navigation(
                url,
                format!("timed out after {timeout_ms}ms"),
            )),
        }
    }

    async fn evaluate_text(&self) -> AcquireResult<String> {
        let result = self
            .page
            .evaluate("document.body ? (document.body.innerText || document.body.textContent || '') : ''")
            .await
            .map_err(classify)?;

        result
            .into_value::<String>()
            .map_err(|e| AcquireError::ContentNotFound(format!("failed to convert page text: {e:?}")))
    }

    async fn find_regions(&self, selector: &str) -> AcquireResult<Vec<Region>> {
        let elements = match self.page.find_elements(selector).await {
            Ok(elements) => elements,
            // No match is reported as an error by CDP
            Err(CdpError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(classify(e)),
        };

        let mut regions = Vec::with_capacity(elements.len());
        for el in elements {
            let text = el.inner_text().await.map_err(classify)?.unwrap_or_default();
            let markup = el.outer_html().await.map_err(classify)?.unwrap_or_default();
            regions.push(Region::new(text, markup));
        }
        Ok(regions)
    }

    async fn current_location(&self) -> AcquireResult<String> {
        Ok(self.page.url().await.map_err(classify)?.unwrap_or_default())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> AcquireResult<()> {
        let input = self.page.find_element(selector).await.map_err(classify)?;
        input
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(classify)?;
        input.click().await.map_err(classify)?;
        input.type_str(value).await.map_err(classify)?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> AcquireResult<bool> {
        match self.page.find_element(selector).await {
            Ok(el) => {
                el.click().await.map_err(classify)?;
                Ok(true)
            }
            Err(CdpError::NotFound) => Ok(false),
            Err(e) => match classify(e) {
                crash @ AcquireError::SessionCrash(_) => Err(crash),
                _ => Ok(false),
            },
        }
    }

    async fn snapshot(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let params = ScreenshotParams::builder().full_page(true).build();
        match self.page.save_screenshot(params, path).await {
            Ok(_) => tracing::debug!("snapshot saved: {}", path.display()),
            Err(e) => tracing::debug!("snapshot failed for {}: {e}", path.display()),
        }
    }

    fn mode(&self) -> RenderMode {
        self.mode
    }

    async fn close(mut self: Box<Self>) {
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        tracing::debug!(mode = self.mode.as_str(), "Chromium session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_read_regions() {
        let renderer = ChromiumRenderer::new(None).expect("chromium not found");
        let mut session = renderer
            .open_session(RenderMode::Headless)
            .await
            .expect("failed to open session");

        session
            .navigate(
                "data:text/html,<main><h1>Hello</h1><p>World</p><a href='x.pdf'>pdf</a></main>",
                10000,
            )
            .await
            .expect("navigation failed");

        let text = session.evaluate_text().await.expect("text failed");
        assert!(text.contains("Hello"));

        let regions = session.find_regions("main").await.expect("regions failed");
        assert_eq!(regions.len(), 1);
        assert!(regions[0].raw_markup().contains("<h1>Hello</h1>"));
        assert_eq!(regions[0].href().as_deref(), Some("x.pdf"));

        let none = session.find_regions(".missing").await.expect("regions failed");
        assert!(none.is_empty());

        session.close().await;
    }
}
