// Headless browser publish agent
//
// The serve page opened by the browser grabs camera and microphone and
// publishes them into the video session named in its query string.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::agent::{PublishAgent, PublishHandle};

/// Flags that let an unattended browser capture media without prompts
const BROWSER_ARGS: &[&str] = &[
    "--headless",
    "--ignore-certificate-errors",
    "--use-fake-ui-for-media-stream",
    "--no-user-gesture-required",
    "--autoplay-policy=no-user-gesture-required",
    "--allow-http-screen-capture",
    "--enable-experimental-web-platform-features",
    "--auto-select-desktop-capture-source=Entire screen",
];

/// Configuration for the browser publish agent
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Browser executable
    pub browser_path: String,
    /// Local page that publishes the camera into a session
    pub serve_url: String,
    /// How long to wait for the browser to exit on stop
    pub stop_timeout_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            browser_path: "chromium-browser".to_string(),
            serve_url: "https://localhost:3000/serve".to_string(),
            stop_timeout_ms: 5_000,
        }
    }
}

struct BrowserInstance {
    /// `None` once stopped
    process: Option<Child>,
    profile: TempDir,
}

/// Publish agent that runs one headless browser per capture
pub struct BrowserPublishAgent {
    config: PublishConfig,
    instances: Mutex<HashMap<Uuid, BrowserInstance>>,
}

impl BrowserPublishAgent {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            instances: Mutex::new(HashMap::new()),
        }
    }

    fn page_url(&self, session_id: &str) -> String {
        format!("{}?session={}", self.config.serve_url, session_id)
    }

    async fn terminate(&self, mut process: Child) -> Result<()> {
        if process.try_wait()?.is_some() {
            return Ok(());
        }

        process.start_kill().context("Failed to signal browser")?;

        let stop_timeout = Duration::from_millis(self.config.stop_timeout_ms);
        match tokio::time::timeout(stop_timeout, process.wait()).await {
            Ok(status) => {
                let status = status.context("Failed to wait for browser exit")?;
                info!("Browser exited ({})", status);
                Ok(())
            }
            Err(_) => bail!("Browser did not exit within {:?}", stop_timeout),
        }
    }
}

#[async_trait::async_trait]
impl PublishAgent for BrowserPublishAgent {
    async fn start(&self, session_id: &str) -> Result<PublishHandle> {
        // Dropped (and deleted) automatically if the spawn below fails
        let profile = tempfile::Builder::new()
            .prefix("motion-cam-profile-")
            .tempdir()
            .context("Failed to create browser profile directory")?;

        let url = self.page_url(session_id);
        info!("Launching {} for {}", self.config.browser_path, url);

        let process = Command::new(&self.config.browser_path)
            .args(BROWSER_ARGS)
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.config.browser_path))?;

        let handle = PublishHandle::new(session_id);
        self.instances.lock().await.insert(
            handle.id,
            BrowserInstance {
                process: Some(process),
                profile,
            },
        );

        Ok(handle)
    }

    async fn stop(&self, handle: &PublishHandle) -> Result<()> {
        let process = {
            let mut instances = self.instances.lock().await;
            let instance = instances
                .get_mut(&handle.id)
                .with_context(|| format!("Unknown publish handle {}", handle.id))?;
            instance.process.take()
        };

        match process {
            Some(process) => self.terminate(process).await,
            None => Ok(()),
        }
    }

    async fn release(&self, handle: PublishHandle) -> Result<()> {
        let instance = self
            .instances
            .lock()
            .await
            .remove(&handle.id)
            .with_context(|| format!("Unknown publish handle {}", handle.id))?;

        if let Some(process) = instance.process {
            warn!("Releasing a capture that was not stopped; stopping it first");
            self.terminate(process).await?;
        }

        instance
            .profile
            .close()
            .context("Failed to remove browser profile directory")?;

        info!("Publish resources released for {}", handle.session_id);

        Ok(())
    }

    fn name(&self) -> &str {
        "headless browser"
    }
}
