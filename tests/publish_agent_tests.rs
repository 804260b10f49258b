// Integration tests for the headless browser publish agent
//
// A shell script stands in for the browser binary.

#![cfg(unix)]

use anyhow::Result;
use motion_cam::publish::{BrowserPublishAgent, PublishAgent, PublishConfig, PublishHandle};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn fake_browser(dir: &Path) -> Result<String> {
    let path = dir.join("fake-browser");
    fs::write(&path, "#!/bin/sh\nexec sleep 30\n")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path.display().to_string())
}

fn agent(browser_path: String) -> BrowserPublishAgent {
    BrowserPublishAgent::new(PublishConfig {
        browser_path,
        serve_url: "https://localhost:3000/serve".to_string(),
        stop_timeout_ms: 2_000,
    })
}

#[tokio::test]
async fn test_stop_then_release_long_running_browser() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agent = agent(fake_browser(temp_dir.path())?);

    let handle = agent.start("abc").await?;
    assert_eq!(handle.session_id, "abc");

    agent.stop(&handle).await?;
    // Stopping twice is harmless
    agent.stop(&handle).await?;
    agent.release(handle.clone()).await?;

    // The handle is gone after release
    assert!(agent.release(handle).await.is_err());

    // Release without stop still terminates the process
    let handle = agent.start("def").await?;
    agent.release(handle).await?;

    Ok(())
}

#[tokio::test]
async fn test_browser_that_already_exited() -> Result<()> {
    let agent = agent("true".to_string());

    let handle = agent.start("abc").await?;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    agent.stop(&handle).await?;
    agent.release(handle).await?;

    Ok(())
}

#[tokio::test]
async fn test_missing_browser_fails_to_start() {
    let agent = agent("/nonexistent/chromium-browser".to_string());

    let err = agent.start("abc").await.unwrap_err();
    assert!(err.to_string().contains("Failed to launch"));
}

#[tokio::test]
async fn test_unknown_handle() {
    let agent = agent("true".to_string());
    let handle = PublishHandle::new("never-started");

    assert!(agent.stop(&handle).await.is_err());
    assert!(agent.release(handle).await.is_err());
}
