// Integration tests for the JSON file session store

use anyhow::Result;
use motion_cam::{JsonFileSessionStore, SessionStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_records_survive_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("sessions.json");

    let store = JsonFileSessionStore::open(&path).await?;
    let first = store.create_active("abc").await?;
    store.mark_inactive(&first).await?;
    let second = store.create_active("def").await?;
    drop(store);

    let reopened = JsonFileSessionStore::open(&path).await?;
    let records = reopened.list().await?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].external_session_id, "abc");
    assert!(!records[0].active);
    assert_eq!(records[1], second);

    let active = reopened.most_recent_active().await?.unwrap();
    assert_eq!(active.external_session_id, "def");

    Ok(())
}

#[tokio::test]
async fn test_open_creates_parent_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("sessions.json");

    let store = JsonFileSessionStore::open(&path).await?;
    assert!(store.list().await?.is_empty());
    assert!(!path.exists(), "Nothing is written until the first mutation");

    store.create_active("abc").await?;
    assert!(path.exists());

    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("sessions.json");
    std::fs::write(&path, "not json")?;

    assert!(JsonFileSessionStore::open(&path).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_no_active_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = JsonFileSessionStore::open(temp_dir.path().join("sessions.json")).await?;

    let record = store.create_active("abc").await?;
    store.mark_inactive(&record).await?;

    assert!(store.most_recent_active().await?.is_none());

    Ok(())
}
