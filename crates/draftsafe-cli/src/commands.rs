//! Subcommand implementations.
//!
//! Every command opens a service over the on-disk store, recovers the key's
//! history, and tears the service down before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use draftsafe_core::storage::compute_file_hash;
use draftsafe_core::{
    AutoSaveConfig, AutoSaveService, FileStorage, SaveState, Snapshot, StorageScope, VersionId,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cli::{ConflictsArgs, InitArgs, KeyArgs, RestoreArgs, SaveArgs, WatchArgs};
use crate::render::{conflict_line, history_table, snapshot_text, state_summary};
use crate::settings::Settings;

/// Resolved settings plus the store directory in use.
pub struct Workspace {
    pub settings: Settings,
    pub store_dir: PathBuf,
}

impl Workspace {
    pub fn new(settings: Settings, store_override: Option<PathBuf>) -> Self {
        let store_dir = store_override.unwrap_or_else(|| settings.store_dir());
        Self {
            settings,
            store_dir,
        }
    }

    /// Service writing durable state under the store directory.
    pub fn open_service(&self) -> AutoSaveService {
        AutoSaveService::builder()
            .durable_storage(Arc::new(FileStorage::new(&self.store_dir)))
            .build()
    }

    pub fn config_for(&self, key: &str) -> AutoSaveConfig {
        self.settings.config_for(key)
    }
}

#[instrument(skip_all, fields(key = %args.key))]
pub async fn run_save(workspace: &Workspace, args: &SaveArgs) -> Result<SaveState> {
    let content = match (&args.content, &args.file) {
        (Some(json), _) => {
            let value: Value = serde_json::from_str(json).context("parse --content as JSON")?;
            Snapshot::new(value)
        }
        (None, Some(path)) => read_snapshot(path)?,
        (None, None) => bail!("either --content or --file is required"),
    };

    let service = workspace.open_service();
    service.recover(workspace.config_for(&args.key)).await?;
    let result = service.save(&args.key, content).await;
    let state = service.get_state(&args.key);
    service.destroy();
    result?;

    let state = state.context("document state missing after save")?;
    println!("{}", state_summary(&args.key, &state));
    Ok(state)
}

pub async fn run_restore(workspace: &Workspace, args: &RestoreArgs) -> Result<Snapshot> {
    let service = workspace.open_service();
    service.recover(workspace.config_for(&args.key)).await?;
    let version = args.version.as_deref().map(VersionId::from);
    let result = service.restore(&args.key, version.as_ref()).await;
    service.destroy();
    let snapshot = result?;

    let text = snapshot_text(&snapshot);
    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("write restored content to {}", path.display()))?;
            info!(path = %path.display(), "Restored content written");
        }
        None => println!("{text}"),
    }
    Ok(snapshot)
}

pub async fn run_history(workspace: &Workspace, args: &KeyArgs) -> Result<SaveState> {
    let service = workspace.open_service();
    let recovered = service.recover(workspace.config_for(&args.key)).await?;
    service.destroy();

    let state = recovered.unwrap_or_default();
    if state.versions.is_empty() {
        println!("{}: no saved versions", args.key);
    } else {
        println!("{}", state_summary(&args.key, &state));
        println!("{}", history_table(&state));
    }
    Ok(state)
}

/// Prints any conflicts and returns how many were found.
pub async fn run_conflicts(workspace: &Workspace, args: &ConflictsArgs) -> Result<usize> {
    let mut config = workspace.config_for(&args.key);
    if let Some(window_ms) = args.window_ms {
        config = config.with_conflict_window_ms(window_ms);
    }
    if !config.enable_conflict_resolution {
        warn!(key = %args.key, "Conflict detection is disabled in settings");
    }

    let service = workspace.open_service();
    service.recover(config).await?;
    let result = service.detect_conflicts(&args.key).await;
    service.destroy();
    let conflicts = result?;

    if conflicts.is_empty() {
        println!("{}: no conflicts", args.key);
    }
    for conflict in &conflicts {
        println!("{}", conflict_line(conflict));
    }
    Ok(conflicts.len())
}

pub async fn run_clear(workspace: &Workspace, args: &KeyArgs) -> Result<()> {
    let service = workspace.open_service();
    service.clear_persisted(&args.key, StorageScope::Durable).await;
    println!("{}: cleared", args.key);
    Ok(())
}

/// Write the effective settings to `path`, recording the store directory.
pub fn run_init(workspace: &Workspace, path: &Path, args: &InitArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let mut settings = workspace.settings.clone();
    settings.store.dir = Some(workspace.store_dir.clone());
    settings.save_to(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Auto-save `args.file` under `args.key` until Ctrl-C.
///
/// The file is polled for content changes; the service's timer decides when
/// to save. Pending changes are saved once more on shutdown.
#[instrument(skip_all, fields(key = %args.key))]
pub async fn run_watch(workspace: &Workspace, args: &WatchArgs) -> Result<SaveState> {
    if !args.file.is_file() {
        bail!("{} is not a file", args.file.display());
    }
    let mut config = workspace.config_for(&args.key);
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    let key = args.key.clone();

    let service = workspace.open_service();
    let source_path = args.file.clone();
    let recovered = service
        .recover_with_source(config, move || match read_snapshot(&source_path) {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(path = %source_path.display(), %error, "Cannot read watched file");
                None
            }
        })
        .await?;

    let listener = service.add_listener(&key, |state| {
        if let Some(state) = state
            && let Some(latest) = state.latest()
            && !state.has_unsaved_changes
        {
            info!(version = %latest.id, total = state.versions.len(), "Saved version");
        }
    });

    let saved_hash = recovered
        .as_ref()
        .and_then(SaveState::latest)
        .map(|version| version.content_hash.clone());
    let current = read_snapshot(&args.file)?;
    if saved_hash.as_deref() != Some(current.content_hash().as_str()) {
        debug!(key = %key, "Watched file differs from the last saved version");
        service.mark_as_changed(&key);
    }

    let mut last_hash = file_hash(&args.file).await.ok();
    let mut poll = tokio::time::interval(Duration::from_millis(args.poll_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    println!("Watching {} as '{key}' (Ctrl-C to stop)", args.file.display());

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match file_hash(&args.file).await {
                    Ok(hash) if last_hash.as_ref() != Some(&hash) => {
                        debug!(key = %key, hash = %hash, "Watched file changed");
                        last_hash = Some(hash);
                        service.mark_as_changed(&key);
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(path = %args.file.display(), %error, "Cannot hash watched file");
                    }
                }
            }
            signal = &mut shutdown => {
                signal.context("listen for Ctrl-C")?;
                break;
            }
        }
    }

    let pending = service
        .get_state(&key)
        .is_some_and(|state| state.has_unsaved_changes);
    if pending {
        service.save(&key, read_snapshot(&args.file)?).await?;
    }
    let state = service.get_state(&key).unwrap_or_default();
    listener.unsubscribe();
    service.destroy();
    println!("{}", state_summary(&key, &state));
    Ok(state)
}

/// File content as a snapshot: JSON when it parses, a string otherwise.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(match serde_json::from_str::<Value>(&text) {
        Ok(value) => Snapshot::new(value),
        Err(_) => Snapshot::from(text),
    })
}

async fn file_hash(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    let hash = tokio::task::spawn_blocking(move || compute_file_hash(&path))
        .await
        .context("hash task failed")??;
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_snapshot_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("doc.json");
        std::fs::write(&json, r#"{"title": "Draft"}"#).unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "not json").unwrap();

        assert_eq!(
            read_snapshot(&json).unwrap(),
            Snapshot::new(serde_json::json!({"title": "Draft"}))
        );
        assert_eq!(read_snapshot(&text).unwrap(), Snapshot::from("not json"));
    }
}
