//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temporary file and renaming it over the original replace
//! the inode, and a watch on the old inode goes quiet after the first save.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;

/// Emits a validated [`GateConfig`] each time the config file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (dir, file_name) = split_target(&self.path)?;
        let Self { path, update_tx } = self;
        let config_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_config(&event, &file_name) => {
                    tracing::debug!(kind = ?event.kind, "Config file changed");
                    reload(&config_path, &update_tx);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// The directory to watch and the file name to filter its events on.
fn split_target(path: &Path) -> Result<(PathBuf, OsString), notify::Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| notify::Error::generic("config path has no file name"))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

fn touches_config(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<GateConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(users = config.users.len(), "Config reloaded");
            let _ = tx.send(config);
        }
        // Also hit mid-save, when the file is briefly missing
        Err(e) => tracing::warn!(error = %e, "Config reload failed, keeping current configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};

    fn users_file(name: &str) -> String {
        format!("[[users]]\nusername = \"{}\"\npassword = \"pw\"\n", name)
    }

    /// Save the way vim and most IDEs do: write a sibling, rename it over.
    fn save_by_rename(path: &Path, contents: &str) {
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, contents).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    async fn wait_for_user(updates: &mut mpsc::UnboundedReceiver<GateConfig>, name: &str) -> bool {
        tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(update) = updates.recv().await {
                if update.users.iter().any(|u| u.username == name) {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false)
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "session-gate-{}-{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_split_target() {
        let (dir, name) = split_target(Path::new("/etc/gate/gate.toml")).unwrap();
        assert_eq!(dir, PathBuf::from("/etc/gate"));
        assert_eq!(name, OsString::from("gate.toml"));

        let (dir, _) = split_target(Path::new("gate.toml")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
    }

    #[test]
    fn test_event_filter() {
        let name = OsString::from("gate.toml");
        let event = |kind, path: &str| Event::new(kind).add_path(PathBuf::from(path));

        assert!(touches_config(
            &event(EventKind::Modify(ModifyKind::Any), "/cfg/gate.toml"),
            &name
        ));
        assert!(touches_config(
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                "/cfg/gate.toml"
            ),
            &name
        ));
        assert!(!touches_config(
            &event(EventKind::Create(CreateKind::File), "/cfg/gate.toml.tmp"),
            &name
        ));
        assert!(!touches_config(
            &event(EventKind::Remove(notify::event::RemoveKind::File), "/cfg/gate.toml"),
            &name
        ));
    }

    #[tokio::test]
    async fn test_in_place_rewrite_emits_config() {
        let dir = temp_dir("watch-write");
        let path = dir.join("gate.toml");
        std::fs::write(&path, users_file("a")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(&path, users_file("b")).unwrap();
        // A rewrite may surface as several events (truncate, then write)
        assert!(wait_for_user(&mut updates, "b").await);

        std::fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_rename_saves_keep_reloading() {
        let dir = temp_dir("watch-rename");
        let path = dir.join("gate.toml");
        std::fs::write(&path, users_file("a")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        save_by_rename(&path, &users_file("b"));
        assert!(wait_for_user(&mut updates, "b").await);

        save_by_rename(&path, &users_file("c"));
        assert!(wait_for_user(&mut updates, "c").await);

        std::fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
