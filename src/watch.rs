use std::fs;
use std::io::Write;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};

use crate::cli::OutputFormat;
use crate::config;
use crate::report::{self, Engines};
use crate::storage::KeyValueStore;

/// Render every model, then re-render whenever saved defaults or the config
/// file change.
pub fn run(store: &dyn KeyValueStore, format: OutputFormat, interval: Duration) -> Result<()> {
    render(store, format)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                    let _ = tx.send(());
                }
                _ => {}
            }
        }
    })?;

    let mut watch_paths = Vec::new();
    if let Some(dir) = store.location() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        watch_paths.push(dir);
    }
    if let Some(dir) = config::config_path().and_then(|p| p.parent().map(|d| d.to_path_buf())) {
        if dir.is_dir() {
            watch_paths.push(dir);
        }
    }
    if watch_paths.is_empty() {
        anyhow::bail!("Nothing to watch: defaults are not stored on disk.");
    }

    for path in &watch_paths {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
    }

    // Event loop with debounce
    while let Ok(()) = rx.recv() {
        let deadline = Instant::now() + interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(()) => continue,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        render(store, format)?;
    }

    Ok(())
}

/// Reload config and saved defaults from scratch, then print every model.
fn render(store: &dyn KeyValueStore, format: OutputFormat) -> Result<()> {
    let card = config::load_config().rate_card();
    let engines = Engines::new(&card);
    let bundles = report::load_bundles(store);
    let report = engines.quote_all(&bundles);

    if format == OutputFormat::Table {
        // Clear screen and move cursor to top-left
        print!("\x1b[2J\x1b[H");
        std::io::stdout().flush()?;
    }
    report::print_all(&engines, &report, format);
    Ok(())
}
