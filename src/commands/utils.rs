//! Shared utilities for commands

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use link_groups::links::{FileKv, LinkGroup, LinkGroupActions, LinkStore};
use link_groups::notify::{Notifier, TerminalNotifier};
use link_groups::opener::{BulkOpener, SystemOpener};

/// Everything a command needs, wired to the real filesystem and OS
pub struct App {
    pub actions: LinkGroupActions,
    pub opener: BulkOpener,
}

impl App {
    /// Open the store in `data_dir`
    pub fn open(data_dir: PathBuf, assume_yes: bool) -> Result<Self> {
        debug!("using data directory {}", data_dir.display());

        let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier::new(assume_yes));
        let store = LinkStore::open(Box::new(FileKv::new(data_dir)), Arc::clone(&notifier))
            .context("Failed to open link store")?;

        Ok(Self {
            actions: LinkGroupActions::new(store, Arc::clone(&notifier)),
            opener: BulkOpener::new(Arc::new(SystemOpener), notifier),
        })
    }

    /// Resolve a full group id from an id or a unique id prefix
    ///
    /// Unknown or ambiguous input is passed through unchanged so the
    /// operation itself reports it as not found.
    pub fn expand_group_id(&self, input: &str) -> Result<String> {
        let groups = self.actions.groups().context("Failed to read groups")?;
        Ok(expand_id(groups.iter().map(|g| g.id.as_str()), input))
    }

    /// Look up a group by id or unique id prefix
    pub fn find_group(&self, input: &str) -> Result<Option<LinkGroup>> {
        let id = self.expand_group_id(input)?;
        self.actions
            .get_group(&id)
            .context("Failed to read groups")
    }
}

/// Expand `input` to the single id it is a prefix of, if any
pub fn expand_id<'a>(ids: impl Iterator<Item = &'a str>, input: &str) -> String {
    let input = input.trim();
    let mut matches = Vec::new();

    for id in ids {
        if id == input {
            return id.to_string();
        }
        if !input.is_empty() && id.starts_with(input) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [only] => only.to_string(),
        _ => input.to_string(),
    }
}

/// First characters of an id, enough to type back
pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

/// Read text from a file, or from stdin when no file (or `-`) is given
pub fn read_text_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) if path != "-" => {
            fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            Ok(text)
        }
    }
}
