//! Link commands - add, bulk import, edit, delete

use anyhow::Result;
use owo_colors::OwoColorize;

use super::utils::{self, App};
use link_groups::links::actions::{plan_link_edit, pluralize, AddLinksResult, EditLinksResult};
use link_groups::notify::Toast;
use link_groups::urls::{normalize_url, parse_urls_with_validation, title_from_url};

/// Execute the add-link command
pub fn add(app: &App, group: &str, url: &str, title: Option<&str>) -> Result<bool> {
    let id = app.expand_group_id(group)?;

    let title = match title {
        Some(t) => t.to_string(),
        None => title_from_url(normalize_url(url).as_deref().unwrap_or(url)),
    };

    let added = app.actions.add_link(&id, &title, url);
    if added {
        println!("{} {}", "Added:".green(), title);
    }
    Ok(added)
}

/// Execute the import command
pub fn import(app: &App, group: &str, file: Option<&str>) -> Result<bool> {
    let id = app.expand_group_id(group)?;
    let text = utils::read_text_input(file)?;
    let notifier = app.actions.notifier();

    if text.trim().is_empty() {
        notifier.toast(Toast::failure("No URLs provided"));
        return Ok(false);
    }

    let parsed = parse_urls_with_validation(&text);
    if parsed.valid.is_empty() {
        notifier.toast(Toast::failure("No valid URLs found"));
        return Ok(false);
    }

    let result = app.actions.add_links(&id, &parsed.valid);
    if result.added == 0 {
        return Ok(false);
    }

    notifier.toast(import_summary(result, parsed.invalid.len()));
    Ok(true)
}

/// Execute the edit-links command
///
/// The text is the group's complete desired URL list, one per line.
pub fn edit(app: &App, group: &str, file: Option<&str>) -> Result<bool> {
    let Some(current) = app.find_group(group)? else {
        app.actions.notifier().toast(Toast::failure("Group not found"));
        return Ok(false);
    };

    let text = utils::read_text_input(file)?;
    let plan = plan_link_edit(&current.links, &text);
    match app.actions.edit_links(&current.id, &plan.keep, &plan.add) {
        Some(result) => {
            app.actions.notifier().toast(edit_summary(result));
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Execute the delete-link command
pub fn delete(app: &App, group: &str, link: &str) -> Result<bool> {
    let Some(current) = app.find_group(group)? else {
        app.actions.notifier().toast(Toast::failure("Group not found"));
        return Ok(false);
    };

    let link_id = utils::expand_id(current.links.iter().map(|l| l.id.as_str()), link);
    Ok(app.actions.delete_link(&current.id, &link_id))
}

/// Execute the urls command: print a group's URLs, one per line
///
/// The output can be edited and fed back to `edit-links`.
pub fn urls(app: &App, group: &str) -> Result<bool> {
    match app.find_group(group)? {
        Some(current) => {
            for url in current.urls() {
                println!("{}", url);
            }
            Ok(true)
        }
        None => {
            app.actions.notifier().toast(Toast::failure("Group not found"));
            Ok(false)
        }
    }
}

/// Toast describing a finished import
pub fn import_summary(result: AddLinksResult, invalid: usize) -> Toast {
    let mut details = Vec::new();
    if invalid > 0 {
        details.push(format!("Skipped {}.", pluralize(invalid, "invalid URL")));
    }
    if result.failed > 0 {
        details.push(format!("Failed to import {}.", pluralize(result.failed, "URL")));
    }

    let toast = Toast::success(format!("Imported {}", pluralize(result.added, "link")));
    if details.is_empty() {
        toast
    } else {
        toast.with_message(details.join(" "))
    }
}

/// Toast describing a finished link edit
pub fn edit_summary(result: EditLinksResult) -> Toast {
    if result.removed == 0 && result.added == 0 {
        return Toast::success("No changes made");
    }

    let mut parts = Vec::new();
    if result.removed > 0 {
        parts.push(format!("Removed {}", pluralize(result.removed, "link")));
    }
    if result.added > 0 {
        parts.push(format!("Added {}", pluralize(result.added, "link")));
    }
    Toast::success(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_groups::links::store::STORAGE_KEY;
    use link_groups::links::{KeyValueStore, LinkGroupActions, LinkStore, MemoryKv};
    use link_groups::notify::{Notifier, TerminalNotifier};
    use link_groups::opener::{BulkOpener, SystemOpener};
    use std::io;
    use std::sync::Arc;

    /// Store that can be read but never written
    struct ReadOnlyKv(MemoryKv);

    impl KeyValueStore for ReadOnlyKv {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("read-only"))
        }
    }

    fn read_only_app() -> App {
        let db = r#"{"version":1,"groups":[{"id":"g1","title":"G","links":[],"browser":""}]}"#;
        let kv = ReadOnlyKv(MemoryKv::with_entries([(STORAGE_KEY, db)]));
        let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier::new(true));
        let store = LinkStore::open(Box::new(kv), Arc::clone(&notifier)).unwrap();
        App {
            actions: LinkGroupActions::new(store, Arc::clone(&notifier)),
            opener: BulkOpener::new(Arc::new(SystemOpener), notifier),
        }
    }

    #[test]
    fn test_edit_reports_failed_write() {
        let app = read_only_app();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"https://a.com\n").unwrap();

        let ok = edit(&app, "g1", Some(file.path().to_str().unwrap())).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_import_summary_clean() {
        let result = AddLinksResult {
            added: 3,
            failed: 0,
        };
        let toast = import_summary(result, 0);
        assert_eq!(toast.title, "Imported 3 links");
        assert_eq!(toast.message, None);
    }

    #[test]
    fn test_import_summary_with_skips() {
        let result = AddLinksResult {
            added: 1,
            failed: 2,
        };
        let toast = import_summary(result, 1);
        assert_eq!(toast.title, "Imported 1 link");
        assert_eq!(
            toast.message.as_deref(),
            Some("Skipped 1 invalid URL. Failed to import 2 URLs.")
        );
    }

    #[test]
    fn test_edit_summary() {
        assert_eq!(edit_summary(EditLinksResult::default()).title, "No changes made");
        let both = EditLinksResult {
            removed: 1,
            added: 2,
        };
        assert_eq!(edit_summary(both).title, "Removed 1 link, Added 2 links");

        let added_only = EditLinksResult {
            removed: 0,
            added: 1,
        };
        assert_eq!(edit_summary(added_only).title, "Added 1 link");
    }
}
