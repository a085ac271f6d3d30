//! Group and link operations
//!
//! Every operation runs as one atomic update on the [`LinkStore`]. Expected
//! failures (missing group or link, bad input) and persistence errors are
//! reported through the [`Notifier`] and the return value; none of them are
//! returned as errors.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::model::{Browser, LinkGroup, LinkItem};
use super::store::LinkStore;
use crate::error::StoreError;
use crate::notify::{Confirmation, Notifier, Toast};
use crate::urls::{normalize_url, title_from_url};

/// Outcome of a bulk import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddLinksResult {
    pub added: usize,
    pub failed: usize,
}

/// Outcome of reconciling a group against an edited URL list
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EditLinksResult {
    pub removed: usize,
    pub added: usize,
}

/// URLs to keep and to add, derived from an edited URL list
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkEditPlan {
    pub keep: Vec<String>,
    pub add: Vec<String>,
}

enum LinkLookup {
    GroupMissing,
    LinkMissing,
    Deleted,
}

/// Group/link operations bound to a store and a notifier
#[derive(Clone)]
pub struct LinkGroupActions {
    store: LinkStore,
    notifier: Arc<dyn Notifier>,
}

impl LinkGroupActions {
    pub fn new(store: LinkStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &LinkStore {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// All groups, newest first
    pub fn groups(&self) -> Result<Vec<LinkGroup>, StoreError> {
        Ok(self.store.load()?.groups)
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<LinkGroup>, StoreError> {
        Ok(self.store.load()?.group(group_id).cloned())
    }

    /// Create a group at the top of the list
    pub fn add_group(&self, title: &str, browser: Browser) -> Option<LinkGroup> {
        let title = self.require_title(title)?;

        let group = LinkGroup {
            id: new_id(),
            title,
            links: Vec::new(),
            browser,
        };

        let inserted = group.clone();
        match self.store.atomic_modify(move |db| db.groups.insert(0, inserted)) {
            Ok(()) => {
                debug!(group = %group.id, "group created");
                Some(group)
            }
            Err(e) => {
                self.failed("Failed to create group", &e);
                None
            }
        }
    }

    /// Delete a group and its links after confirmation
    pub fn delete_group(&self, group_id: &str) -> bool {
        let group = match self.get_group(group_id) {
            Ok(Some(group)) => group,
            Ok(None) => {
                self.notifier.toast(Toast::failure("Group not found"));
                return false;
            }
            Err(e) => {
                self.failed("Failed to delete group", &e);
                return false;
            }
        };

        let confirmed = self.notifier.confirm(&Confirmation {
            title: "Delete group?".to_string(),
            message: format!(
                "This will delete \"{}\" and {}.",
                group.title,
                pluralize(group.links.len(), "link")
            ),
            action: "Delete Group".to_string(),
        });
        if !confirmed {
            return false;
        }

        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| {
            let before = db.groups.len();
            db.groups.retain(|g| g.id != id);
            db.groups.len() != before
        });

        self.report_found(result, "Group deleted", "Failed to delete group")
    }

    /// Rename a group and change its browser
    pub fn update_group(&self, group_id: &str, title: &str, browser: Browser) -> bool {
        let Some(title) = self.require_title(title) else {
            return false;
        };

        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| match db.group_mut(&id) {
            Some(group) => {
                group.title = title;
                group.browser = browser;
                true
            }
            None => false,
        });

        self.report_found(result, "Group updated", "Failed to update group")
    }

    /// Change only the browser a group opens in
    pub fn update_group_browser(&self, group_id: &str, browser: Browser) -> bool {
        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| match db.group_mut(&id) {
            Some(group) => {
                group.browser = browser;
                true
            }
            None => false,
        });

        self.report_found(result, "Browser updated", "Failed to update browser")
    }

    /// Add one link at the top of a group
    ///
    /// The URL must normalize to an absolute http(s) URL; nothing is written
    /// otherwise.
    pub fn add_link(&self, group_id: &str, title: &str, url: &str) -> bool {
        let Some(url) = normalize_url(url) else {
            self.notifier
                .toast(Toast::failure("Invalid URL").with_message("Use a valid http(s) URL."));
            return false;
        };
        let Some(title) = self.require_title(title) else {
            return false;
        };

        let link = LinkItem {
            id: new_id(),
            title,
            url,
        };
        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| match db.group_mut(&id) {
            Some(group) => {
                group.links.insert(0, link);
                true
            }
            None => false,
        });

        match result {
            Ok(true) => true,
            Ok(false) => {
                self.notifier.toast(Toast::failure("Group not found"));
                false
            }
            Err(e) => {
                self.failed("Failed to add link", &e);
                false
            }
        }
    }

    /// Add many links at the top of a group, titles derived from the URLs
    ///
    /// URLs are stored as given; callers validate them beforehand. If the
    /// group is missing or the write fails, every URL counts as failed.
    pub fn add_links(&self, group_id: &str, urls: &[String]) -> AddLinksResult {
        if urls.is_empty() {
            return AddLinksResult::default();
        }

        let links: Vec<LinkItem> = urls
            .iter()
            .map(|url| LinkItem {
                id: new_id(),
                title: title_from_url(url),
                url: url.clone(),
            })
            .collect();

        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| match db.group_mut(&id) {
            Some(group) => {
                group.links.splice(0..0, links);
                true
            }
            None => false,
        });

        let all_failed = AddLinksResult {
            added: 0,
            failed: urls.len(),
        };
        match result {
            Ok(true) => AddLinksResult {
                added: urls.len(),
                failed: 0,
            },
            Ok(false) => {
                self.notifier.toast(Toast::failure("Group not found"));
                all_failed
            }
            Err(e) => {
                self.failed("Failed to import links", &e);
                all_failed
            }
        }
    }

    /// Remove one link from a group
    pub fn delete_link(&self, group_id: &str, link_id: &str) -> bool {
        let gid = group_id.to_string();
        let lid = link_id.to_string();
        let result = self.store.atomic_modify(move |db| {
            let Some(group) = db.group_mut(&gid) else {
                return LinkLookup::GroupMissing;
            };
            let before = group.links.len();
            group.links.retain(|l| l.id != lid);
            if group.links.len() == before {
                LinkLookup::LinkMissing
            } else {
                LinkLookup::Deleted
            }
        });

        match result {
            Ok(LinkLookup::Deleted) => {
                self.notifier.toast(Toast::success("Link deleted"));
                true
            }
            Ok(LinkLookup::GroupMissing) => {
                self.notifier.toast(Toast::failure("Group not found"));
                false
            }
            Ok(LinkLookup::LinkMissing) => {
                self.notifier.toast(Toast::failure("Link not found"));
                false
            }
            Err(e) => {
                self.failed("Failed to delete link", &e);
                false
            }
        }
    }

    /// Reconcile a group's links against a desired URL list
    ///
    /// For each URL value, the first N existing links with that URL survive in
    /// their original order, where N is how often the URL occurs in
    /// `keep_urls`. Fresh links for `add_urls` go on top.
    ///
    /// Returns `None` when the group is missing or the write fails; the
    /// failure has already been reported.
    pub fn edit_links(
        &self,
        group_id: &str,
        keep_urls: &[String],
        add_urls: &[String],
    ) -> Option<EditLinksResult> {
        let mut keep_counts: HashMap<String, usize> = HashMap::new();
        for url in keep_urls {
            *keep_counts.entry(url.clone()).or_default() += 1;
        }

        let new_links: Vec<LinkItem> = add_urls
            .iter()
            .map(|url| LinkItem {
                id: new_id(),
                title: title_from_url(url),
                url: url.clone(),
            })
            .collect();
        let added = new_links.len();

        let id = group_id.to_string();
        let result = self.store.atomic_modify(move |db| {
            let group = db.group_mut(&id)?;

            let mut seen: HashMap<&str, usize> = HashMap::new();
            let mut kept = Vec::with_capacity(group.links.len());
            for link in &group.links {
                let count = seen.entry(link.url.as_str()).or_default();
                if *count < keep_counts.get(&link.url).copied().unwrap_or(0) {
                    *count += 1;
                    kept.push(link.clone());
                }
            }

            let removed = group.links.len() - kept.len();
            let mut links = new_links;
            links.extend(kept);
            group.links = links;
            Some(removed)
        });

        match result {
            Ok(Some(removed)) => Some(EditLinksResult { removed, added }),
            Ok(None) => {
                self.notifier.toast(Toast::failure("Group not found"));
                None
            }
            Err(e) => {
                self.failed("Failed to edit links", &e);
                None
            }
        }
    }

    fn require_title(&self, title: &str) -> Option<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            self.notifier.toast(Toast::failure("Title is required"));
            return None;
        }
        Some(trimmed.to_string())
    }

    fn report_found(&self, result: Result<bool, StoreError>, success: &str, failure: &str) -> bool {
        match result {
            Ok(true) => {
                self.notifier.toast(Toast::success(success));
                true
            }
            Ok(false) => {
                self.notifier.toast(Toast::failure("Group not found"));
                false
            }
            Err(e) => {
                self.failed(failure, &e);
                false
            }
        }
    }

    fn failed(&self, title: &str, error: &StoreError) {
        tracing::warn!("{}: {}", title, error);
        self.notifier
            .toast(Toast::failure(title).with_message(error.to_string()));
    }
}

/// Split an edited one-URL-per-line text into URLs to keep and to add
///
/// Lines that do not normalize are dropped. A URL already present in `links`
/// is kept (as often as it appears); anything else is added.
pub fn plan_link_edit(links: &[LinkItem], text: &str) -> LinkEditPlan {
    let existing: HashSet<&str> = links.iter().map(|l| l.url.as_str()).collect();

    let (keep, add): (Vec<String>, Vec<String>) = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(normalize_url)
        .partition(|url| existing.contains(url.as_str()));

    LinkEditPlan { keep, add }
}

/// `1 link`, `2 links`
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::kv::{KeyValueStore, MemoryKv};
    use crate::links::model::Database;
    use crate::links::store::{BACKUP_STORAGE_KEY, STORAGE_KEY};
    use crate::notify::testing::RecordingNotifier;
    use std::io;

    struct Fixture {
        actions: LinkGroupActions,
        kv: Arc<MemoryKv>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture_with(confirm: bool) -> Fixture {
        let kv = Arc::new(MemoryKv::new());
        let notifier = Arc::new(RecordingNotifier::new(confirm));
        let store = LinkStore::open(Box::new(Arc::clone(&kv)), notifier.clone()).unwrap();
        Fixture {
            actions: LinkGroupActions::new(store, notifier.clone()),
            kv,
            notifier,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(true)
    }

    fn link(id: &str, url: &str) -> LinkItem {
        LinkItem {
            id: id.to_string(),
            title: id.to_string(),
            url: url.to_string(),
        }
    }

    fn seed_group(f: &Fixture, links: Vec<LinkItem>) -> String {
        let group = f.actions.add_group("Seed", Browser::SystemDefault).unwrap();
        let id = group.id.clone();
        let gid = id.clone();
        f.actions
            .store()
            .atomic_modify(move |db| {
                db.group_mut(&gid).unwrap().links = links;
            })
            .unwrap();
        id
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_group_prepends() {
        let f = fixture();
        let first = f.actions.add_group("First", Browser::SystemDefault).unwrap();
        let second = f.actions.add_group("  Second  ", Browser::Arc).unwrap();

        let groups = f.actions.groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, second.id);
        assert_eq!(groups[0].title, "Second");
        assert_eq!(groups[0].browser, Browser::Arc);
        assert_eq!(groups[1].id, first.id);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_add_group_requires_title() {
        let f = fixture();
        assert!(f.actions.add_group("   ", Browser::SystemDefault).is_none());
        assert!(f.actions.groups().unwrap().is_empty());
        assert_eq!(f.notifier.toast_titles(), vec!["Title is required"]);
    }

    #[test]
    fn test_delete_missing_group_leaves_database_unchanged() {
        let f = fixture();
        f.actions.add_group("Keep", Browser::SystemDefault).unwrap();
        let primary = f.kv.get(STORAGE_KEY).unwrap();
        let backup = f.kv.get(BACKUP_STORAGE_KEY).unwrap();

        assert!(!f.actions.delete_group("missing"));

        assert_eq!(f.kv.get(STORAGE_KEY).unwrap(), primary);
        assert_eq!(f.kv.get(BACKUP_STORAGE_KEY).unwrap(), backup);
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group not found");
        assert!(f.notifier.confirmations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_group_confirms_and_removes() {
        let f = fixture();
        let id = seed_group(&f, vec![link("a", "https://a.com/")]);
        f.actions.add_group("Other", Browser::SystemDefault).unwrap();

        assert!(f.actions.delete_group(&id));

        let groups = f.actions.groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "Other");

        let confirmations = f.notifier.confirmations.lock().unwrap();
        assert_eq!(confirmations.len(), 1);
        assert_eq!(confirmations[0].message, "This will delete \"Seed\" and 1 link.");
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group deleted");
    }

    #[test]
    fn test_delete_group_declined() {
        let f = fixture_with(false);
        let group = f.actions.add_group("Keep", Browser::SystemDefault).unwrap();
        assert!(!f.actions.delete_group(&group.id));
        assert_eq!(f.actions.groups().unwrap().len(), 1);
    }

    #[test]
    fn test_update_group() {
        let f = fixture();
        let group = f.actions.add_group("Old", Browser::SystemDefault).unwrap();

        assert!(f.actions.update_group(&group.id, "New", Browser::Chrome));
        let updated = f.actions.get_group(&group.id).unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.browser, Browser::Chrome);

        assert!(!f.actions.update_group("missing", "New", Browser::Chrome));
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group not found");
    }

    #[test]
    fn test_update_group_browser() {
        let f = fixture();
        let group = f.actions.add_group("G", Browser::Safari).unwrap();

        assert!(f.actions.update_group_browser(&group.id, Browser::SystemDefault));
        assert_eq!(
            f.actions.get_group(&group.id).unwrap().unwrap().browser,
            Browser::SystemDefault
        );
        assert!(!f.actions.update_group_browser("missing", Browser::Brave));
    }

    #[test]
    fn test_add_link_normalizes_and_prepends() {
        let f = fixture();
        let id = seed_group(&f, vec![link("old", "https://old.com/")]);

        assert!(f.actions.add_link(&id, "Docs", " https://Docs.rs/serde "));

        let group = f.actions.get_group(&id).unwrap().unwrap();
        assert_eq!(group.links.len(), 2);
        assert_eq!(group.links[0].title, "Docs");
        assert_eq!(group.links[0].url, "https://docs.rs/serde");
        assert_eq!(group.links[1].id, "old");
    }

    #[test]
    fn test_add_link_rejects_invalid_url_without_writing() {
        let f = fixture();
        let id = seed_group(&f, vec![]);
        let before = f.kv.get(STORAGE_KEY).unwrap();

        assert!(!f.actions.add_link(&id, "Bad", "example.com"));

        assert_eq!(f.kv.get(STORAGE_KEY).unwrap(), before);
        let toast = f.notifier.last_toast().unwrap();
        assert_eq!(toast.title, "Invalid URL");
        assert_eq!(toast.message.as_deref(), Some("Use a valid http(s) URL."));
    }

    #[test]
    fn test_add_link_missing_group() {
        let f = fixture();
        assert!(!f.actions.add_link("missing", "T", "https://a.com"));
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group not found");
    }

    #[test]
    fn test_add_links_derives_titles() {
        let f = fixture();
        let id = seed_group(&f, vec![link("old", "https://old.com/")]);

        let result = f.actions.add_links(
            &id,
            &strings(&["https://github.com/foo/bar", "https://example.com", "not a url at all"]),
        );
        let expected = AddLinksResult {
            added: 3,
            failed: 0,
        };
        assert_eq!(result, expected);

        let group = f.actions.get_group(&id).unwrap().unwrap();
        let titles: Vec<&str> = group.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["bar", "example.com", "not a url at all", "old"]);
        assert_eq!(group.links[2].url, "not a url at all");
    }

    #[test]
    fn test_add_links_empty_and_missing_group() {
        let f = fixture();
        assert_eq!(f.actions.add_links("missing", &[]), AddLinksResult::default());
        assert_eq!(f.kv.get(STORAGE_KEY).unwrap(), None);

        let urls = strings(&["https://a.com", "https://b.com"]);
        let result = f.actions.add_links("missing", &urls);
        let expected = AddLinksResult {
            added: 0,
            failed: 2,
        };
        assert_eq!(result, expected);
    }

    #[test]
    fn test_delete_link() {
        let f = fixture();
        let id = seed_group(&f, vec![link("a", "https://a.com/"), link("b", "https://b.com/")]);

        assert!(f.actions.delete_link(&id, "a"));
        let group = f.actions.get_group(&id).unwrap().unwrap();
        assert_eq!(group.links, vec![link("b", "https://b.com/")]);

        assert!(!f.actions.delete_link(&id, "a"));
        assert_eq!(f.notifier.last_toast().unwrap().title, "Link not found");

        assert!(!f.actions.delete_link("missing", "b"));
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group not found");
    }

    #[test]
    fn test_edit_links_keeps_by_multiplicity() {
        let f = fixture();
        let id = seed_group(&f, vec![link("a1", "https://a"), link("a2", "https://a")]);

        let result = f
            .actions
            .edit_links(&id, &strings(&["https://a"]), &strings(&["https://b"]));
        let expected = EditLinksResult {
            removed: 1,
            added: 1,
        };
        assert_eq!(result, Some(expected));

        let group = f.actions.get_group(&id).unwrap().unwrap();
        assert_eq!(group.links.len(), 2);
        assert_eq!(group.links[0].url, "https://b");
        assert_eq!(group.links[1].id, "a1");
    }

    #[test]
    fn test_edit_links_preserves_survivor_order() {
        let f = fixture();
        let id = seed_group(
            &f,
            vec![
                link("x", "https://x.com/"),
                link("y", "https://y.com/"),
                link("z", "https://z.com/"),
                link("x2", "https://x.com/"),
            ],
        );

        let result = f.actions.edit_links(
            &id,
            &strings(&["https://z.com/", "https://x.com/", "https://x.com/"]),
            &[],
        );
        let expected = EditLinksResult {
            removed: 1,
            added: 0,
        };
        assert_eq!(result, Some(expected));

        let ids: Vec<String> = f
            .actions
            .get_group(&id)
            .unwrap()
            .unwrap()
            .links
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["x", "z", "x2"]);
    }

    #[test]
    fn test_edit_links_missing_group() {
        let f = fixture();
        let result = f.actions.edit_links("missing", &[], &strings(&["https://a.com"]));
        assert_eq!(result, None);
        assert_eq!(f.notifier.last_toast().unwrap().title, "Group not found");
    }

    #[test]
    fn test_operations_report_write_failures() {
        struct FailingKv;

        impl KeyValueStore for FailingKv {
            fn get(&self, _key: &str) -> io::Result<Option<String>> {
                Ok(None)
            }

            fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
                Err(io::Error::other("disk full"))
            }
        }

        let notifier = Arc::new(RecordingNotifier::new(true));
        let store = LinkStore::open(Box::new(FailingKv), notifier.clone()).unwrap();
        let actions = LinkGroupActions::new(store, notifier.clone());

        assert!(actions.add_group("G", Browser::SystemDefault).is_none());
        let toast = notifier.last_toast().unwrap();
        assert_eq!(toast.title, "Failed to create group");
        assert!(toast.message.unwrap().contains("disk full"));
        assert_eq!(actions.store().load().unwrap(), Database::default());
    }

    #[test]
    fn test_plan_link_edit() {
        let links = vec![link("a", "https://a.com/"), link("b", "https://b.com/")];
        let text = "https://a.com\n\n  https://c.com/x  \nnot a url\nhttps://a.com/\n";
        let plan = plan_link_edit(&links, text);

        assert_eq!(plan.keep, strings(&["https://a.com/", "https://a.com/"]));
        assert_eq!(plan.add, strings(&["https://c.com/x"]));
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "link"), "0 links");
        assert_eq!(pluralize(1, "link"), "1 link");
        assert_eq!(pluralize(3, "link"), "3 links");
    }
}
