//! Opening many URLs at once
//!
//! Each URL gets its own worker; outcomes are gathered once all of them have
//! settled. One failed or panicking launch never affects the others.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::links::actions::pluralize;
use crate::links::{Browser, LinkStore};
use crate::notify::{Notifier, Toast, ToastStyle};

/// Failure to hand a URL to a browser
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("failed to launch browser for {url}: {source}")]
    Launch {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("{browser} exited with {status} for {url}")]
    Status {
        url: String,
        browser: Browser,
        status: ExitStatus,
    },
}

/// Host collaborator that opens a single URL
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str, browser: Browser) -> Result<(), OpenError>;
}

/// Opens URLs through the operating system
///
/// The system default browser goes through the platform URL handler. A
/// specific browser is addressed by bundle id, which only macOS understands;
/// elsewhere the default handler is used instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str, browser: Browser) -> Result<(), OpenError> {
        if browser.is_system_default() {
            return open::that(url).map_err(|source| OpenError::Launch {
                url: url.to_string(),
                source,
            });
        }
        open_with_browser(url, browser)
    }
}

#[cfg(target_os = "macos")]
fn open_with_browser(url: &str, browser: Browser) -> Result<(), OpenError> {
    let status = std::process::Command::new("open")
        .args(["-b", browser.bundle_id(), url])
        .status()
        .map_err(|source| OpenError::Launch {
            url: url.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(OpenError::Status {
            url: url.to_string(),
            browser,
            status,
        })
    }
}

#[cfg(not(target_os = "macos"))]
fn open_with_browser(url: &str, browser: Browser) -> Result<(), OpenError> {
    debug!("{} can only be selected on macOS, using the default browser", browser);
    open::that(url).map_err(|source| OpenError::Launch {
        url: url.to_string(),
        source,
    })
}

/// Counts from an open-all run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenAllResult {
    pub opened: usize,
    pub failed: usize,
    pub total: usize,
}

/// Opens groups of URLs and reports how it went
#[derive(Clone)]
pub struct BulkOpener {
    opener: Arc<dyn UrlOpener>,
    notifier: Arc<dyn Notifier>,
}

impl BulkOpener {
    pub fn new(opener: Arc<dyn UrlOpener>, notifier: Arc<dyn Notifier>) -> Self {
        Self { opener, notifier }
    }

    /// Open every URL concurrently and count the outcomes
    ///
    /// Unless `silent`, one aggregate toast is shown. Empty input issues no
    /// requests.
    pub fn open_all_urls(&self, urls: &[String], browser: Browser, silent: bool) -> OpenAllResult {
        if urls.is_empty() {
            if !silent {
                self.notifier.toast(Toast::failure("No links to open"));
            }
            return OpenAllResult::default();
        }

        let opener = self.opener.as_ref();
        let failed = thread::scope(|scope| {
            let spawned = urls
                .iter()
                .map(|url| {
                    let handle = thread::Builder::new()
                        .name("url-opener".to_string())
                        .spawn_scoped(scope, move || opener.open(url, browser));
                    (url.as_str(), handle)
                })
                .collect();
            count_failed(spawned)
        });

        let total = urls.len();
        let opened = total - failed;
        debug!(opened, failed, total, browser = browser.bundle_id(), "opened urls");

        if !silent {
            let style = if failed > 0 {
                ToastStyle::Failure
            } else {
                ToastStyle::Success
            };
            self.notifier.toast(Toast {
                style,
                title: format!("Opened {}/{} links", opened, total),
                message: None,
            });
        }

        OpenAllResult {
            opened,
            failed,
            total,
        }
    }

    /// Open every link of a stored group, reporting through HUD messages
    ///
    /// Returns `Ok(None)` when the group is missing or empty.
    pub fn open_group(
        &self,
        store: &LinkStore,
        group_id: &str,
    ) -> Result<Option<OpenAllResult>, StoreError> {
        let db = store.load()?;

        let Some(group) = db.group(group_id) else {
            self.notifier.hud("Group not found");
            return Ok(None);
        };
        if group.links.is_empty() {
            self.notifier.hud("Group is empty");
            return Ok(None);
        }

        let result = self.open_all_urls(&group.urls(), group.browser, true);
        if result.failed > 0 {
            self.notifier
                .hud(&format!("Opened {}/{} links", result.opened, result.total));
        } else {
            self.notifier
                .hud(&format!("Opened {}", pluralize(result.opened, "link")));
        }

        Ok(Some(result))
    }

    /// Open a single link of a stored group in the group's browser
    pub fn open_link(
        &self,
        store: &LinkStore,
        group_id: &str,
        link_id: &str,
    ) -> Result<bool, StoreError> {
        let db = store.load()?;

        let Some(group) = db.group(group_id) else {
            self.notifier.toast(Toast::failure("Group not found"));
            return Ok(false);
        };
        let Some(link) = group.links.iter().find(|l| l.id == link_id) else {
            self.notifier.toast(Toast::failure("Link not found"));
            return Ok(false);
        };

        match self.opener.open(&link.url, group.browser) {
            Ok(()) => {
                self.notifier
                    .toast(Toast::success("Opened link").with_message(link.url.as_str()));
                Ok(true)
            }
            Err(e) => {
                warn!("{}", e);
                self.notifier
                    .toast(Toast::failure("Failed to open link").with_message(e.to_string()));
                Ok(false)
            }
        }
    }
}

type Spawned<'scope, 'u> = (&'u str, io::Result<ScopedJoinHandle<'scope, Result<(), OpenError>>>);

/// Wait for every opener thread and count the URLs that did not open
///
/// A thread that could not be started counts as a failed URL.
fn count_failed(spawned: Vec<Spawned<'_, '_>>) -> usize {
    spawned
        .into_iter()
        .map(|(url, handle)| match handle.map(|h| h.join()) {
            Ok(Ok(Ok(()))) => false,
            Ok(Ok(Err(e))) => {
                warn!("{}", e);
                true
            }
            Ok(Err(_)) => {
                warn!("opener panicked for {}", url);
                true
            }
            Err(e) => {
                warn!("could not start opener for {}: {}", url, e);
                true
            }
        })
        .filter(|failed| *failed)
        .count()
}
