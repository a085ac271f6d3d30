//! Group commands - list, show, create, edit, delete

use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;

use super::utils::{self, App};
use link_groups::links::actions::pluralize;
use link_groups::links::{Browser, LinkGroup};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render all groups as a table
pub fn format_groups(groups: &[LinkGroup]) -> String {
    if groups.is_empty() {
        return "No groups yet. Create one with `link-groups add-group <title>`.".to_string();
    }

    let mut table = new_table();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Title"),
        Cell::new("Links"),
        Cell::new("Browser"),
    ]);

    for group in groups {
        table.add_row(vec![
            Cell::new(utils::short_id(&group.id)),
            Cell::new(&group.title),
            Cell::new(group.links.len()),
            Cell::new(group.browser.label()),
        ]);
    }

    format!("{}\n\n{}", table, pluralize(groups.len(), "group"))
}

/// Render one group with its links
pub fn format_group(group: &LinkGroup) -> String {
    let mut lines = vec![
        format!("Group: {}", group.title.bold()),
        format!("ID: {}", group.id),
        format!("Browser: {}", group.browser.label()),
        format!(
            "Links: {}",
            if group.links.is_empty() {
                "(none)".to_string()
            } else {
                group.links.len().to_string()
            }
        ),
    ];

    if !group.links.is_empty() {
        let mut table = new_table();
        table.set_header(vec![Cell::new("ID"), Cell::new("Title"), Cell::new("URL")]);
        for link in &group.links {
            table.add_row(vec![
                Cell::new(utils::short_id(&link.id)),
                Cell::new(&link.title),
                Cell::new(&link.url),
            ]);
        }
        lines.push(String::new());
        lines.push(table.to_string());
    }

    lines.join("\n")
}

/// Render the browser catalog
pub fn format_browsers() -> String {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Name"), Cell::new("Browser"), Cell::new("Bundle ID")]);
    for browser in Browser::ALL {
        table.add_row(vec![
            Cell::new(browser.slug()),
            Cell::new(browser.label()),
            Cell::new(if browser.is_system_default() {
                "-"
            } else {
                browser.bundle_id()
            }),
        ]);
    }
    table.to_string()
}

/// Execute the list command
pub fn list(app: &App) -> Result<String> {
    let groups = app.actions.groups()?;
    Ok(format_groups(&groups))
}

/// Execute the show command
pub fn show(app: &App, group: &str) -> Result<bool> {
    match app.find_group(group)? {
        Some(group) => {
            println!("{}", format_group(&group));
            Ok(true)
        }
        None => {
            eprintln!("{} Group not found: {}", "✗".red(), group);
            Ok(false)
        }
    }
}

/// Execute the add-group command
pub fn add(app: &App, title: &str, browser: Browser) -> bool {
    match app.actions.add_group(title, browser) {
        Some(group) => {
            println!("{} {} ({})", "Created group:".green(), group.title, group.id);
            true
        }
        None => false,
    }
}

/// Execute the edit-group command
pub fn edit(app: &App, group: &str, title: Option<&str>, browser: Option<Browser>) -> Result<bool> {
    let id = app.expand_group_id(group)?;

    match (title, browser) {
        (None, None) => bail!("Nothing to change. Pass --title and/or --browser"),
        (None, Some(browser)) => Ok(app.actions.update_group_browser(&id, browser)),
        (Some(title), browser) => {
            // Keep the current browser unless a new one was given
            let browser = match browser {
                Some(b) => b,
                None => app
                    .actions
                    .get_group(&id)?
                    .map(|g| g.browser)
                    .unwrap_or_default(),
            };
            Ok(app.actions.update_group(&id, title, browser))
        }
    }
}

/// Execute the set-browser command
pub fn set_browser(app: &App, group: &str, browser: Browser) -> Result<bool> {
    let id = app.expand_group_id(group)?;
    Ok(app.actions.update_group_browser(&id, browser))
}

/// Execute the delete-group command
pub fn delete(app: &App, group: &str) -> Result<bool> {
    let id = app.expand_group_id(group)?;
    Ok(app.actions.delete_group(&id))
}
