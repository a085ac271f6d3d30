//! Open commands - open a group or a single link, print a group's deep link

use anyhow::Result;
use owo_colors::OwoColorize;

use super::utils::{self, App};
use link_groups::links::deeplink::{open_group_link, resolve_group_id};
use link_groups::notify::Toast;

/// Execute the open command
///
/// `target` is a group id, an id prefix, or a `link-groups://open` deep link.
pub fn open(app: &App, target: &str) -> Result<bool> {
    let Some(id) = resolve_group_id(target) else {
        app.actions.notifier().hud("Group not found");
        return Ok(false);
    };
    let id = app.expand_group_id(&id)?;

    let result = app.opener.open_group(app.actions.store(), &id)?;
    Ok(result.is_some_and(|r| r.opened > 0))
}

/// Execute the open-link command: open one link in its group's browser
pub fn open_link(app: &App, group: &str, link: &str) -> Result<bool> {
    let Some(current) = app.find_group(group)? else {
        app.actions.notifier().toast(Toast::failure("Group not found"));
        return Ok(false);
    };

    let link_id = utils::expand_id(current.links.iter().map(|l| l.id.as_str()), link);
    Ok(app.opener.open_link(app.actions.store(), &current.id, &link_id)?)
}

/// Execute the quicklink command
pub fn quicklink(app: &App, group: &str) -> Result<bool> {
    match app.find_group(group)? {
        Some(group) => {
            let link = open_group_link(&group.id);
            println!("{}", link);
            eprintln!("{} {}", "Quicklink for".dimmed(), group.title.dimmed());
            Ok(true)
        }
        None => {
            app.actions.notifier().toast(Toast::failure("Group not found"));
            Ok(false)
        }
    }
}
