//! link-groups: CLI for organizing URLs into named groups
//!
//! Groups live in a local JSON store with a one-step backup. A whole group
//! can be opened at once in the browser chosen for it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use link_groups::config;
use link_groups::links::Browser;

mod commands;

use commands::utils::App;

#[derive(Parser)]
#[command(name = "link-groups")]
#[command(about = "Organize links into groups and open them together", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the link store
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log store and opener activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all groups
    List,

    /// Show a group and its links
    Show {
        /// Group ID (or unique prefix)
        group: String,
    },

    /// Create a new group
    AddGroup {
        /// Group title
        title: String,

        /// Browser to open the group in (see `browsers`)
        #[arg(short, long, default_value = "default")]
        browser: Browser,
    },

    /// Rename a group or change its browser
    EditGroup {
        /// Group ID (or unique prefix)
        group: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New browser
        #[arg(short, long)]
        browser: Option<Browser>,
    },

    /// Change the browser a group opens in
    SetBrowser {
        /// Group ID (or unique prefix)
        group: String,

        /// Browser name or bundle ID
        browser: Browser,
    },

    /// Delete a group and all of its links
    DeleteGroup {
        /// Group ID (or unique prefix)
        group: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Add one link to the top of a group
    AddLink {
        /// Group ID (or unique prefix)
        group: String,

        /// Link URL (http or https)
        url: String,

        /// Link title (derived from the URL if omitted)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Import many URLs, one per line, into a group
    Import {
        /// Group ID (or unique prefix)
        group: String,

        /// File to read URLs from (stdin if omitted or `-`)
        file: Option<String>,
    },

    /// Replace a group's links with an edited URL list
    EditLinks {
        /// Group ID (or unique prefix)
        group: String,

        /// File with the desired URLs, one per line (stdin if omitted or `-`)
        file: Option<String>,
    },

    /// Print a group's URLs, one per line
    Urls {
        /// Group ID (or unique prefix)
        group: String,
    },

    /// Remove a link from a group
    DeleteLink {
        /// Group ID (or unique prefix)
        group: String,

        /// Link ID (or unique prefix)
        link: String,
    },

    /// Open every link of a group in its browser
    Open {
        /// Group ID, unique prefix, or link-groups:// deep link
        target: String,
    },

    /// Open a single link in its group's browser
    OpenLink {
        /// Group ID (or unique prefix)
        group: String,

        /// Link ID (or unique prefix)
        link: String,
    },

    /// Print the deep link that opens a group
    Quicklink {
        /// Group ID (or unique prefix)
        group: String,
    },

    /// List supported browsers
    Browsers,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Commands::Browsers = cli.command {
        println!("{}", commands::groups::format_browsers());
        return Ok(ExitCode::SUCCESS);
    }

    let assume_yes = matches!(cli.command, Commands::DeleteGroup { yes: true, .. });
    let data_dir = config::resolve_data_dir(cli.data_dir)?;
    let app = App::open(data_dir, assume_yes)?;

    let ok = match cli.command {
        Commands::List => {
            println!("{}", commands::groups::list(&app)?);
            true
        }

        Commands::Show { group } => commands::groups::show(&app, &group)?,

        Commands::AddGroup { title, browser } => commands::groups::add(&app, &title, browser),

        Commands::EditGroup {
            group,
            title,
            browser,
        } => commands::groups::edit(&app, &group, title.as_deref(), browser)?,

        Commands::SetBrowser { group, browser } => {
            commands::groups::set_browser(&app, &group, browser)?
        }

        Commands::DeleteGroup { group, .. } => commands::groups::delete(&app, &group)?,

        Commands::AddLink { group, url, title } => {
            commands::links::add(&app, &group, &url, title.as_deref())?
        }

        Commands::Import { group, file } => commands::links::import(&app, &group, file.as_deref())?,

        Commands::EditLinks { group, file } => {
            commands::links::edit(&app, &group, file.as_deref())?
        }

        Commands::Urls { group } => commands::links::urls(&app, &group)?,

        Commands::DeleteLink { group, link } => commands::links::delete(&app, &group, &link)?,

        Commands::Open { target } => commands::open::open(&app, &target)?,

        Commands::OpenLink { group, link } => commands::open::open_link(&app, &group, &link)?,

        Commands::Quicklink { group } => commands::open::quicklink(&app, &group)?,

        Commands::Browsers => true,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
