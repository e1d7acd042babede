use crate::config::Config;
use crate::error::SubfetchError;
use crate::fetch::{validate_url, PlaylistRange};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

/// What the user asked for from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Fetch {
        url: String,
        range: Option<PlaylistRange>,
    },
    ProcessFolder(PathBuf),
    TranslateFolder(PathBuf),
    Exit,
}

const MENU: &[&str] = &[
    "Download a video or playlist",
    "Process an existing folder",
    "Translate captions in a folder",
    "Exit",
];

pub fn run_menu(config: &Config) -> anyhow::Result<MenuAction> {
    print_header(config);

    let selection = Select::new()
        .with_prompt("What do you want to do?")
        .items(MENU)
        .default(0)
        .interact()?;

    let action = match selection {
        0 => {
            let url = prompt_url()?;
            let range = prompt_range()?;
            MenuAction::Fetch { url, range }
        }
        1 => MenuAction::ProcessFolder(prompt_folder("Folder with videos and captions")?),
        2 => MenuAction::TranslateFolder(prompt_folder("Folder with caption files")?),
        _ => MenuAction::Exit,
    };

    Ok(action)
}

fn print_header(config: &Config) {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║     subfetch - video + caption downloader         ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
    println!(
        "  Captions:  {} → {}",
        style(&config.source_lang).bold(),
        style(&config.target_lang).bold()
    );
    println!(
        "  Output:    {}",
        style(config.output_dir.display()).cyan()
    );
    println!();
}

fn prompt_url() -> anyhow::Result<String> {
    let url: String = Input::new()
        .with_prompt("Video or playlist URL")
        .interact_text()?;
    let url = url.trim().to_string();
    validate_url(&url)?;
    Ok(url)
}

fn prompt_range() -> anyhow::Result<Option<PlaylistRange>> {
    println!(
        "  {}",
        style("Range of playlist items (e.g. 1-5, 3, 7-). Leave empty for the whole list.").dim()
    );
    let input: String = Input::new()
        .with_prompt("Range")
        .allow_empty(true)
        .interact_text()?;
    Ok(PlaylistRange::parse(&input)?)
}

fn prompt_folder(prompt: &str) -> anyhow::Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt(prompt)
        .default(".".to_string())
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    if !path.is_dir() {
        return Err(SubfetchError::NotFound(path.display().to_string()).into());
    }
    Ok(path)
}

/// Ask before deleting temporary files. Declining keeps them for inspection.
pub fn confirm_purge(workspace: &Path) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!(
            "Delete temporary files in {}?",
            workspace.display()
        ))
        .default(true)
        .interact()?)
}
