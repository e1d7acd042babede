//! Best-effort parsing of the fetch tool's line-oriented output.
//!
//! Nothing in here may fail: a line that does not parse is simply not a
//! progress update.

use super::ordinal_of;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

const TITLE_WIDTH: usize = 40;

fn percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("Invalid regex"))
}

fn item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[download\] Downloading (?:item|video) (\d+) of (\d+)").expect("Invalid regex")
    })
}

/// Something the fetch tool reported.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// A playlist item is starting (`n` of `total`).
    ItemStarted { index: u32, total: u32 },
    /// A new output file is being written.
    Destination(PathBuf),
    /// Download percentage of the current destination.
    Progress(f64),
    /// Separate streams of one item were merged into this file.
    Merged(PathBuf),
    AlreadyDownloaded(PathBuf),
    Error(String),
}

pub fn parse_line(line: &str) -> Option<FetchEvent> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("ERROR:") {
        return Some(FetchEvent::Error(rest.trim().to_string()));
    }
    if let Some(path) = line.strip_prefix("[Merger] Merging formats into ") {
        let path = path.trim().trim_matches('"');
        if path.is_empty() {
            return None;
        }
        return Some(FetchEvent::Merged(PathBuf::from(path)));
    }
    if !line.starts_with("[download]") {
        return None;
    }

    if let Some((_, path)) = line.split_once("Destination: ") {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        return Some(FetchEvent::Destination(PathBuf::from(path)));
    }
    if let Some(caps) = item_regex().captures(line) {
        let index = caps[1].parse().ok()?;
        let total = caps[2].parse().ok()?;
        return Some(FetchEvent::ItemStarted { index, total });
    }
    if let Some(path) = line.strip_prefix("[download] ").and_then(|rest| {
        rest.strip_suffix(" has already been downloaded and merged")
            .or_else(|| rest.strip_suffix(" has already been downloaded"))
    }) {
        return Some(FetchEvent::AlreadyDownloaded(PathBuf::from(path.trim())));
    }
    if let Some(caps) = percent_regex().captures(line) {
        let pct: f64 = caps[1].parse().ok()?;
        if pct.is_finite() {
            return Some(FetchEvent::Progress(pct.clamp(0.0, 100.0)));
        }
    }
    None
}

/// What the progress stream told us about the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Distinct items the tool started on.
    pub items_seen: usize,
    pub errors: Vec<String>,
    /// Every file the tool said it wrote, merged or found already present,
    /// in first-mention order. Intermediate streams are included.
    pub files: Vec<PathBuf>,
}

/// Drives one progress bar per in-flight download destination.
pub struct ProgressTracker {
    show: bool,
    current: Option<ProgressBar>,
    items: HashSet<String>,
    playlist_items: HashSet<u32>,
    errors: Vec<String>,
    files: Vec<PathBuf>,
}

impl ProgressTracker {
    pub fn new(show: bool) -> Self {
        Self {
            show,
            current: None,
            items: HashSet::new(),
            playlist_items: HashSet::new(),
            errors: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn handle_line(&mut self, line: &str) {
        debug!(target: "fetch", "{}", line);
        if let Some(event) = parse_line(line) {
            self.handle(event);
        }
    }

    pub fn handle(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::ItemStarted { index, .. } => {
                self.playlist_items.insert(index);
            }
            FetchEvent::Destination(path) => {
                self.close_current();
                self.items.insert(item_key(&path));
                self.current = Some(self.new_bar(&path));
                self.record_file(path);
            }
            FetchEvent::Progress(pct) => {
                if let Some(bar) = &self.current {
                    bar.set_position(pct as u64);
                    if pct >= 100.0 {
                        self.close_current();
                    }
                }
            }
            FetchEvent::Merged(path) => {
                self.close_current();
                self.items.insert(item_key(&path));
                self.record_file(path);
            }
            FetchEvent::AlreadyDownloaded(path) => {
                self.items.insert(item_key(&path));
                self.record_file(path);
            }
            FetchEvent::Error(message) => {
                warn!("{}", message);
                self.errors.push(message);
            }
        }
    }

    pub fn finish(mut self) -> FetchReport {
        self.close_current();
        FetchReport {
            items_seen: self.items.len().max(self.playlist_items.len()),
            errors: std::mem::take(&mut self.errors),
            files: std::mem::take(&mut self.files),
        }
    }

    fn record_file(&mut self, path: PathBuf) {
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    fn close_current(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }

    fn new_bar(&self, path: &Path) -> ProgressBar {
        if !self.show {
            return ProgressBar::hidden();
        }

        let title: String = path
            .file_stem()
            .map(|s| s.to_string_lossy().chars().take(TITLE_WIDTH).collect())
            .unwrap_or_default();

        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} {bar:50.cyan/blue} {pos:>3}%")
        {
            bar.set_style(style);
        }
        bar.set_message(format!("📺 [{}] {}...", self.items.len(), title));
        bar
    }
}

/// Video and audio streams of one item share a key.
fn item_key(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match ordinal_of(&stem) {
        Some(ordinal) => ordinal.to_string(),
        None => stem,
    }
}
