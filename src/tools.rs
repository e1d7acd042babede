use crate::config::{Config, MuxBackend};
use crate::error::{Result, SubfetchError};
use std::process::{Command, Stdio};
use tracing::debug;

/// What a run is going to do; decides which tools it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Fetch,
    ProcessFolder,
    TranslateFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub program: String,
    pub version_flag: &'static str,
    pub install_hint: &'static str,
}

pub fn required_tools(config: &Config, mode: RunMode) -> Vec<Tool> {
    let yt_dlp = Tool {
        name: "yt-dlp",
        program: config.tools.yt_dlp.clone(),
        version_flag: "--version",
        install_hint: "pip install yt-dlp",
    };
    let muxer = match config.mux_backend {
        MuxBackend::Mkvmerge => Tool {
            name: "mkvmerge",
            program: config.tools.mkvmerge.clone(),
            version_flag: "-V",
            install_hint: "install mkvtoolnix (e.g. sudo dnf install mkvtoolnix)",
        },
        MuxBackend::Ffmpeg => Tool {
            name: "ffmpeg",
            program: config.tools.ffmpeg.clone(),
            version_flag: "-version",
            install_hint: "install ffmpeg (e.g. sudo dnf install ffmpeg)",
        },
    };

    match mode {
        RunMode::Fetch => vec![yt_dlp, muxer],
        RunMode::ProcessFolder => vec![muxer],
        RunMode::TranslateFolder => Vec::new(),
    }
}

/// Whether `tool` can be started at all. Its exit status is not checked.
pub fn is_available(tool: &Tool) -> bool {
    let available = Command::new(&tool.program)
        .arg(tool.version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok();
    debug!("{} available: {}", tool.name, available);
    available
}

/// Probe every tool and report all missing ones together.
pub fn check_dependencies(tools: &[Tool]) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|t| !is_available(t))
        .map(|t| format!("{} ({})", t.name, t.install_hint))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SubfetchError::DependenciesMissing(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_tools_per_mode() {
        let config = Config::default();
        let names = |mode| {
            required_tools(&config, mode)
                .into_iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(RunMode::Fetch), ["yt-dlp", "mkvmerge"]);
        assert_eq!(names(RunMode::ProcessFolder), ["mkvmerge"]);
        assert!(names(RunMode::TranslateFolder).is_empty());

        let config = Config {
            mux_backend: MuxBackend::Ffmpeg,
            ..Config::default()
        };
        assert_eq!(required_tools(&config, RunMode::ProcessFolder)[0].version_flag, "-version");
    }

    #[test]
    fn test_all_missing_tools_reported() {
        let mut config = Config::default();
        config.tools.yt_dlp = "/nonexistent/yt-dlp".to_string();
        config.tools.mkvmerge = "/nonexistent/mkvmerge".to_string();

        match check_dependencies(&required_tools(&config, RunMode::Fetch)) {
            Err(SubfetchError::DependenciesMissing(missing)) => {
                assert_eq!(missing.len(), 2);
                assert!(missing[0].starts_with("yt-dlp"));
                assert!(missing[1].starts_with("mkvmerge"));
            }
            other => panic!("expected missing dependencies, got {other:?}"),
        }
    }

    #[test]
    fn test_nothing_required_passes() {
        assert!(check_dependencies(&[]).is_ok());
    }
}
