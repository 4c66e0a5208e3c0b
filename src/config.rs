//! Command line and environment resolution.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DIR_ENV: &str = "ZVAULT_DIR";
pub const APP_DIR: &str = "zvault";
pub const CLIPBOARD_CLEAR: Duration = Duration::from_secs(10);
pub const TOTP_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub vault_dir: PathBuf,
    pub clipboard_clear: Duration,
    pub totp_tick: Duration,
}

impl Settings {
    pub fn new(vault_dir: PathBuf) -> Self {
        Self {
            vault_dir,
            clipboard_clear: CLIPBOARD_CLEAR,
            totp_tick: TOTP_TICK,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Run(Settings),
    Version,
    Help,
}

/// Parses arguments (without argv[0]). `env` looks up environment
/// variables so callers and tests control the environment.
pub fn parse_args<I, F>(args: I, env: F) -> Result<Invocation>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut args = args.into_iter();
    let mut dir: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(Invocation::Version),
            "--help" | "-h" => return Ok(Invocation::Help),
            "--dir" | "-d" => match args.next() {
                Some(p) if !p.is_empty() => dir = Some(PathBuf::from(p)),
                _ => return Err(anyhow!("--dir requires a path")),
            },
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }

    let vault_dir = match dir {
        Some(d) => d,
        None => default_dir(&env)?,
    };
    Ok(Invocation::Run(Settings::new(vault_dir)))
}

/// `ZVAULT_DIR`, then `$XDG_DATA_HOME/zvault`, then the platform data dir.
pub fn default_dir<F>(env: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = env(DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| anyhow!("could not determine a data directory; pass --dir"))
}

pub fn usage(bin_name: &str) -> String {
    format!(
        "Usage: {bin_name} [OPTIONS]\n\
         \x20 -d, --dir <PATH>        Vault directory (default: ${DIR_ENV} or the XDG data dir)\n\
         \x20 -h, --help              Show this help and exit\n\
         \x20 -V, --version           Show version and exit"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn dir_flag_wins_over_env() {
        let inv = parse_args(args(&["--dir", "/tmp/a"]), env_of(&[(DIR_ENV, "/tmp/b")])).unwrap();
        assert_eq!(inv, Invocation::Run(Settings::new(PathBuf::from("/tmp/a"))));
    }

    #[test]
    fn env_dir_wins_over_xdg() {
        let env = env_of(&[(DIR_ENV, "/tmp/b"), ("XDG_DATA_HOME", "/tmp/xdg")]);
        let Invocation::Run(settings) = parse_args(args(&[]), env).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(settings.vault_dir, PathBuf::from("/tmp/b"));
        assert_eq!(settings.clipboard_clear, Duration::from_secs(10));
    }

    #[test]
    fn xdg_data_home_gets_app_subdir() {
        let env = env_of(&[("XDG_DATA_HOME", "/tmp/xdg")]);
        assert_eq!(default_dir(&env).unwrap(), PathBuf::from("/tmp/xdg/zvault"));
    }

    #[test]
    fn version_help_and_errors() {
        assert_eq!(parse_args(args(&["-V"]), env_of(&[])).unwrap(), Invocation::Version);
        assert_eq!(parse_args(args(&["--help"]), env_of(&[])).unwrap(), Invocation::Help);
        assert!(parse_args(args(&["--dir"]), env_of(&[])).is_err());
        assert!(parse_args(args(&["--bogus"]), env_of(&[])).is_err());
    }
}
