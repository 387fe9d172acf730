// src/config.rs
//! Typed configuration snapshot, TOML loading with env fallbacks, persistence of
//! the last-seen announcement hash, and an optional polling hot reload.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

pub const DEFAULT_CONFIG_PATH: &str = "config/chirp.toml";
pub const ENV_CONFIG_PATH: &str = "CHIRP_CONFIG_PATH";
pub const ENV_INTERVAL_SECS: &str = "CHIRP_INTERVAL_SECS";
pub const ENV_HOT_RELOAD: &str = "CHIRP_HOT_RELOAD";

pub const MIN_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// How post authors map onto host residents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AssociationMode {
    /// 0: show the author name as-is.
    #[default]
    Disabled,
    /// 1: borrow a random resident's name and identity.
    BorrowResident,
    /// 2: permanently rename an unnamed resident to the author.
    RenameResident,
}

impl TryFrom<u8> for AssociationMode {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::BorrowResident),
            2 => Ok(Self::RenameResident),
            other => Err(format!("association_mode must be 0..=2, got {other}")),
        }
    }
}

impl From<AssociationMode> for u8 {
    fn from(m: AssociationMode) -> u8 {
        match m {
            AssociationMode::Disabled => 0,
            AssociationMode::BorrowResident => 1,
            AssociationMode::RenameResident => 2,
        }
    }
}

/// Suppression of the host's own chirps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FilterLevel {
    /// 0: nothing suppressed.
    #[default]
    Off,
    /// 1: low-value chirps suppressed.
    LowValue,
    /// 2: once "hide all"; now suppresses the same low-value set as 1.
    LegacyAll,
}

impl TryFrom<u8> for FilterLevel {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Off),
            1 => Ok(Self::LowValue),
            2 => Ok(Self::LegacyAll),
            other => Err(format!("filter_level must be 0..=2, got {other}")),
        }
    }
}

impl From<FilterLevel> for u8 {
    fn from(l: FilterLevel) -> u8 {
        match l {
            FilterLevel::Off => 0,
            FilterLevel::LowValue => 1,
            FilterLevel::LegacyAll => 2,
        }
    }
}

/// What a left click on a relayed chirp does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClickBehavior {
    #[default]
    Overlay,
    Clipboard,
    Browser,
    Nothing,
}

impl TryFrom<u8> for ClickBehavior {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Overlay),
            1 => Ok(Self::Clipboard),
            2 => Ok(Self::Browser),
            3 => Ok(Self::Nothing),
            other => Err(format!("click_behavior must be 0..=3, got {other}")),
        }
    }
}

impl From<ClickBehavior> for u8 {
    fn from(b: ClickBehavior) -> u8 {
        match b {
            ClickBehavior::Overlay => 0,
            ClickBehavior::Clipboard => 1,
            ClickBehavior::Browser => 2,
            ClickBehavior::Nothing => 3,
        }
    }
}

/// Validated configuration snapshot. Components receive an `Arc<ChirpConfig>`
/// per tick; a reload swaps the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChirpConfig {
    pub interval_secs: u64,
    pub association_mode: AssociationMode,
    pub filter_level: FilterLevel,
    pub click_behavior: ClickBehavior,
    /// Persisted for the host UI; the relay itself does not use it.
    pub hashtags: bool,
    pub sources: Vec<String>,
    pub last_seen_hash: i64,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            association_mode: AssociationMode::default(),
            filter_level: FilterLevel::default(),
            click_behavior: ClickBehavior::default(),
            hashtags: true,
            sources: default_sources(),
            last_seen_hash: 0,
        }
    }
}

impl ChirpConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ChirpConfig = toml::from_str(s).context("parsing chirp config toml")?;
        Ok(cfg.sanitized())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing chirp config")
    }

    fn sanitized(mut self) -> Self {
        if self.interval_secs < MIN_INTERVAL_SECS {
            tracing::warn!(
                target: "config",
                interval_secs = self.interval_secs,
                "interval below minimum, using default"
            );
            self.interval_secs = DEFAULT_INTERVAL_SECS;
        }
        self.sources = clean_sources(std::mem::take(&mut self.sources));
        if self.sources.is_empty() {
            self.sources = default_sources();
        }
        self
    }
}

pub fn default_sources() -> Vec<String> {
    vec![
        "/r/ShowerThoughts/rising/".to_string(),
        "/r/CrazyIdeas/new/".to_string(),
        "/r/ChirpIt/new/".to_string(),
    ]
}

/// Accepts a path-like source ("/r/foo/new") or a bare name ("foo" → "/r/foo/new").
/// Anything outside `[A-Za-z0-9/]` or shorter than two chars is rejected.
pub fn normalize_source(raw: &str) -> Option<String> {
    static RE_SOURCE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_SOURCE.get_or_init(|| regex::Regex::new(r"^[a-zA-Z0-9/]*$").unwrap());

    let line = raw.trim();
    if line.len() <= 1 || !re.is_match(line) {
        return None;
    }
    if line.contains('/') {
        Some(line.to_string())
    } else {
        Some(format!("/r/{line}/new"))
    }
}

/// Normalize, drop invalid entries, dedup preserving first occurrence.
pub fn clean_sources(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        match normalize_source(&it) {
            Some(s) if !out.contains(&s) => out.push(s),
            Some(_) => {}
            None => tracing::warn!(target: "config", source = %it.trim(), "ignoring invalid source"),
        }
    }
    out
}

/// Load config from an explicit path, env overrides applied.
pub fn load_config_from(path: &Path) -> Result<ChirpConfig> {
    Ok(with_env_overrides(read_config_file(path)?))
}

/// The file's own values, without env overrides.
pub fn read_config_file(path: &Path) -> Result<ChirpConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading chirp config from {}", path.display()))?;
    ChirpConfig::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
}

/// Resolve the config path:
/// 1) $CHIRP_CONFIG_PATH (must exist)
/// 2) config/chirp.toml
///
/// Returns `None` when neither is present.
pub fn resolve_config_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}

/// Load using env var + fallbacks; defaults when no file is found.
pub fn load_config_default() -> Result<ChirpConfig> {
    match resolve_config_path()? {
        Some(p) => load_config_from(&p),
        None => Ok(with_env_overrides(ChirpConfig::default())),
    }
}

fn with_env_overrides(mut cfg: ChirpConfig) -> ChirpConfig {
    apply_env_overrides(&mut cfg);
    cfg
}

fn apply_env_overrides(cfg: &mut ChirpConfig) {
    if let Some(secs) = std::env::var(ENV_INTERVAL_SECS)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= MIN_INTERVAL_SECS)
    {
        cfg.interval_secs = secs;
    }
}

/// Read side of the configuration plus the single write the relay performs.
pub trait ConfigStore: Send + Sync {
    fn snapshot(&self) -> Arc<ChirpConfig>;
    fn save_last_seen_hash(&self, hash: i64) -> Result<()>;
}

/// In-process store; nothing touches disk.
#[derive(Debug)]
pub struct MemoryConfigStore {
    inner: RwLock<Arc<ChirpConfig>>,
    saves: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new(cfg: ChirpConfig) -> Self {
        Self {
            inner: RwLock::new(Arc::new(cfg)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Swap in a new snapshot, as a reload would.
    pub fn replace(&self, cfg: ChirpConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(cfg);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn snapshot(&self) -> Arc<ChirpConfig> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save_last_seen_hash(&self, hash: i64) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**guard).clone();
        next.last_seen_hash = hash;
        *guard = Arc::new(next);
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// TOML-file backed store. Cloning shares the same snapshot.
///
/// Env overrides only shape the snapshot; saves write the file's own values.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    inner: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    on_disk: ChirpConfig,
    snapshot: Arc<ChirpConfig>,
}

impl FileState {
    fn new(on_disk: ChirpConfig) -> Self {
        let snapshot = Arc::new(with_env_overrides(on_disk.clone()));
        Self { on_disk, snapshot }
    }
}

impl FileConfigStore {
    /// Open `path`. A missing file is regenerated with defaults; a file that
    /// fails to parse is an error and is left as it is.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let on_disk = match fs::read_to_string(&path) {
            Ok(content) => ChirpConfig::from_toml_str(&content)
                .with_context(|| format!("in {}", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(target: "config", path = %path.display(), "config missing, regenerated");
                let cfg = ChirpConfig::default();
                write_config(&path, &cfg)?;
                cfg
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading chirp config from {}", path.display()))
            }
        };
        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(FileState::new(on_disk))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and swap the snapshot. The file is the source of truth.
    pub fn reload(&self) -> Result<()> {
        let on_disk = read_config_file(&self.path)?;
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = FileState::new(on_disk);
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn snapshot(&self) -> Arc<ChirpConfig> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    fn save_last_seen_hash(&self, hash: i64) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.on_disk.clone();
        next.last_seen_hash = hash;
        write_config(&self.path, &next)?;
        *guard = FileState::new(next);
        Ok(())
    }
}

fn write_config(path: &Path, cfg: &ChirpConfig) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = format!(
        "# chirp-relay configuration\n# association_mode: 0 = author names, 1 = borrow resident names, 2 = rename residents\n# filter_level: 0 = off, 1 = hide low-value chirps, 2 = same as 1\n# click_behavior: 0 = overlay, 1 = clipboard, 2 = system browser, 3 = nothing\n\n{}",
        cfg.to_toml_string()?
    );
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

fn hot_reload_enabled() -> bool {
    std::env::var(ENV_HOT_RELOAD).ok().as_deref() == Some("1")
}

/// Poll the config file mtime every 2s and swap in a fresh snapshot on change.
/// No-op unless CHIRP_HOT_RELOAD=1.
pub fn start_hot_reload_thread(store: FileConfigStore) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(store.path()).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => false,
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match store.reload() {
                        Ok(()) => tracing::info!(target: "config", path = %store.path().display(), "config reloaded"),
                        Err(e) => tracing::warn!(target: "config", error = %format!("{e:#}"), "config reload failed"),
                    }
                }
                last_mtime = Some(mtime);
            }
            thread::sleep(poll);
        }
    });
}
