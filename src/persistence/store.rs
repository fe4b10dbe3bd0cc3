//! On-disk layout files.
//!
//! ```text
//! <root>/layouts/<sanitized name>_<uuid>.json
//! <root>/layouts/autosave.json
//! <root>/layouts/templates/<template>_template.json
//! ```
//!
//! Every write goes to a `.tmp` sibling first, is synced, then renamed over the target.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::error::{LayoutPersistenceError, LayoutResult};
use super::snapshot::LayoutSnapshot;
use super::templates::LayoutTemplate;

const LAYOUTS_DIR: &str = "layouts";
const TEMPLATES_DIR: &str = "templates";
const AUTOSAVE_FILE: &str = "autosave.json";
const MAX_NAME_LEN: usize = 64;

/// Text format of an exported layout file, picked by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Ron,
}

impl SnapshotFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Json,
        }
    }

    pub fn serialize(self, snapshot: &LayoutSnapshot) -> LayoutResult<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(snapshot)?,
            Self::Ron => ron::ser::to_string_pretty(snapshot, pretty_ron_config())?,
        })
    }

    pub fn deserialize(self, text: &str) -> LayoutResult<LayoutSnapshot> {
        let snapshot: LayoutSnapshot = match self {
            Self::Json => serde_json::from_str(text)?,
            Self::Ron => ron::from_str(text)?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

pub(crate) fn pretty_ron_config() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(128)
        .separate_tuple_members(true)
        .enumerate_arrays(true)
}

/// File layer under a root directory. Cheap to clone and safe to use from a worker thread.
#[derive(Clone, Debug)]
pub struct LayoutStore {
    root: PathBuf,
}

impl LayoutStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.root.join(LAYOUTS_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.layouts_dir().join(TEMPLATES_DIR)
    }

    pub fn autosave_path(&self) -> PathBuf {
        self.layouts_dir().join(AUTOSAVE_FILE)
    }

    pub fn template_path(&self, template: LayoutTemplate) -> PathBuf {
        self.templates_dir().join(template.file_name())
    }

    /// Deterministic file for a named layout.
    pub fn layout_path(&self, snapshot: &LayoutSnapshot) -> PathBuf {
        self.layouts_dir()
            .join(format!("{}_{}.json", sanitize_name(&snapshot.name), snapshot.id))
    }

    pub fn ensure_dirs(&self) -> LayoutResult<()> {
        let dir = self.templates_dir();
        fs::create_dir_all(&dir).map_err(|e| LayoutPersistenceError::io("create directory", &dir, e))
    }

    /// Write `snapshot` to `path` in the format its extension asks for.
    pub fn write(&self, path: &Path, snapshot: &LayoutSnapshot) -> LayoutResult<()> {
        let text = SnapshotFormat::for_path(path).serialize(snapshot)?;
        write_atomic(path, text.as_bytes())?;
        log::debug!("wrote layout {:?} to {}", snapshot.name, path.display());
        Ok(())
    }

    /// Read and validate a snapshot file.
    pub fn read(&self, path: &Path) -> LayoutResult<LayoutSnapshot> {
        let text = fs::read_to_string(path).map_err(|e| LayoutPersistenceError::io("read", path, e))?;
        SnapshotFormat::for_path(path).deserialize(&text)
    }

    /// Write a named layout to its own file under `layouts/` and return that path.
    pub fn save(&self, snapshot: &LayoutSnapshot) -> LayoutResult<PathBuf> {
        let path = self.layout_path(snapshot);
        self.write(&path, snapshot)?;
        Ok(path)
    }

    pub fn read_template(&self, template: LayoutTemplate) -> LayoutResult<LayoutSnapshot> {
        self.read(&self.template_path(template))
    }

    /// The last auto-save, or `None` if nothing has been auto-saved yet.
    pub fn read_autosave(&self) -> LayoutResult<Option<LayoutSnapshot>> {
        let path = self.autosave_path();
        if !path.exists() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    pub fn remove(&self, path: &Path) -> LayoutResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("layout file {} already gone", path.display());
                Ok(())
            }
            Err(e) => Err(LayoutPersistenceError::io("remove", path, e)),
        }
    }

    /// Every readable named layout directly under `layouts/`. Unreadable files are skipped.
    pub fn scan(&self) -> LayoutResult<Vec<(PathBuf, LayoutSnapshot)>> {
        let dir = self.layouts_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LayoutPersistenceError::io("list", &dir, e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|e| e == "json")
                    && path.file_name().is_some_and(|n| n != AUTOSAVE_FILE)
            })
            .collect();
        paths.sort();

        let mut found = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read(&path) {
                Ok(snapshot) => found.push((path, snapshot)),
                Err(err) => log::warn!("skipping layout file {}: {err}", path.display()),
            }
        }
        Ok(found)
    }
}

/// Temp file, fsync, rename. The temp file is removed if the rename fails.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> LayoutResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LayoutPersistenceError::io("create directory", parent, e))?;
    }

    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp).map_err(|e| LayoutPersistenceError::io("create temp file", &tmp, e))?;
    file.write_all(bytes)
        .map_err(|e| LayoutPersistenceError::io("write temp file", &tmp, e))?;
    file.sync_all()
        .map_err(|e| LayoutPersistenceError::io("sync temp file", &tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        fs::remove_file(&tmp).ok();
        LayoutPersistenceError::io("rename to final", path, e)
    })
}

/// File-name-safe version of a layout name.
pub fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c.to_ascii_lowercase()),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .take(MAX_NAME_LEN)
        .collect();
    if out.is_empty() {
        out.push_str("layout");
    }
    out
}
