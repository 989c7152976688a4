//! Saved game instances.
//!
//! An instance is a private copy of a story package under the saves
//! directory, plus an `instance.json` recording the story it came from and
//! the last position reached:
//!
//! ```text
//! <saves>/<name>/instance.json   {"story_id": "...", "entry_point": "w.r.z.room"}
//! <saves>/<name>/.lock           held exclusively while the instance is played
//! <saves>/<name>/story.json ...  copied story tree
//! ```
//!
//! Only the position is persisted. Room contents and the character's
//! inventory start fresh on every load.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::errors::{AdventureError, AdventureResult};
use super::loader::{Loader, STORY_FILE};
use super::state::{GameState, PositionStore};
use super::types::{EntryPath, Story};
use crate::validation::validate_instance_name;

pub const INSTANCE_FILE: &str = "instance.json";
pub const LOCK_FILE: &str = ".lock";

/// Contents of `instance.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub story_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
}

/// Write `content` to `path` by way of a temp file in the same directory,
/// holding an exclusive lock on the destination while doing so.
/// Write, flush and sync `content`, returning the first failure.
fn write_synced<W: Write>(
    out: &mut W,
    content: &str,
    sync: impl FnOnce(&mut W) -> io::Result<()>,
) -> io::Result<()> {
    out.write_all(content.as_bytes())?;
    out.flush()?;
    sync(out)
}

fn write_json_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(INSTANCE_FILE);
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                if let Err(e) = write_synced(&mut tmp, content, |f| f.sync_all()) {
                    let _ = fs::remove_file(&candidate);
                    return Err(e);
                }
                break candidate;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    let _ = lock_file.unlock();
    Ok(())
}

/// `instance.json` of one instance; records positions as the player moves.
#[derive(Debug, Clone)]
pub struct InstanceFile {
    path: PathBuf,
    story_id: String,
}

impl InstanceFile {
    pub fn new<P: AsRef<Path>>(instance_dir: P, story_id: &str) -> Self {
        Self {
            path: instance_dir.as_ref().join(INSTANCE_FILE),
            story_id: story_id.to_string(),
        }
    }

    pub fn read<P: AsRef<Path>>(instance_dir: P) -> AdventureResult<InstanceRecord> {
        let path = instance_dir.as_ref().join(INSTANCE_FILE);
        if !path.is_file() {
            return Err(AdventureError::NotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|e| AdventureError::malformed(&path, e.to_string()))
    }

    pub fn write(&self, entry_point: Option<&EntryPath>) -> io::Result<()> {
        let record = InstanceRecord {
            story_id: self.story_id.clone(),
            entry_point: entry_point.map(EntryPath::to_string),
        };
        let json = serde_json::to_string_pretty(&record)?;
        write_json_atomic(&self.path, &json)
    }
}

impl PositionStore for InstanceFile {
    fn record(&mut self, position: &EntryPath) -> AdventureResult<()> {
        self.write(Some(position))
            .map_err(|source| AdventureError::PositionWrite {
                path: position.to_string(),
                source,
            })
    }
}

/// Exclusive advisory lock on an instance directory.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    name: String,
}

impl InstanceLock {
    pub fn acquire<P: AsRef<Path>>(instance_dir: P, name: &str) -> AdventureResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(instance_dir.as_ref().join(LOCK_FILE))?;
        file.try_lock_exclusive()
            .map_err(|_| AdventureError::InstanceLocked(name.to_string()))?;
        debug!("Locked instance {}", name);
        Ok(Self {
            file,
            name: name.to_string(),
        })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("Released instance {}", self.name);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorySummary {
    /// Directory name under the stories directory; what `new` expects.
    pub dir_name: String,
    pub story: Story,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    pub name: String,
    pub record: InstanceRecord,
}

fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn checked_name(name: &str) -> AdventureResult<&str> {
    validate_instance_name(name)
        .map_err(|e| AdventureError::InvalidIdentifier(format!("{}: {}", name, e)))
}

/// Sorted names of the subdirectories of `dir` that contain `marker`.
fn dirs_with(dir: &Path, marker: &str) -> AdventureResult<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.join(marker).is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            found.push((name.to_string(), path));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// The stories available, the saved instances, and the one being played.
pub struct GameSession {
    stories_dir: PathBuf,
    saves_dir: PathBuf,
    game: Option<GameState>,
    catalog: Option<Loader>,
    story: Option<Story>,
    instance_name: Option<String>,
    lock: Option<InstanceLock>,
    exit_requested: bool,
}

impl GameSession {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(stories_dir: P, saves_dir: Q) -> Self {
        Self {
            stories_dir: stories_dir.as_ref().to_path_buf(),
            saves_dir: saves_dir.as_ref().to_path_buf(),
            game: None,
            catalog: None,
            story: None,
            instance_name: None,
            lock: None,
            exit_requested: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.game.is_some()
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// The loaded game together with its item catalog.
    pub fn active(&mut self) -> AdventureResult<(&mut GameState, &Loader)> {
        match (self.game.as_mut(), self.catalog.as_ref()) {
            (Some(game), Some(catalog)) => Ok((game, catalog)),
            _ => Err(AdventureError::NoActiveGame),
        }
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Drop the loaded game and release its lock.
    pub fn unload(&mut self) {
        if let Some(name) = self.instance_name.take() {
            info!("Unloading game instance {}", name);
        }
        self.game = None;
        self.catalog = None;
        self.story = None;
        self.lock = None;
    }

    /// Stories under the stories directory. Packages whose `story.json`
    /// cannot be read are logged and left out.
    pub fn list_stories(&self) -> AdventureResult<Vec<StorySummary>> {
        let mut stories = Vec::new();
        for (dir_name, path) in dirs_with(&self.stories_dir, STORY_FILE)? {
            match Loader::read_story(path.join(STORY_FILE)) {
                Ok(story) => stories.push(StorySummary { dir_name, story }),
                Err(e) => warn!("Skipping story {}: {}", dir_name, e),
            }
        }
        Ok(stories)
    }

    pub fn list_instances(&self) -> AdventureResult<Vec<InstanceSummary>> {
        let mut instances = Vec::new();
        for (name, path) in dirs_with(&self.saves_dir, INSTANCE_FILE)? {
            match InstanceFile::read(&path) {
                Ok(record) => instances.push(InstanceSummary { name, record }),
                Err(e) => warn!("Skipping instance {}: {}", name, e),
            }
        }
        Ok(instances)
    }

    /// Copy a story into a new instance directory and load it. A directory
    /// left behind by a failed load is removed again.
    pub fn create_instance(&mut self, story_id: &str, name: &str) -> AdventureResult<()> {
        checked_name(story_id)?;
        checked_name(name)?;

        let story_dir = self.stories_dir.join(story_id);
        if !story_dir.join(STORY_FILE).is_file() {
            return Err(AdventureError::NotFound(format!("story '{}'", story_id)));
        }
        let instance_dir = self.saves_dir.join(name);
        if instance_dir.exists() {
            return Err(AdventureError::InstanceExists(name.to_string()));
        }

        info!("Creating game instance {} from story {}", name, story_id);
        let created = copy_dir_recursive(&story_dir, &instance_dir)
            .and_then(|_| InstanceFile::new(&instance_dir, story_id).write(None))
            .map_err(AdventureError::from)
            .and_then(|_| self.load_instance(name));

        if let Err(e) = created {
            warn!("Removing incomplete instance {}: {}", name, e);
            if let Err(rm) = fs::remove_dir_all(&instance_dir) {
                warn!("Could not remove {}: {}", instance_dir.display(), rm);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Load a saved instance, resuming at its recorded position when that
    /// position is a full `world.region.zone.room` path.
    ///
    /// On failure the previously loaded game, if any, stays active.
    pub fn load_instance(&mut self, name: &str) -> AdventureResult<()> {
        checked_name(name)?;
        let dir = self.saves_dir.join(name);
        if !dir.join(INSTANCE_FILE).is_file() {
            return Err(AdventureError::NotFound(format!("game instance '{}'", name)));
        }
        if self.instance_name.as_deref() == Some(name) {
            self.unload();
        }

        let lock = InstanceLock::acquire(&dir, name)?;
        let record = InstanceFile::read(&dir)?;
        let loader = Loader::new(&dir);
        let story = loader.load_story()?;

        let entry = record.entry_point.as_deref().and_then(|raw| {
            let parsed = EntryPath::parse(raw);
            if parsed.is_none() {
                debug!("Ignoring saved position '{}'", raw);
            }
            parsed
        });
        let world_id = entry
            .as_ref()
            .map(|p| p.world().to_string())
            .unwrap_or_else(|| story.default_world_id.clone());
        let world = loader.load_world(&world_id, entry.as_ref())?;

        let positions = InstanceFile::new(&dir, &record.story_id);
        let state = GameState::at_entry(world, Box::new(positions))
            .ok_or_else(|| AdventureError::malformed(dir.join(STORY_FILE), "world has no entry room"))?;

        info!(
            "Loaded game instance {} (story {}, at {})",
            name,
            story.id,
            state.position()
        );
        self.game = Some(state);
        self.catalog = Some(loader);
        self.story = Some(story);
        self.instance_name = Some(name.to_string());
        self.lock = Some(lock);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_record_rewrites_instance_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut file = InstanceFile::new(tmp.path(), "manor");
        file.write(None).unwrap();
        assert_eq!(
            InstanceFile::read(tmp.path()).unwrap(),
            InstanceRecord {
                story_id: "manor".to_string(),
                entry_point: None
            }
        );

        file.record(&EntryPath::new("w1", "r1", "z1", "hall")).unwrap();
        let record = InstanceFile::read(tmp.path()).unwrap();
        assert_eq!(record.entry_point.as_deref(), Some("w1.r1.z1.hall"));

        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_sync_is_reported() {
        let mut buffer = Vec::new();
        let err = write_synced(&mut buffer, "{}", |_| {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
        assert_eq!(buffer, b"{}");

        let mut buffer = Vec::new();
        write_synced(&mut buffer, "{}", |_| Ok(())).unwrap();
    }

    #[test]
    fn record_into_missing_parent_is_position_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut file = InstanceFile::new(&blocker, "manor");

        let err = file.record(&EntryPath::new("w", "r", "z", "room")).unwrap_err();
        assert!(matches!(err, AdventureError::PositionWrite { ref path, .. } if path == "w.r.z.room"));
    }

    #[test]
    fn second_lock_on_same_instance_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let first = InstanceLock::acquire(tmp.path(), "save").unwrap();
        let second = InstanceLock::acquire(tmp.path(), "save");
        assert!(matches!(second, Err(AdventureError::InstanceLocked(ref n)) if n == "save"));
        drop(first);
        assert!(InstanceLock::acquire(tmp.path(), "save").is_ok());
    }

    #[test]
    fn listings_are_empty_without_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let session = GameSession::new(tmp.path().join("stories"), tmp.path().join("saves"));
        assert!(session.list_stories().unwrap().is_empty());
        assert!(session.list_instances().unwrap().is_empty());
        assert!(!session.is_active());
    }
}
