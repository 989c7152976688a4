//! Test utilities & fixtures.
//! The story fixtures live under `tests/fixtures/stories`; tests that load or
//! modify them work on a temp copy.

use std::fs;
use std::path::{Path, PathBuf};

use shadowtext::adventure::{CommandEngine, GameSession, Loader, Response};

/// Return the path to the static fixture directory.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Writable copy of the fixtures: `<tmp>/stories/manor` and an empty
/// `<tmp>/saves`.
pub fn writable_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    copy_tree(&fixture_root().join("stories"), &tmp.path().join("stories"));
    fs::create_dir_all(tmp.path().join("saves")).unwrap();
    tmp
}

#[allow(dead_code)]
pub fn manor_dir(tmp: &tempfile::TempDir) -> PathBuf {
    tmp.path().join("stories").join("manor")
}

#[allow(dead_code)]
pub fn room_file(story_dir: &Path, room_id: &str) -> PathBuf {
    story_dir
        .join("worlds/w1/r1/z1/rooms")
        .join(format!("{}.json", room_id))
}

/// Loader reading straight from the story package of the fixture copy.
#[allow(dead_code)]
pub fn manor_loader(tmp: &tempfile::TempDir) -> Loader {
    Loader::new(manor_dir(tmp))
}

#[allow(dead_code)]
pub fn session(tmp: &tempfile::TempDir) -> GameSession {
    GameSession::new(tmp.path().join("stories"), tmp.path().join("saves"))
}

/// Execute one line, panicking only on the errors the engine hands back.
#[allow(dead_code)]
pub fn run(engine: &mut CommandEngine, session: &mut GameSession, line: &str) -> Response {
    engine
        .execute(session, line)
        .unwrap_or_else(|e| panic!("'{}' returned an error: {}", line, e))
}
