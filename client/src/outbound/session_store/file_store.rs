//! File-backed durable session store.
//!
//! The session lives in one JSON file. Writes go to a uniquely named sibling
//! file that is renamed over the target, so readers never see a half-written
//! session and concurrent writers never share a temporary file. On Unix the
//! file is created readable by its owner only. All filesystem access goes
//! through `cap_std` directory handles.

use std::ffi::OsString;
use std::io::{self, Write};
#[cfg(unix)]
use cap_std::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use super::dto::StoredSessionDto;
use crate::domain::Session;
use crate::domain::ports::{SessionStore, SessionStoreError};

#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Session store persisting `{access_token, refresh_token}` to a JSON file.
///
/// # Examples
/// ```rust,no_run
/// use platanera_client::domain::Session;
/// use platanera_client::domain::ports::SessionStore;
/// use platanera_client::outbound::session_store::FileSessionStore;
///
/// let store = FileSessionStore::new("/tmp/platanera/session.json");
/// store.save(&Session::try_from_parts("A", "R")?)?;
/// assert!(store.load()?.is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session at `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn parent_and_file_name(&self) -> Result<(&Path, OsString), SessionStoreError> {
        let file_name = self.path.file_name().ok_or_else(|| {
            SessionStoreError::unavailable(format!(
                "session path '{}' has no file name",
                self.path.display()
            ))
        })?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Ok((parent, file_name.to_os_string()))
    }

    /// Open the parent directory; `Ok(None)` when it does not exist yet.
    fn existing_parent(&self) -> Result<Option<(Dir, OsString)>, SessionStoreError> {
        let (parent, file_name) = self.parent_and_file_name()?;
        match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(directory) => Ok(Some((directory, file_name))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(self.unavailable("open session directory", &error)),
        }
    }

    fn unavailable(&self, action: &str, error: &io::Error) -> SessionStoreError {
        SessionStoreError::unavailable(format!(
            "{action} for '{}': {error}",
            self.path.display()
        ))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let Some((directory, file_name)) = self.existing_parent()? else {
            return Ok(None);
        };
        let raw = match directory.read_to_string(Path::new(&file_name)) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.unavailable("read session file", &error)),
        };
        let dto: StoredSessionDto = serde_json::from_str(&raw)
            .map_err(|error| SessionStoreError::corrupt(error.to_string()))?;
        Session::try_from(dto)
            .map(Some)
            .map_err(|error| SessionStoreError::corrupt(error.to_string()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let (parent, file_name) = self.parent_and_file_name()?;
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|error| self.unavailable("create session directory", &error))?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|error| self.unavailable("open session directory", &error))?;

        let contents = serde_json::to_vec_pretty(&StoredSessionDto::from(session))
            .map_err(|error| SessionStoreError::unavailable(error.to_string()))?;
        let temp_name = temp_file_name(&file_name);
        let temp_path = Path::new(&temp_name);
        let replaced = write_private(&directory, temp_path, &contents)
            .map_err(|error| self.unavailable("write session file", &error))
            .and_then(|()| {
                directory
                    .rename(temp_path, &directory, Path::new(&file_name))
                    .map_err(|error| self.unavailable("replace session file", &error))
            });
        if replaced.is_err() {
            if let Err(error) = directory.remove_file(temp_path) {
                debug!(%error, "temporary session file not removed");
            }
        }
        replaced?;
        debug!(path = %self.path.display(), "session stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let Some((directory, file_name)) = self.existing_parent()? else {
            return Ok(());
        };
        match directory.remove_file(Path::new(&file_name)) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session removed");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.unavailable("remove session file", &error)),
        }
    }
}

/// `<file>.<pid>.<sequence>.tmp`, unique across processes and threads.
fn temp_file_name(file_name: &OsString) -> OsString {
    let mut temp_name = file_name.clone();
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    temp_name.push(format!(".{}.{sequence}.tmp", process::id()));
    temp_name
}

fn write_private(directory: &Dir, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(SESSION_FILE_MODE);
    let mut file = directory.open_with(path, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    //! Round-trip coverage against a temporary directory.

    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn session(access: &str) -> Session {
        Session::try_from_parts(access, "R").expect("valid session")
    }

    fn file_names(path: &Path) -> Vec<String> {
        let directory = Dir::open_ambient_dir(path, ambient_authority()).expect("open dir");
        let mut names: Vec<String> = directory
            .entries()
            .expect("list dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    #[rstest]
    fn missing_file_means_no_session(temp_dir: TempDir) {
        let store = FileSessionStore::new(temp_dir.path().join("session.json"));
        assert!(store.load().expect("load").is_none());
    }

    #[rstest]
    fn missing_directory_means_no_session(temp_dir: TempDir) {
        let store = FileSessionStore::new(temp_dir.path().join("absent").join("session.json"));
        assert!(store.load().expect("load").is_none());
        store.clear().expect("clearing nothing succeeds");
    }

    #[rstest]
    fn session_survives_a_new_store_instance(temp_dir: TempDir) {
        let path = temp_dir.path().join("nested").join("session.json");
        FileSessionStore::new(&path)
            .save(&session("A"))
            .expect("save");

        let reloaded = FileSessionStore::new(&path).load().expect("load");
        assert_eq!(reloaded, Some(session("A")));
    }

    #[rstest]
    fn file_uses_storage_key_names(temp_dir: TempDir) {
        let path = temp_dir.path().join("session.json");
        FileSessionStore::new(&path)
            .save(&session("A"))
            .expect("save");

        let directory =
            Dir::open_ambient_dir(temp_dir.path(), ambient_authority()).expect("open dir");
        let raw = directory
            .read_to_string("session.json")
            .expect("read session file");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(
            value,
            serde_json::json!({ "access_token": "A", "refresh_token": "R" })
        );
        assert_eq!(file_names(temp_dir.path()), vec!["session.json"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn session_file_is_private_to_its_owner(temp_dir: TempDir) {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        store.save(&session("A")).expect("first save");
        store.save(&session("A2")).expect("second save");

        let mode = std::fs::metadata(&path)
            .expect("session metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o077, 0, "mode {mode:o} is readable by others");
    }

    #[rstest]
    fn concurrent_saves_all_succeed(temp_dir: TempDir) {
        let path = temp_dir.path().join("session.json");

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let path = &path;
                scope.spawn(move || {
                    FileSessionStore::new(path)
                        .save(&session(&format!("A{writer}")))
                        .expect("save");
                });
            }
        });

        let loaded = FileSessionStore::new(&path)
            .load()
            .expect("load")
            .expect("session present");
        assert!(loaded.access_token().starts_with('A'));
        assert_eq!(file_names(temp_dir.path()), vec!["session.json"]);
    }

    #[rstest]
    fn save_replaces_previous_session(temp_dir: TempDir) {
        let store = FileSessionStore::new(temp_dir.path().join("session.json"));
        store.save(&session("A")).expect("first save");
        store.save(&session("A2")).expect("second save");

        let loaded = store.load().expect("load").expect("session present");
        assert_eq!(loaded.access_token(), "A2");
    }

    #[rstest]
    fn clear_removes_file_and_is_idempotent(temp_dir: TempDir) {
        let store = FileSessionStore::new(temp_dir.path().join("session.json"));
        store.save(&session("A")).expect("save");

        store.clear().expect("first clear");
        store.clear().expect("second clear");

        assert!(store.load().expect("load").is_none());
    }

    #[rstest]
    #[case::not_json("{not json")]
    #[case::missing_key(r#"{"access_token":"A"}"#)]
    #[case::blank_token(r#"{"access_token":"","refresh_token":"R"}"#)]
    fn unreadable_contents_are_corrupt(temp_dir: TempDir, #[case] contents: &str) {
        let directory =
            Dir::open_ambient_dir(temp_dir.path(), ambient_authority()).expect("open dir");
        directory
            .write("session.json", contents)
            .expect("write fixture");
        let store = FileSessionStore::new(temp_dir.path().join("session.json"));

        let err = store.load().expect_err("corrupt file");

        assert!(matches!(err, SessionStoreError::Corrupt { .. }));
    }
}
