//! Collision-safe artifact files.
//!
//! Artifacts are named `<prefix>_<hash>_<unix-seconds>.<ext>` and opened with
//! create-new semantics; an existing file is never overwritten. When a name
//! is taken a fresh hash is drawn.

use chrono::Utc;
use spcf_core::{Error, Result};
use spcf_workspace::generate_hash;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_NAME_ATTEMPTS: u32 = 16;

/// Naming inputs for a new artifact.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactName<'a> {
    pub prefix: &'a str,
    pub extension: &'a str,
    /// Mixed into the generation hash (typically the user id).
    pub hash_seed: &'a str,
    pub hash_length: usize,
}

/// Write a new artifact into `dir`.
///
/// `render` receives the generation hash chosen for the filename so the
/// content can embed it.
pub fn write_new(dir: &Path, name: ArtifactName<'_>, render: impl Fn(&str) -> String) -> Result<PathBuf> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let now = Utc::now();
        let nanos = now.timestamp_nanos_opt().unwrap_or_default();
        let hash = generate_hash(
            &format!("{}{nanos}{attempt}{:x}", name.hash_seed, rand::random::<u32>()),
            name.hash_length,
        );
        let filename = format!("{}_{hash}_{}.{}", name.prefix, now.timestamp(), name.extension);
        let path = dir.join(&filename);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(file = %filename, "Artifact name taken, drawing a new hash");
                continue;
            }
            Err(e) => return Err(Error::io("creating artifact", &path, e)),
        };

        let content = render(&hash);
        if let Err(e) = file.write_all(content.as_bytes()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(Error::io("writing artifact", &path, e));
        }

        debug!(path = %path.display(), bytes = content.len(), "Artifact written");
        return Ok(path);
    }

    Err(Error::Duplicate(format!(
        "No free artifact name for prefix '{}' in {} after {MAX_NAME_ATTEMPTS} attempts",
        name.prefix,
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(prefix: &str) -> ArtifactName<'_> {
        ArtifactName {
            prefix,
            extension: "xml",
            hash_seed: "user1",
            hash_length: 8,
        }
    }

    #[test]
    fn filename_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_new(tmp.path(), name("seed_prompt"), |_| "<synai/>".into()).unwrap();
        let file = path.file_name().unwrap().to_str().unwrap();

        let parts: Vec<&str> = file.trim_end_matches(".xml").rsplitn(3, '_').collect();
        assert_eq!(parts[2], "seed_prompt");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[0].parse::<i64>().is_ok());
    }

    #[test]
    fn render_sees_the_filename_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_new(tmp.path(), name("p"), |hash| format!("hash={hash}")).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let hash = content.strip_prefix("hash=").unwrap();
        assert!(path.to_str().unwrap().contains(hash));
    }

    #[test]
    fn repeated_writes_never_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..20)
            .map(|i| write_new(tmp.path(), name("p"), |_| format!("{i}")).unwrap())
            .collect();
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 20);
        for (i, p) in paths.iter().enumerate() {
            assert_eq!(fs::read_to_string(p).unwrap(), i.to_string());
        }
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_new(&tmp.path().join("nope"), name("p"), |_| String::new()).unwrap_err();
        assert_eq!(err.kind(), spcf_core::ErrorKind::Io);
    }
}
