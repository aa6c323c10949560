use std::io::Write;
use std::path::Path;

/// Write `bytes` to `path` so readers see either the old file or the new one,
/// never a partial write: the content goes to a sibling temp file which is
/// then renamed over the target. Parent directories are created as needed.
///
/// # Errors
///
/// Returns the underlying I/O error if any step fails.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, b"old").unwrap();

        write_file_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "out.json")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.txt");
        write_file_atomic(&path, b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn concurrent_writers_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let path = &path;
                scope.spawn(move || {
                    let payload = format!("{{\"writer\":{writer}}}");
                    for _ in 0..100 {
                        write_file_atomic(path, payload.as_bytes()).unwrap();
                    }
                });
            }
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!((0..4).any(|w| content == format!("{{\"writer\":{w}}}")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
