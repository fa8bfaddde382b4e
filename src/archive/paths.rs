//! Path and filesystem helpers shared by the readers.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::error::{Error, Result};
use crate::config::ExtractConfig;

/// Resolve an archive-internal entry name to its target under `dest`.
///
/// Backslashes are treated as separators. With `contain_paths` set, absolute
/// names and names climbing out of `dest` are rejected.
pub fn resolve_entry(dest: &Path, name: &str, config: &ExtractConfig) -> Result<PathBuf> {
    let name = name.replace('\\', "/");
    let relative = Path::new(&name);

    if !config.contain_paths {
        return Ok(dest.join(relative));
    }

    let base = normalize(dest);
    let resolved = normalize(&base.join(relative));
    if relative.has_root() || !resolved.starts_with(&base) {
        return Err(Error::PathEscape {
            entry: name,
            resolved,
        });
    }

    Ok(resolved)
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(result.components().next_back(), Some(Component::Normal(_))) {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }

    result
}

/// Drop everything from the last `.` on: `foo.txt.gz` -> `foo.txt`.
/// A name without a `.` is returned unchanged.
pub fn strip_last_suffix(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Remove every child of `dir`, keeping `dir` itself.
pub fn clean_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Create a directory tree, logging instead of failing.
pub fn create_dir_lenient(path: &Path) {
    if let Err(e) = fs::create_dir_all(path) {
        debug!(path = %path.display(), error = %e, "Ignoring directory creation failure");
    }
}

/// Create the parent directory of `target` if it has one.
pub fn ensure_parent(target: &Path) {
    if let Some(parent) = target.parent() {
        create_dir_lenient(parent);
    }
}

/// Stream `reader` into `writer` through a buffer of `buffer_size` bytes.
pub fn copy_bounded<R, W>(reader: &mut R, writer: &mut W, buffer_size: usize) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    writer.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base() -> &'static Path {
        Path::new("/srv/out")
    }

    #[test]
    fn test_resolve_plain_entry() {
        let config = ExtractConfig::default();
        let resolved = resolve_entry(base(), "data/readme.txt", &config).unwrap();
        assert_eq!(resolved, Path::new("/srv/out/data/readme.txt"));
    }

    #[test]
    fn test_resolve_backslashes_and_dots() {
        let config = ExtractConfig::default();
        let resolved = resolve_entry(base(), "data\\.\\sub\\..\\a.txt", &config).unwrap();
        assert_eq!(resolved, Path::new("/srv/out/data/a.txt"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let config = ExtractConfig::default();
        let result = resolve_entry(base(), "../../etc/passwd", &config);
        assert!(matches!(result, Err(Error::PathEscape { .. })));

        let result = resolve_entry(base(), "/etc/passwd", &config);
        assert!(matches!(result, Err(Error::PathEscape { .. })));
    }

    #[test]
    fn test_resolve_relative_destination() {
        let config = ExtractConfig::default();
        let resolved = resolve_entry(Path::new("../out"), "a/b.txt", &config).unwrap();
        assert_eq!(resolved, Path::new("../out/a/b.txt"));

        let result = resolve_entry(Path::new("out"), "../../x", &config);
        assert!(matches!(result, Err(Error::PathEscape { .. })));
    }

    #[test]
    fn test_resolve_unguarded_joins_verbatim() {
        let config = ExtractConfig {
            contain_paths: false,
            ..Default::default()
        };
        let resolved = resolve_entry(base(), "../x", &config).unwrap();
        assert_eq!(resolved, Path::new("/srv/out/../x"));
    }

    #[test]
    fn test_strip_last_suffix() {
        assert_eq!(strip_last_suffix("foo.txt.gz"), "foo.txt");
        assert_eq!(strip_last_suffix("foo.bz2"), "foo");
        assert_eq!(strip_last_suffix("mygz"), "mygz");
        assert_eq!(strip_last_suffix(".gz"), "");
    }

    #[test]
    fn test_clean_dir_keeps_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/c.txt"), b"c").unwrap();
        fs::write(dir.path().join("top.txt"), b"t").unwrap();

        clean_dir(dir.path()).unwrap();

        assert!(dir.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_bounded_small_buffer() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut out = Vec::new();
        let copied = copy_bounded(&mut data.as_slice(), &mut out, 7).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);
    }
}
