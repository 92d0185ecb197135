//! Input path helpers.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Video extensions searched for when an input is a directory.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "lrv"];

/// Returns the lower case extension if it is one of `ext` (lower case).
pub fn has_extension(path: &Path, ext: &[&str]) -> Option<String> {
    let e = path.extension()?.to_string_lossy().to_ascii_lowercase();
    ext.contains(&e.as_str()).then_some(e)
}

/// File stem, e.g. `GH010026` for `GH010026.MP4`.
pub fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "telemetry".to_owned())
}

/// Expands `inputs` into files. Files are kept as is and in order,
/// directories are walked for MP4/LRV clips, sorted by path.
/// Unreadable directory entries are skipped.
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|input| {
            if input.is_dir() {
                let mut paths: Vec<PathBuf> = WalkDir::new(input)
                    .into_iter()
                    .filter_map(|result| result.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|p| has_extension(p, VIDEO_EXTENSIONS).is_some())
                    .collect();
                paths.sort();
                debug!("{} clips in {}", paths.len(), input.display());
                paths
            } else {
                vec![input.to_owned()]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(has_extension(Path::new("GH010026.MP4"), VIDEO_EXTENSIONS), Some("mp4".to_owned()));
        assert_eq!(has_extension(Path::new("GL010026.LRV"), VIDEO_EXTENSIONS), Some("lrv".to_owned()));
        assert_eq!(has_extension(Path::new("GH010026.THM"), VIDEO_EXTENSIONS), None);
        assert_eq!(basename(Path::new("/videos/GH010026.MP4")), "GH010026");
    }

    #[test]
    fn walks_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["GH020026.MP4", "GH010026.MP4", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let single = dir.path().join("single.mp4");
        let paths = collect_inputs(&[single.clone(), dir.path().to_owned()]);
        assert_eq!(
            paths,
            vec![single, dir.path().join("GH010026.MP4"), dir.path().join("GH020026.MP4")]
        );
    }
}
