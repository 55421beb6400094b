use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Discovers TypeScript root files under a directory. Declaration-only
/// `.d.ts` files and `node_modules` trees are excluded; results are sorted
/// so downstream output is stable.
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan_directory(&self, root_path: &Path) -> Result<Vec<PathBuf>> {
        let entries: Vec<_> = WalkDir::new(root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.file_name().to_str() != Some("node_modules")
            })
            .filter_map(|e| e.ok())
            .filter(|entry| entry.path().is_file())
            .collect();

        let mut files: Vec<PathBuf> = entries
            .par_iter()
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?;
                if name.ends_with(".d.ts") {
                    return None;
                }
                match path.extension()?.to_str()? {
                    "ts" | "tsx" => Some(path.to_path_buf()),
                    _ => None,
                }
            })
            .collect();

        files.sort();
        Ok(files)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
