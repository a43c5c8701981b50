/*
 Copyright (c) 2023 clone206
 Copyright (c) 2026 polyconv contributors

 This file is part of polyconv

 polyconv is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 polyconv is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with polyconv. If not, see <https://www.gnu.org/licenses/>.
*/

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common_path::common_path_all;
use log::trace;

/// Expand files and folders into the sorted, de-duplicated list of files
/// whose extension matches one of `extensions` (case-insensitive).
/// Folders are only descended into past the first level when `recurse` is set.
pub fn find_files(
    paths: &[PathBuf],
    recurse: bool,
    extensions: &[&str],
) -> io::Result<Vec<PathBuf>> {
    let mut file_paths = Vec::new();
    for path in paths {
        if path.is_dir() {
            if recurse {
                let entries: Vec<PathBuf> = fs::read_dir(path)?
                    .filter_map(|e| e.ok().map(|d| d.path()))
                    .collect();
                file_paths.extend(find_files(&entries, recurse, extensions)?);
            } else {
                for entry in fs::read_dir(path)? {
                    let entry_path = entry?.path();
                    if has_extension(&entry_path, extensions) {
                        file_paths.push(entry_path.canonicalize()?);
                    }
                }
            }
        } else if has_extension(path, extensions) {
            file_paths.push(path.canonicalize()?);
        }
    }
    file_paths.sort();
    file_paths.dedup();
    Ok(file_paths)
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    if path.is_file()
        && let Some(ext) = path.extension()
        && let ext_lower = ext.to_ascii_lowercase().to_string_lossy()
        && extensions.contains(&ext_lower.as_ref())
    {
        return true;
    }
    false
}

/// Directory that output paths are mirrored relative to: the parent of a
/// single input, or the parent of the inputs' lowest common ancestor.
pub fn base_dir(paths: &[PathBuf]) -> PathBuf {
    if paths.len() == 1 {
        paths[0].parent().unwrap_or(Path::new("/")).to_path_buf()
    } else {
        let common = common_path_all(paths.iter().map(|p| p.as_path()))
            .unwrap_or(PathBuf::from("/"));
        common.parent().unwrap_or(Path::new("/")).to_path_buf()
    }
}

/// `<stem>_<suffix>.<ext>` next to `input`, or under `out_dir` at the
/// input's position relative to `base`. Missing subdirectories are created.
pub fn output_path(
    input: &Path,
    base: &Path,
    out_dir: Option<&Path>,
    suffix: &str,
    ext: &str,
) -> io::Result<PathBuf> {
    let parent = input.parent().unwrap_or(Path::new(""));
    let dir = match out_dir {
        Some(out_dir) => {
            let rel = parent.strip_prefix(base).unwrap_or(Path::new(""));
            let dir = out_dir.join(rel);
            if !dir.exists() {
                trace!("Creating output directory {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
            dir
        }
        None => parent.to_path_buf(),
    };

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    Ok(dir.join(format!("{}_{}.{}", stem, suffix, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polyconv-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn discovery_by_extension() {
        let root = scratch("find");
        fs::create_dir_all(root.join("sub")).unwrap();
        for f in ["a.pgm", "b.PGM", "c.bin", "sub/d.pgm"] {
            fs::write(root.join(f), b"x").unwrap();
        }

        let flat = find_files(&[root.clone()], false, &["pgm"]).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pgm", "b.PGM"]);

        let deep = find_files(&[root.clone()], true, &["pgm"]).unwrap();
        assert_eq!(deep.len(), 3);

        let bins = find_files(&[root.join("c.bin"), root.join("c.bin")], false, &["bin"]).unwrap();
        assert_eq!(bins.len(), 1);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn output_next_to_input() {
        let out = output_path(Path::new("/data/img/lena.pgm"), Path::new("/data"), None, "smooth", "pgm")
            .unwrap();
        assert_eq!(out, PathBuf::from("/data/img/lena_smooth.pgm"));
    }

    #[test]
    fn output_mirrors_layout() {
        let root = scratch("mirror");
        let out = output_path(
            Path::new("/data/set1/img/lena.pgm"),
            Path::new("/data"),
            Some(&root),
            "edge",
            "pgm",
        )
        .unwrap();
        assert_eq!(out, root.join("set1/img/lena_edge.pgm"));
        assert!(root.join("set1/img").is_dir());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn base_dir_of_inputs() {
        assert_eq!(base_dir(&[PathBuf::from("/a/b/c.pgm")]), PathBuf::from("/a/b"));
        let many = [PathBuf::from("/a/b/x/1.pgm"), PathBuf::from("/a/b/y/2.pgm")];
        assert_eq!(base_dir(&many), PathBuf::from("/a"));
    }
}
