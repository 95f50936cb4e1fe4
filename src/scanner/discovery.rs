//! Expands user-supplied roots into the file list of a scan job

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Files to scan plus directories cut off by the depth limit
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Targets {
    pub files: BTreeSet<PathBuf>,
    pub too_deep: BTreeSet<PathBuf>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.too_deep.is_empty()
    }
}

/// Walk every root down to `max_depth` directory levels
///
/// Hidden files are included and no ignore files are honoured: everything on
/// disk is a candidate. A directory more than `max_depth` levels below its
/// root is reported in `too_deep` and not descended into. A root that does
/// not exist is passed through as a file so the scan reports it unreadable.
pub fn collect_targets(roots: &[PathBuf], max_depth: usize) -> Targets {
    let mut targets = Targets::default();

    for root in roots {
        if !root.is_dir() {
            targets.files.insert(root.clone());
            continue;
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .max_depth(Some(max_depth + 1))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping during traversal of {}: {}", root.display(), e);
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if entry.depth() > max_depth {
                    tracing::debug!("Directory too deep: {}", entry.path().display());
                    targets.too_deep.insert(entry.into_path());
                }
            } else if file_type.is_file() {
                targets.files.insert(entry.into_path());
            }
        }
    }

    tracing::debug!(
        "Collected {} files ({} directories too deep) from {} roots",
        targets.files.len(),
        targets.too_deep.len(),
        roots.len()
    );
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hidden_and_ignored_files_are_included() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
        fs::write(root.join("app.log"), "x").unwrap();
        fs::write(root.join(".secret"), "x").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/a.txt"), "x").unwrap();

        let targets = collect_targets(&[root.to_path_buf()], 10);
        let names: Vec<_> = targets
            .files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();

        assert!(names.contains(&".gitignore".to_string()));
        assert!(names.contains(&"app.log".to_string()));
        assert!(names.contains(&".secret".to_string()));
        assert!(names.contains(&"sub/a.txt".to_string()));
        assert!(targets.too_deep.is_empty());
    }

    #[test]
    fn test_depth_limit_reports_directory_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let deep = root.join("l1/l2/l3");
        fs::create_dir_all(deep.join("l4")).unwrap();
        fs::write(root.join("l1/top.txt"), "x").unwrap();
        fs::write(root.join("l1/l2/mid.txt"), "x").unwrap();
        fs::write(deep.join("low.txt"), "x").unwrap();
        fs::write(deep.join("l4/lowest.txt"), "x").unwrap();

        let targets = collect_targets(&[root.to_path_buf()], 2);

        assert!(targets.files.contains(&root.join("l1/top.txt")));
        assert!(targets.files.contains(&root.join("l1/l2/mid.txt")));
        assert!(!targets.files.contains(&deep.join("low.txt")));
        assert_eq!(targets.too_deep.len(), 1);
        assert!(targets.too_deep.contains(&deep));
    }

    #[test]
    fn test_file_roots_and_missing_roots_pass_through() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("single.txt");
        fs::write(&file, "x").unwrap();
        let missing = temp_dir.path().join("missing.txt");

        let targets = collect_targets(&[file.clone(), missing.clone(), file.clone()], 10);
        assert_eq!(targets.files.len(), 2);
        assert!(targets.files.contains(&file));
        assert!(targets.files.contains(&missing));
    }
}
