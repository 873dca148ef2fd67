//! Source tree license file scan

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{CheckError, Result};

use super::check::{evaluate_subjects, CheckReport, LicenseSource, Subject};
use super::classifier::LicenseTextClassifier;

/// File name prefixes that mark a license file. `NOTICE` files hold
/// attribution, not license text, and are left out.
const LICENSE_FILE_PREFIXES: &[&str] = &["LICENSE", "LICENCE", "COPYING"];

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules"];

/// Whether a file name looks like a license file (`LICENSE`, `COPYING.txt`,
/// `LICENSE-MIT`, `copying.md`, ...)
pub fn is_license_file(file_name: &str) -> bool {
    let upper = file_name.to_ascii_uppercase();
    LICENSE_FILE_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

/// Find license files under `dir`, relative to it, in sorted order
pub fn find_license_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CheckError::NotADirectory(dir.to_path_buf()).into());
    }

    let files = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.depth() > 0 && e.file_type().is_dir() && SKIPPED_DIRS.iter().any(|d| *d == name))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    path = ?e.path(),
                    error = %e,
                    "skipping unreadable entry"
                );
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_license_file(&e.file_name().to_string_lossy()))
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    Ok(files)
}

/// Classify every license file under `dir` against the configured policy
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn scan_directory(dir: &Path, config: &Config) -> Result<CheckReport> {
    let files = find_license_files(dir)?;
    info!(files = files.len(), "scanning license files");

    let subjects = files
        .into_iter()
        .map(|relative| Subject {
            name: relative.display().to_string(),
            version: None,
            source: LicenseSource::File(dir.join(&relative)),
            license_file: Some(relative),
        })
        .collect();

    Ok(evaluate_subjects(subjects, config, LicenseTextClassifier::new()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use license_gather_spdx::LicenseCategory;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_is_license_file() {
        assert!(is_license_file("LICENSE"));
        assert!(is_license_file("LICENSE-MIT"));
        assert!(is_license_file("license.txt"));
        assert!(is_license_file("Licence.md"));
        assert!(is_license_file("COPYING"));
        assert!(!is_license_file("NOTICE"));
        assert!(!is_license_file("notice.txt"));
        assert!(!is_license_file("README.md"));
        assert!(!is_license_file("src"));
    }

    #[test]
    fn test_find_license_files_skips_build_dirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "LICENSE", "MIT");
        write(temp.path(), "vendor/zlib/COPYING", "zlib");
        write(temp.path(), "target/debug/LICENSE", "ignored");
        write(temp.path(), "node_modules/x/LICENSE", "ignored");
        write(temp.path(), "src/main.rs", "fn main() {}");

        let files = find_license_files(temp.path()).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("LICENSE"), PathBuf::from("vendor/zlib/COPYING")]
        );
    }

    #[test]
    fn test_find_license_files_requires_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("LICENSE");
        std::fs::write(&file, "MIT").unwrap();
        assert!(find_license_files(&file).is_err());
    }

    #[tokio::test]
    async fn test_scan_directory() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "LICENSE-APACHE",
            "                                 Apache License\n                           Version 2.0, January 2004\n",
        );
        write(
            temp.path(),
            "LICENSE-MIT",
            "Permission is hereby granted, free of charge, to any person obtaining a copy\n",
        );
        write(
            temp.path(),
            "third_party/gpl/COPYING",
            "GNU GENERAL PUBLIC LICENSE\nVersion 2, June 1991\n",
        );

        let report = scan_directory(temp.path(), &Config::default()).await.unwrap();

        assert_eq!(report.verdicts.len(), 3);
        assert_eq!(report.summary.batches, 1);
        assert_eq!(report.verdicts[0].name, "LICENSE-APACHE");
        assert_eq!(report.verdicts[0].category, Some(LicenseCategory::A));
        assert_eq!(report.verdicts[1].category, Some(LicenseCategory::A));
        assert_eq!(report.verdicts[2].category, Some(LicenseCategory::X));
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_scan_apache_project_with_notice() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "LICENSE",
            "                                 Apache License\n                           Version 2.0, January 2004\n",
        );
        write(
            temp.path(),
            "NOTICE",
            "Apache Example\nCopyright 2024 The Apache Software Foundation\n\n\
             This product includes software developed at\n\
             The Apache Software Foundation (http://www.apache.org/).\n",
        );

        let report = scan_directory(temp.path(), &Config::default()).await.unwrap();

        assert_eq!(report.verdicts.len(), 1);
        assert_eq!(report.verdicts[0].name, "LICENSE");
        assert_eq!(report.verdicts[0].category, Some(LicenseCategory::A));
        assert_eq!(report.error_count(), 0);
        assert!(report.passed());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "LICENSE", "MIT");
        write(temp.path(), "locked/LICENSE", "MIT");
        let locked = temp.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let files = find_license_files(temp.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores permission bits, so the locked file may still be found
        let files = files.unwrap();
        assert_eq!(files[0], PathBuf::from("LICENSE"));
        assert!(files.len() <= 2);
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let report = scan_directory(temp.path(), &Config::default()).await.unwrap();
        assert!(report.verdicts.is_empty());
        assert!(report.passed());
    }
}
