//! Translation of absolute paths into resource-relative references.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::TRACING_TARGET;
use crate::config::PathTranslation;
use crate::scheduler::SharedResourcePath;

/// Memoized translations keyed by absolute path.
///
/// All occurrences of one path across the workflow resolve to the same
/// `Arc`, so the scheduler sees one reference identity per path.
pub type SharedPathMap = HashMap<PathBuf, Arc<SharedResourcePath>>;

/// Translates an absolute path into a resource-relative reference.
///
/// The first translation whose base directory is a proper prefix of the
/// path wins. Returns `None` when no base matches, when the path equals a
/// base exactly, or when no translations are configured; callers fall
/// through to transfer or plain-path handling.
pub fn translate_path(
    path: &Path,
    translations: &[PathTranslation],
    memo: &mut SharedPathMap,
) -> Option<Arc<SharedResourcePath>> {
    if let Some(shared) = memo.get(path) {
        return Some(Arc::clone(shared));
    }
    for translation in translations {
        let Ok(relative) = path.strip_prefix(&translation.base_dir) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        trace!(
            target: TRACING_TARGET,
            path = %path.display(),
            namespace = %translation.namespace,
            "translated path to shared reference"
        );
        let shared = Arc::new(SharedResourcePath::new(
            relative,
            translation.namespace.clone(),
            path.to_string_lossy(),
        ));
        memo.insert(path.to_owned(), Arc::clone(&shared));
        return Some(shared);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translations() -> Vec<PathTranslation> {
        vec![
            PathTranslation::new("study", "/data/study"),
            PathTranslation::new("shared", "/data"),
        ]
    }

    #[test]
    fn test_first_matching_base_wins() {
        let mut memo = SharedPathMap::new();
        let shared =
            translate_path(Path::new("/data/study/s1/t1.nii"), &translations(), &mut memo)
                .unwrap();
        assert_eq!(shared.namespace, "study");
        assert_eq!(shared.relative_path, PathBuf::from("s1/t1.nii"));
        assert_eq!(shared.uuid, "/data/study/s1/t1.nii");
    }

    #[test]
    fn test_falls_back_to_later_base() {
        let mut memo = SharedPathMap::new();
        let shared =
            translate_path(Path::new("/data/other/t1.nii"), &translations(), &mut memo).unwrap();
        assert_eq!(shared.namespace, "shared");
        assert_eq!(shared.relative_path, PathBuf::from("other/t1.nii"));
    }

    #[test]
    fn test_repeated_paths_share_identity() {
        let mut memo = SharedPathMap::new();
        let first =
            translate_path(Path::new("/data/study/t1.nii"), &translations(), &mut memo).unwrap();
        let second =
            translate_path(Path::new("/data/study/t1.nii"), &translations(), &mut memo).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unmatched_path_is_not_translated() {
        let mut memo = SharedPathMap::new();
        assert!(translate_path(Path::new("/tmp/t1.nii"), &translations(), &mut memo).is_none());
        assert!(memo.is_empty());
    }

    #[test]
    fn test_path_equal_to_base_is_not_translated() {
        let mut memo = SharedPathMap::new();
        let only = [PathTranslation::new("study", "/data/study")];
        assert!(translate_path(Path::new("/data/study"), &only, &mut memo).is_none());
    }

    #[test]
    fn test_path_equal_to_base_falls_through_to_next() {
        let mut memo = SharedPathMap::new();
        let shared =
            translate_path(Path::new("/data/study"), &translations(), &mut memo).unwrap();
        assert_eq!(shared.namespace, "shared");
        assert_eq!(shared.relative_path, PathBuf::from("study"));
    }

    #[test]
    fn test_no_translations_configured() {
        let mut memo = SharedPathMap::new();
        assert!(translate_path(Path::new("/data/study/t1.nii"), &[], &mut memo).is_none());
    }
}
