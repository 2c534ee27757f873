//! Discovery of the texture fallback chain.
//!
//! Every texture directory may carry a `texture.cfg` whose `[fltsim]` section
//! lists further directories to search (`fallback.1`, `fallback.2`, ...). Entries
//! are relative to the directory holding the file and use either separator:
//!
//! ```ini
//! [fltsim]
//! fallback.1=..\..\..\..\texture\DetailMap
//! fallback.2=../texture
//! ```
//!
//! An entry that does not exist relative to its directory is retried against the
//! base install directory with its leading `..` segments removed, which is how
//! liveries and add-ons point at the simulator's shared texture folders.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use schemars::JsonSchema;
use serde::Serialize;

use crate::core::diagnostics::{Diagnostic, Diagnostics};

pub const TEXTURE_CONFIG_FILE: &str = "texture.cfg";
pub const FALLBACK_SECTION: &str = "fltsim";
pub const FALLBACK_KEY_PREFIX: &str = "fallback.";

/// Canonical texture directories in lookup order, root first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct FallbackSet {
    directories: Vec<PathBuf>,
}

impl FallbackSet {
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// First existing file named `relative` in the set, searched in order.
    pub fn find(&self, relative: &Path) -> Option<PathBuf> {
        self.directories
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
    }
}

/// Collects `root` and every directory reachable from it through `texture.cfg`
/// fallback entries, breadth first.
///
/// Each directory is visited at most once, keyed by its canonical path, so
/// cyclic chains terminate. Unresolvable entries and unreadable configuration
/// files are reported in `diagnostics` and skipped.
pub fn collect_fallbacks(
    root: &Path,
    base_install: Option<&Path>,
    diagnostics: &mut Diagnostics,
) -> FallbackSet {
    let root = match existing_dir(root) {
        Some(root) => root,
        None => {
            diagnostics.push(Diagnostic::TextureDirectoryMissing { path: root.to_path_buf() });
            return FallbackSet::default();
        }
    };

    let mut set = FallbackSet::default();
    let mut visited = HashSet::from([root.clone()]);
    let mut queue = VecDeque::from([root]);

    while let Some(dir) = queue.pop_front() {
        for entry in read_fallback_entries(&dir, diagnostics) {
            match resolve_entry(&dir, &entry, base_install) {
                Some(found) => {
                    if visited.insert(found.clone()) {
                        log::debug!("Fallback '{}' of '{}' is '{}'", entry, dir.display(), found.display());
                        queue.push_back(found);
                    }
                }
                None => diagnostics.push(Diagnostic::FallbackNotFound { directory: dir.clone(), entry }),
            }
        }
        set.directories.push(dir);
    }

    log::info!("Collected {} texture directories", set.len());
    set
}

/// `fallback.N` values of the `[fltsim]` section, for N = 1, 2, ... up to the first gap.
pub fn read_fallback_entries(dir: &Path, diagnostics: &mut Diagnostics) -> Vec<String> {
    let path = dir.join(TEXTURE_CONFIG_FILE);
    if !path.is_file() {
        return Vec::new();
    }

    let options = ParseOption { enabled_escape: false, ..Default::default() };
    let conf = match Ini::load_from_file_opt(&path, options) {
        Ok(conf) => conf,
        Err(e) => {
            diagnostics.push(Diagnostic::InvalidTextureConfig { path, reason: e.to_string() });
            return Vec::new();
        }
    };

    let Some(section) = conf
        .iter()
        .find(|(name, _)| name.is_some_and(|n| n.trim().eq_ignore_ascii_case(FALLBACK_SECTION)))
        .map(|(_, properties)| properties)
    else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for n in 1usize.. {
        let key = format!("{}{}", FALLBACK_KEY_PREFIX, n);
        match section.iter().find(|(k, _)| k.trim().eq_ignore_ascii_case(&key)) {
            Some((_, value)) => entries.push(value.trim().trim_matches('"').to_string()),
            None => break,
        }
    }
    entries
}

/// Resolves one entry against `dir`, then against `base_install` with its
/// leading `..` segments stripped. Absolute entries are only looked up as is.
pub fn resolve_entry(dir: &Path, entry: &str, base_install: Option<&Path>) -> Option<PathBuf> {
    if Path::new(entry).is_absolute() {
        return existing_dir(Path::new(entry));
    }

    let segments: Vec<&str> = entry
        .split(['\\', '/'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    let relative: PathBuf = segments.iter().collect();
    if let Some(found) = existing_dir(&dir.join(&relative)) {
        return Some(found);
    }

    let base = base_install?;
    let stripped: PathBuf = segments.iter().skip_while(|s| **s == "..").collect();
    existing_dir(&base.join(stripped))
}

fn existing_dir(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok().filter(|p| p.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_cfg(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(TEXTURE_CONFIG_FILE), body).unwrap();
    }

    #[test]
    fn entries_stop_at_first_gap() {
        let tmp = tempfile::tempdir().unwrap();
        write_cfg(
            tmp.path(),
            "[FLTSIM]\nfallback.1=..\\a\\b\nFallback.2=../c\nfallback.4=d\n\n[other]\nfallback.3=x\n",
        );
        let mut diagnostics = Diagnostics::new();
        assert_eq!(
            read_fallback_entries(tmp.path(), &mut diagnostics),
            vec!["..\\a\\b".to_string(), "../c".to_string()]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn no_config_means_no_entries() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_fallback_entries(tmp.path(), &mut Diagnostics::new()).is_empty());

        write_cfg(tmp.path(), "[somethingelse]\nfallback.1=..\\x\n");
        assert!(read_fallback_entries(tmp.path(), &mut Diagnostics::new()).is_empty());
    }

    #[test]
    fn unreadable_config_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(TEXTURE_CONFIG_FILE), b"[fltsim]\nfallback.1=\xff\xfe\n").unwrap();

        let mut diagnostics = Diagnostics::new();
        assert!(read_fallback_entries(tmp.path(), &mut diagnostics).is_empty());
        assert!(matches!(diagnostics.as_slice(), [Diagnostic::InvalidTextureConfig { .. }]));
    }

    #[test]
    fn both_separators_resolve() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("shared").join("detail");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(tmp.path().join("livery")).unwrap();
        let livery = tmp.path().join("livery");
        let expected = fs::canonicalize(&target).unwrap();

        assert_eq!(resolve_entry(&livery, "..\\shared\\detail", None), Some(expected.clone()));
        assert_eq!(resolve_entry(&livery, "../shared/./detail", None), Some(expected.clone()));
        assert_eq!(resolve_entry(&livery, "..\\shared/detail\\", None), Some(expected));
    }

    #[test]
    fn base_install_is_tried_without_leading_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("Official");
        fs::create_dir_all(base.join("texture").join("DetailMap")).unwrap();
        let livery = tmp.path().join("Community").join("livery").join("texture");
        fs::create_dir_all(&livery).unwrap();

        let found = resolve_entry(&livery, "..\\..\\..\\..\\texture\\DetailMap", Some(&base));
        assert_eq!(found, Some(fs::canonicalize(base.join("texture").join("DetailMap")).unwrap()));
        assert_eq!(resolve_entry(&livery, "..\\..\\..\\..\\texture\\DetailMap", None), None);
    }

    #[test]
    fn absolute_entry_keeps_its_root() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = tmp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let livery = tmp.path().join("livery");
        fs::create_dir_all(&livery).unwrap();
        let absolute = fs::canonicalize(&shared).unwrap();

        let entry = absolute.to_string_lossy().into_owned();
        assert_eq!(resolve_entry(&livery, &entry, None), Some(absolute.clone()));

        // The same path without its root does exist below `livery` and the base
        // install, yet a missing absolute entry is not retried there.
        let gone = absolute.join("gone");
        let rootless: PathBuf = gone
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        fs::create_dir_all(livery.join(&rootless)).unwrap();
        fs::create_dir_all(tmp.path().join("base").join(&rootless)).unwrap();
        let base = tmp.path().join("base");
        assert_eq!(resolve_entry(&livery, &gone.to_string_lossy(), Some(&base)), None);
    }

    #[test]
    fn cycle_terminates() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        write_cfg(&a, "[fltsim]\nfallback.1=..\\b\n");
        write_cfg(&b, "[fltsim]\nfallback.1=..\\a\n");

        let mut diagnostics = Diagnostics::new();
        let set = collect_fallbacks(&a, None, &mut diagnostics);
        assert_eq!(
            set.directories(),
            &[fs::canonicalize(&a).unwrap(), fs::canonicalize(&b).unwrap()]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn diamond_is_visited_once_breadth_first() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        write_cfg(&root, "[fltsim]\nfallback.1=..\\left\nfallback.2=..\\right\n");
        write_cfg(&tmp.path().join("left"), "[fltsim]\nfallback.1=..\\shared\n");
        write_cfg(&tmp.path().join("right"), "[fltsim]\nfallback.1=../shared\n");
        fs::create_dir_all(tmp.path().join("shared")).unwrap();

        let set = collect_fallbacks(&root, None, &mut Diagnostics::new());
        let names: Vec<_> = set
            .directories()
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["root", "left", "right", "shared"]);
    }

    #[test]
    fn missing_fallback_is_reported_and_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        write_cfg(&root, "[fltsim]\nfallback.1=..\\nowhere\nfallback.2=..\\there\n");
        fs::create_dir_all(tmp.path().join("there")).unwrap();

        let mut diagnostics = Diagnostics::new();
        let set = collect_fallbacks(&root, None, &mut diagnostics);
        assert_eq!(set.len(), 2);
        assert_eq!(
            diagnostics.as_slice(),
            &[Diagnostic::FallbackNotFound {
                directory: fs::canonicalize(&root).unwrap(),
                entry: "..\\nowhere".to_string(),
            }]
        );
    }

    #[test]
    fn missing_root_yields_empty_set() {
        let tmp = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        let set = collect_fallbacks(&tmp.path().join("absent"), None, &mut diagnostics);
        assert!(set.is_empty());
        assert!(matches!(diagnostics.as_slice(), [Diagnostic::TextureDirectoryMissing { .. }]));
    }

    #[test]
    fn find_searches_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        write_cfg(&root, "[fltsim]\nfallback.1=..\\common\n");
        let common = tmp.path().join("common");
        fs::create_dir_all(&common).unwrap();
        fs::write(common.join("decal.png"), b"png").unwrap();
        fs::write(common.join("body.png"), b"png").unwrap();
        fs::write(root.join("body.png"), b"png").unwrap();

        let set = collect_fallbacks(&root, None, &mut Diagnostics::new());
        let root = fs::canonicalize(&root).unwrap();
        let common = fs::canonicalize(&common).unwrap();
        assert_eq!(set.find(Path::new("body.png")), Some(root.join("body.png")));
        assert_eq!(set.find(Path::new("decal.png")), Some(common.join("decal.png")));
        assert_eq!(set.find(Path::new("absent.png")), None);
    }
}
