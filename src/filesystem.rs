use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::report::ExtractObserver;

// Reference lists name image symbols without paths or extensions; games were
// shipped for case-insensitive filesystems, so the on-disk casing of both
// stem and extension is unreliable. A symbol resolves to a WIP file when one
// exists and falls back to the standalone mask otherwise.

/// Resolve each symbol against the directory listings of the search paths.
///
/// Search paths are consulted in order and the first directory holding a
/// match wins, so earlier paths override later ones; each symbol resolves
/// to at most one file, preferring `.WIP` over `.MSK`. More than one
/// candidate in a single directory is reported through the observer and the
/// first (sorted) one is taken.
pub fn find_files(
    search_paths: &[PathBuf],
    symbols: &[String],
    observer: &dyn ExtractObserver,
) -> io::Result<Vec<(String, PathBuf)>> {
    let mut listings = Vec::with_capacity(search_paths.len());
    for search_path in search_paths {
        listings.push((search_path.as_path(), list_file_names(search_path)?));
    }

    let mut found = Vec::new();
    for symbol in symbols {
        for (prefix, names) in &listings {
            let matched = match_symbol(names, symbol, "wip", observer)
                .or_else(|| match_symbol(names, symbol, "msk", observer));
            if let Some(name) = matched {
                found.push((symbol.clone(), prefix.join(name)));
                break;
            }
        }
    }

    Ok(found)
}

fn list_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

fn match_symbol<'a>(
    names: &'a [String],
    symbol: &str,
    extension: &str,
    observer: &dyn ExtractObserver,
) -> Option<&'a str> {
    let mut candidates = names.iter().filter(|name| {
        name.rsplit_once('.').is_some_and(|(stem, ext)| {
            stem.eq_ignore_ascii_case(symbol) && ext.eq_ignore_ascii_case(extension)
        })
    });

    let first = candidates.next()?;
    if candidates.next().is_some() {
        observer.warning(&format!(
            "case-insensitive match found more than one file for {}; selecting {}",
            symbol, first
        ));
    }
    Some(first.as_str())
}
