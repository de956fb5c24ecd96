//! CLI command for listing archive contents

use serde::Serialize;

use crate::cli::ArchiveArgs;
use crate::cli::progress::format_size;
use crate::explorer::ArchiveSession;

/// Simple glob pattern matching (supports * and ?)
pub(crate) fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_recursive(&pattern_chars, &text_chars, 0, 0)
}

fn matches_glob_recursive(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() && ti == text.len() {
        return true;
    }
    if pi == pattern.len() {
        return false;
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| matches_glob_recursive(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && matches_glob_recursive(pattern, text, pi + 1, ti + 1),
        c => {
            ti < text.len()
                && text[ti].eq_ignore_ascii_case(&c)
                && matches_glob_recursive(pattern, text, pi + 1, ti + 1)
        }
    }
}

#[derive(Serialize)]
struct ListedFile<'a> {
    path: &'a str,
    directory: &'a str,
    offset: u64,
    size: u64,
    stored_size: u64,
    compressed: bool,
    file_type: &'a str,
}

pub fn execute(archive: &ArchiveArgs, json: bool, filter: Option<&str>) -> anyhow::Result<()> {
    let settings = archive.settings()?;
    let session = ArchiveSession::open(&archive.source, &settings)?;
    let folders = session.list();

    let mut listed = Vec::new();
    for folder in &folders {
        for item in &folder.items {
            if filter.is_some_and(|pattern| !matches_glob(pattern, &item.entry.path.replace('\\', "/"))) {
                continue;
            }
            listed.push(ListedFile {
                path: &item.entry.path,
                directory: &folder.path,
                offset: item.entry.offset,
                size: item.entry.size,
                stored_size: item.entry.stored_size,
                compressed: item.entry.is_compressed,
                file_type: item.file_type.name(),
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    for file in &listed {
        let marker = if file.compressed { "z" } else { " " };
        println!(
            "{:>8} {marker} {:<16} {}",
            format_size(file.size),
            file.file_type,
            file.path
        );
    }
    println!(
        "\n{} of {} files ({} archive)",
        listed.len(),
        session.archive().len(),
        settings.format.as_str()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_glob() {
        assert!(matches_glob("*.gf", "textures/a.GF"));
        assert!(matches_glob("tex?ures/*", "textures/a.gf"));
        assert!(!matches_glob("*.png", "textures/a.gf"));
    }
}
