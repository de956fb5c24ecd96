//! CLI command for member file types and texture info

use indexmap::IndexMap;
use serde::Serialize;

use crate::cli::ArchiveArgs;
use crate::explorer::{ArchiveSession, CancellationToken};

#[derive(Serialize)]
struct MemberInfo {
    path: String,
    file_type: &'static str,
    info: IndexMap<String, String>,
}

pub fn execute(archive: &ArchiveArgs, file: Option<&str>, json: bool) -> anyhow::Result<()> {
    let settings = archive.settings()?;
    let mut session = ArchiveSession::open(&archive.source, &settings)?;

    let mut members = Vec::new();
    let summary = session.load_thumbnails(&CancellationToken::new(), |item, thumb| {
        if file.is_some_and(|f| f != item.entry.path) {
            return;
        }
        members.push(MemberInfo {
            path: item.entry.path.clone(),
            file_type: item.file_type.name(),
            info: thumb.info.iter().cloned().collect(),
        });
    })?;

    if let Some(path) = file
        && members.is_empty()
    {
        anyhow::bail!("File not found in archive: {path}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }

    for member in &members {
        println!("{} [{}]", member.path, member.file_type);
        for (key, value) in &member.info {
            println!("    {key}: {value}");
        }
    }
    if file.is_none() {
        println!(
            "\n{} readable, {} failed to decode",
            summary.loaded, summary.failed
        );
    }
    Ok(())
}
