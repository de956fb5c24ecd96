//! CLI command for rebuilding an archive

use std::path::Path;
use std::time::Instant;

use crate::cli::ArchiveArgs;
use crate::config::ArchiveFormat;
use crate::cli::progress::{DISK, LOOKING_GLASS, PICTURE, print_done, print_step};
use crate::explorer::ArchiveSession;
use crate::utils::{FileExtension, collect_files};

/// Split `ARCHIVE_PATH=FILE`
fn parse_import(spec: &str) -> anyhow::Result<(&str, &Path)> {
    let (member, file) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid import '{spec}', expected ARCHIVE_PATH=FILE"))?;
    Ok((member, Path::new(file)))
}

pub fn execute(
    archive: &ArchiveArgs,
    imports: &[String],
    from_dir: Option<&Path>,
    remove: &[String],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let settings = archive.settings()?;

    print_step(1, 3, &LOOKING_GLASS, "Reading archive header...");
    let mut session = ArchiveSession::open(&archive.source, &settings)?;

    print_step(2, 3, &PICTURE, "Converting imports...");
    for spec in imports {
        let (member, file) = parse_import(spec)?;
        let ext = FileExtension::from_path(&file.to_string_lossy())
            .ok_or_else(|| anyhow::anyhow!("Cannot detect format of {}", file.display()))?;
        session.import_file(member, &ext, std::fs::read(file)?)?;
        println!("  {member} <- {}", file.display());
    }
    if let Some(dir) = from_dir {
        for (relative, file) in collect_files(dir)? {
            let member = match settings.format {
                ArchiveFormat::Ipk => relative,
                ArchiveFormat::Cnt => relative.replace('/', "\\"),
            };
            let Some(ext) = FileExtension::from_path(&member) else {
                tracing::warn!("Skipping {}: no extension", file.display());
                continue;
            };
            session.import_file(&member, &ext, std::fs::read(&file)?)?;
            println!("  {member} <- {}", file.display());
        }
    }
    for member in remove {
        session.remove_file(member);
        println!("  {member} removed");
    }

    let target = output.unwrap_or(&archive.source);
    print_step(3, 3, &DISK, &format!("Writing {}...", target.display()));
    session.repack(target)?;

    println!("{} files", session.archive().len());
    print_done(start.elapsed());
    Ok(())
}
