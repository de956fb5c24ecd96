//! CLI command for archive extraction

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use crate::cli::ArchiveArgs;
use crate::cli::progress::{LOOKING_GLASS, PACKAGE, print_done, print_step, simple_bar};
use crate::explorer::ArchiveSession;
use crate::utils::{FileExtension, split_path};

pub fn execute(
    archive: &ArchiveArgs,
    destination: &Path,
    file: Option<&str>,
    as_format: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let settings = archive.settings()?;

    if !quiet {
        print_step(1, 2, &LOOKING_GLASS, "Reading archive header...");
    }
    let mut session = ArchiveSession::open(&archive.source, &settings)?;

    std::fs::create_dir_all(destination)?;

    if let Some(path) = file {
        let (_, name) = split_path(path);
        let (target, out_ext) = match as_format {
            Some(fmt) => {
                let ext = FileExtension::new(fmt);
                let stem = name.split('.').next().unwrap_or(name);
                (destination.join(format!("{stem}.{}", ext.full())), ext)
            }
            None => (
                destination.join(name),
                FileExtension::from_path(path).unwrap_or_else(|| FileExtension::new("")),
            ),
        };

        if !quiet {
            print_step(2, 2, &PACKAGE, &format!("Exporting {path}..."));
        }
        let mut writer = BufWriter::new(File::create(&target)?);
        session.export(path, &out_ext, &mut writer)?;
        if !quiet {
            println!("Wrote {}", target.display());
            print_done(start.elapsed());
        }
        return Ok(());
    }

    if !quiet {
        print_step(2, 2, &PACKAGE, "Extracting files...");
    }
    let pb = (!quiet).then(|| simple_bar(session.archive().len() as u64, "Extracting"));
    let written = session.extract_all(destination, &|progress| {
        if let Some(pb) = &pb {
            pb.set_position(progress.current as u64);
            pb.set_message(progress.current_file.clone());
        }
    })?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if !quiet {
        println!("Extracted {written} files to {}", destination.display());
        print_done(start.elapsed());
    }
    Ok(())
}
