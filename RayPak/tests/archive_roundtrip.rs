//! Save/load behaviour shared by every archive dialect

use std::io::Cursor;

use pretty_assertions::assert_eq;
use raypak::archive::cnt::CntHeader;
use raypak::archive::{ArchiveFileGenerator, IpkFileEntry};
use raypak::prelude::*;

fn ubiart() -> ArchiveSettings {
    ArchiveSettings::ubiart(Platform::Pc).with_compressed_extensions(["png", "dds", "ckd"])
}

fn build_ipk(settings: &ArchiveSettings, files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut archive = IpkArchive::new(settings, 5);
    let mut imports = ImportList::new();
    for (path, data) in files {
        imports.insert(*path, data.clone());
    }
    let mut output = Cursor::new(Vec::new());
    archive
        .save(&mut Cursor::new(Vec::new()), &mut output, &imports)
        .unwrap();
    output.into_inner()
}

fn repack(archive: &mut Archive, input: Vec<u8>, imports: &ImportList) -> Vec<u8> {
    let mut output = Cursor::new(Vec::new());
    archive.save(&mut Cursor::new(input), &mut output, imports).unwrap();
    output.into_inner()
}

fn assert_no_overlap(archive: &Archive) {
    let mut ranges: Vec<(u64, u64)> = archive
        .entries()
        .iter()
        .map(|e| (e.offset, e.offset + e.stored_size))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
}

fn texture_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 7) as u8).collect()
}

#[test]
fn test_untouched_members_survive_repack() {
    let settings = ubiart();
    let bytes = build_ipk(
        &settings,
        &[
            ("root.txt", b"0123456789".to_vec()),
            ("world/a.png", texture_bytes(300)),
            ("world/b.dds", texture_bytes(500)),
            ("world/c.isc", b"<scene/>".to_vec()),
        ],
    );
    let mut archive = Archive::load(&mut Cursor::new(&bytes), &settings).unwrap();
    let before = archive.entries();

    let mut imports = ImportList::new();
    imports.insert("world/a.png", texture_bytes(1000));
    let saved = repack(&mut archive, bytes.clone(), &imports);

    let reloaded = Archive::load(&mut Cursor::new(&saved), &settings).unwrap();
    for old in before.iter().filter(|e| e.path != "world/a.png") {
        let new = reloaded.entry(&old.path).unwrap();
        assert_eq!(
            (new.stored_size, new.size, new.is_compressed),
            (old.stored_size, old.size, old.is_compressed)
        );
        assert_eq!(
            reloaded.read_file(&mut Cursor::new(&saved), &old.path).unwrap(),
            archive_member(&bytes, &settings, &old.path)
        );
    }
    assert_eq!(
        reloaded.read_file(&mut Cursor::new(&saved), "world/a.png").unwrap(),
        texture_bytes(1000)
    );
    assert_no_overlap(&reloaded);
}

fn archive_member(bytes: &[u8], settings: &ArchiveSettings, path: &str) -> Vec<u8> {
    let archive = Archive::load(&mut Cursor::new(bytes), settings).unwrap();
    archive.read_file(&mut Cursor::new(bytes), path).unwrap()
}

#[test]
fn test_offsets_never_overlap_after_edits() {
    let settings = ubiart();
    let files: Vec<(String, Vec<u8>)> = (0..12)
        .map(|i| (format!("dir{}/file{i}.png", i % 3), texture_bytes(64 + i * 37)))
        .collect();
    let refs: Vec<(&str, Vec<u8>)> = files.iter().map(|(p, d)| (p.as_str(), d.clone())).collect();
    let bytes = build_ipk(&settings, &refs);

    let mut archive = Archive::load(&mut Cursor::new(&bytes), &settings).unwrap();
    let mut imports = ImportList::new();
    imports.insert("dir1/file4.png", texture_bytes(4000));
    imports.insert("new/file.txt", b"added".to_vec());
    imports.remove("dir2/file5.png");
    let saved = repack(&mut archive, bytes, &imports);

    assert_eq!(archive.len(), 12);
    assert!(archive.entry("dir2/file5.png").is_none());
    assert_no_overlap(&archive);

    let reloaded = Archive::load(&mut Cursor::new(&saved), &settings).unwrap();
    assert_eq!(reloaded.entries(), archive.entries());
    assert_no_overlap(&reloaded);
}

#[test]
fn test_three_entry_scenario() {
    let settings = ubiart();
    let bytes = build_ipk(
        &settings,
        &[
            ("root.txt", b"0123456789".to_vec()),
            ("dir/a.png", texture_bytes(256)),
            ("dir/b.dds", texture_bytes(512)),
        ],
    );
    let mut archive = Archive::load(&mut Cursor::new(&bytes), &settings).unwrap();

    let root = archive.entry("root.txt").unwrap();
    assert!(!root.is_compressed);
    assert_eq!(root.size, 10);
    assert!(archive.entry("dir/a.png").unwrap().is_compressed);
    assert!(archive.entry("dir/b.dds").unwrap().is_compressed);

    let dirs = archive.directories();
    assert_eq!(dirs.len(), 2);
    assert_eq!((dirs[0].path.as_str(), dirs[0].entries.len()), ("", 1));
    assert_eq!((dirs[1].path.as_str(), dirs[1].entries.len()), ("dir", 2));

    let before = archive.entries();
    let saved = repack(&mut archive, bytes.clone(), &ImportList::new());
    assert_eq!(saved.len(), bytes.len());

    let reloaded = Archive::load(&mut Cursor::new(&saved), &settings).unwrap();
    assert_eq!(reloaded.entries(), before);
}

#[test]
fn test_allow_list_controls_compression() {
    let settings = ArchiveSettings::ubiart(Platform::Pc).with_compressed_extensions(["ckd"]);
    let archive = IpkArchive::new(&settings, 5);

    let mut plain = archive.get_file_entry("sound/jump.wav");
    assert_eq!(plain.compressed_size, 0);
    let data = texture_bytes(2048);
    assert_eq!(archive.encode_file(&data, &mut plain).unwrap(), data);
    assert_eq!(plain.compressed_size, 0);
    assert!(!plain.is_compressed());

    let mut cooked = archive.get_file_entry("world/logo.tga.ckd");
    let stored = archive.encode_file(&data, &mut cooked).unwrap();
    assert!(cooked.is_compressed());
    assert_eq!(stored.len() as u32, cooked.compressed_size);
}

#[test]
fn test_generator_produces_each_entry_once() {
    let archive = IpkArchive::new(&ubiart(), 5);
    let mut entry = archive.get_file_entry("a.txt");

    let mut generator = ArchiveFileGenerator::new();
    generator
        .add("a.txt", Box::new(|_: &mut IpkFileEntry| Ok(b"abc".to_vec())))
        .unwrap();
    assert_eq!(
        generator.assign_offset(&"a.txt", 64).unwrap().produce(&mut entry).unwrap(),
        b"abc"
    );
    assert_eq!(entry.offset(), 64);
    assert!(matches!(
        generator.assign_offset(&"a.txt", 67),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_cnt_round_trip() {
    let settings = ArchiveSettings::openspace();
    let header = CntHeader {
        xor_used: true,
        checksum_used: false,
        xor_key: 0x33,
        version_id: 1,
    };
    let mut archive = CntArchive::new(&settings, header);
    let mut imports = ImportList::new();
    imports.insert("Textures\\Menu\\logo.gf", texture_bytes(90));
    imports.insert("readme.txt", b"root member".to_vec());
    let mut output = Cursor::new(Vec::new());
    archive
        .save(&mut Cursor::new(Vec::new()), &mut output, &imports)
        .unwrap();
    let bytes = output.into_inner();

    let mut loaded = Archive::load(&mut Cursor::new(&bytes), &settings).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.read_file(&mut Cursor::new(&bytes), "Textures\\Menu\\logo.gf").unwrap(),
        texture_bytes(90)
    );
    let dirs: Vec<_> = loaded.directories().into_iter().map(|d| d.path).collect();
    assert_eq!(dirs, ["", "Textures/Menu"]);

    let before = loaded.entries();
    let saved = repack(&mut loaded, bytes, &ImportList::new());
    let reloaded = Archive::load(&mut Cursor::new(&saved), &settings).unwrap();
    assert_eq!(reloaded.entries(), before);
}

#[test]
fn test_malformed_container_aborts_load() {
    let settings = ubiart();
    let mut bytes = build_ipk(&settings, &[("a.txt", b"abc".to_vec())]);
    bytes[0] ^= 0xFF;
    assert!(matches!(
        Archive::load(&mut Cursor::new(&bytes), &settings),
        Err(Error::MalformedHeader { .. })
    ));

    let bytes = build_ipk(&settings, &[("a.txt", texture_bytes(100))]);
    let truncated = &bytes[..bytes.len() - 10];
    assert!(matches!(
        Archive::load(&mut Cursor::new(truncated), &settings),
        Err(Error::TruncatedStream { .. })
    ));
}
