//! Recursive zip traversal shared by the parsers that expect one file per
//! logical unit (TransXChange's one-XML-per-service convention; ATCO-CIF
//! bundles of several `.cif` files) rather than a single flat archive like
//! GTFS. Handles archives nested inside archives, and skips the junk macOS
//! adds when it zips a folder.

use std::io::{Cursor, Read, Seek};

use crate::error::Result;

fn is_macos_junk(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    name.starts_with("__MACOSX/") || name.contains("/__MACOSX/") || base.starts_with("._")
}

/// Collects every entry whose name satisfies `filter`, recursing into any
/// entry that is itself a zip archive.
pub fn collect_files<R: Read + Seek>(
    reader: R,
    filter: impl Fn(&str) -> bool,
) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut out = Vec::new();
    collect_from_archive(&mut archive, &filter, &mut out)?;
    Ok(out)
}

fn collect_from_archive<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    filter: &impl Fn(&str) -> bool,
    out: &mut Vec<(String, Vec<u8>)>,
) -> Result<()> {
    for index in 0..archive.len() {
        let (name, bytes) = {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() || is_macos_junk(entry.name()) {
                continue;
            }
            let name = entry.name().to_owned();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            (name, bytes)
        };

        if name.to_ascii_lowercase().ends_with(".zip") {
            if let Ok(mut nested) = zip::ZipArchive::new(Cursor::new(bytes)) {
                collect_from_archive(&mut nested, filter, out)?;
            }
            continue;
        }

        if filter(&name) {
            out.push((name, bytes));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;

    use super::*;

    fn build_archive(files: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::default();
            for (name, contents) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        Cursor::new(buf)
    }

    #[test]
    fn skips_macos_metadata_entries() {
        let archive = build_archive(&[
            ("route1.xml", b"<a/>"),
            ("__MACOSX/._route1.xml", b"junk"),
            ("._route1.xml", b"junk"),
        ]);
        let files = collect_files(archive, |name| name.ends_with(".xml")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "route1.xml");
    }

    #[test]
    fn recurses_into_nested_zips() {
        let inner = build_archive(&[("route1.xml", b"<a/>")]);
        let outer = build_archive(&[("nested.zip", inner.get_ref())]);
        let files = collect_files(outer, |name| name.ends_with(".xml")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "route1.xml");
    }
}
