//! Container writer: serializes a [Package] as an EPUB 3 zip (mimetype, container.xml, OPF and
//! every manifest entry). The archive is built in a temporary file next to the destination and
//! moved into place only when complete.

use super::package::Package;
use super::{xml_escape, PackageError};
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MIMETYPE: &[u8] = b"application/epub+zip";
const OEBPS_PREFIX: &str = "OEBPS/";
const CONTAINER_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n  <rootfiles>\n    <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n  </rootfiles>\n</container>";

/// Write `package` to `path`. Nothing is left at `path` if writing fails.
pub fn write_package(package: &Package, path: &Path) -> Result<(), PackageError> {
    package.check_references()?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".novelbind-")
        .suffix(".epub.part")
        .tempfile_in(dir)
        .map_err(|e| PackageError::CreateFile {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut zip = ZipWriter::new(tmp);
    write_archive(package, &mut zip)?;
    let tmp = zip.finish()?;
    set_output_permissions(tmp.as_file()).map_err(|e| PackageError::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;

    tmp.persist(path).map_err(|e| PackageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Temp files are created owner-only; the finished EPUB gets ordinary file permissions.
#[cfg(unix)]
fn set_output_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_output_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

fn write_archive<W: Write + Seek>(
    package: &Package,
    zip: &mut ZipWriter<W>,
) -> Result<(), PackageError> {
    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    // Mimetype first, uncompressed (required by EPUB OCF)
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML)?;

    zip.start_file(format!("{}content.opf", OEBPS_PREFIX), options_deflate)?;
    zip.write_all(render_opf(package).as_bytes())?;

    for entry in &package.entries {
        zip.start_file(format!("{}{}", OEBPS_PREFIX, entry.filename), options_deflate)?;
        zip.write_all(&entry.content)?;
    }
    Ok(())
}

/// Package document: metadata, manifest of every entry, spine of chapter ids.
pub(crate) fn render_opf(package: &Package) -> String {
    let mut manifest = String::new();
    for entry in &package.entries {
        let properties = entry
            .media_type
            .properties()
            .map(|p| format!(" properties=\"{}\"", p))
            .unwrap_or_default();
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            xml_escape(&entry.id),
            xml_escape(&entry.filename),
            entry.media_type.mime(),
            properties
        ));
    }

    let mut spine = String::new();
    for id in &package.spine {
        spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", xml_escape(id)));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="book-id" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="book-id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{language}</dc:language>
    <dc:creator>{creator}</dc:creator>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
        id = xml_escape(&package.identifier),
        title = xml_escape(&package.metadata.title),
        language = xml_escape(&package.language),
        creator = xml_escape(&package.metadata.author),
        manifest = manifest,
        spine = spine,
    )
}
