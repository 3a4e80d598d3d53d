//! Package assembly. Turns metadata plus ordered chapter records into the full set of EPUB
//! content documents, the spine and the table of contents. Pure: the same input always produces
//! the same entries, ids, file names and ordering.

use super::{html_escape, xml_escape, PackageError};
use crate::model::{ChapterRecord, WorkMetadata};
use std::collections::HashSet;

pub const NAV_ID: &str = "nav";
pub const NCX_ID: &str = "ncx";
pub const STYLE_ID: &str = "style_nav";
const NAV_FILE: &str = "nav.xhtml";
const NCX_FILE: &str = "toc.ncx";
const STYLE_FILE: &str = "style/nav.css";
const STYLESHEET: &str = "BODY { font-family: Arial, sans-serif; }\n";

/// Kind of a manifest item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Chapter content document.
    Html,
    Css,
    Ncx,
    /// EPUB 3 navigation document.
    Nav,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Html | MediaType::Nav => "application/xhtml+xml",
            MediaType::Css => "text/css",
            MediaType::Ncx => "application/x-dtbncx+xml",
        }
    }

    /// Manifest `properties` attribute, if any.
    pub fn properties(self) -> Option<&'static str> {
        match self {
            MediaType::Nav => Some("nav"),
            _ => None,
        }
    }
}

/// One file in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    /// Path relative to the package document.
    pub filename: String,
    pub media_type: MediaType,
    pub content: Vec<u8>,
}

/// One table-of-contents link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocPoint {
    pub id: String,
    pub href: String,
    pub title: String,
}

/// Package-level settings not derived from the scraped content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Unique work identifier (`dc:identifier`).
    pub identifier: String,
    pub language: String,
}

/// A fully assembled package, ready for the container writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub metadata: WorkMetadata,
    pub identifier: String,
    pub language: String,
    /// Manifest, in writing order: nav, ncx, stylesheet, then chapters.
    pub entries: Vec<PackageEntry>,
    /// Chapter entry ids in reading order.
    pub spine: Vec<String>,
    /// Same order as `spine`.
    pub toc: Vec<TocPoint>,
}

/// Entry id for the chapter with this ordinal.
pub fn chapter_id(ordinal: u32) -> String {
    format!("chap_{}", ordinal)
}

/// Entry file name for the chapter with this ordinal.
pub fn chapter_filename(ordinal: u32) -> String {
    format!("{}.xhtml", chapter_id(ordinal))
}

/// Build the package. Records are taken in the order given.
pub fn assemble(metadata: &WorkMetadata, records: &[ChapterRecord], options: &PackageOptions) -> Package {
    let mut chapters = Vec::with_capacity(records.len());
    let mut spine = Vec::with_capacity(records.len());
    let mut toc = Vec::with_capacity(records.len());

    for record in records {
        let id = chapter_id(record.ordinal);
        let filename = chapter_filename(record.ordinal);
        chapters.push(PackageEntry {
            id: id.clone(),
            filename: filename.clone(),
            media_type: MediaType::Html,
            content: render_chapter(record, &options.language).into_bytes(),
        });
        spine.push(id.clone());
        toc.push(TocPoint {
            id,
            href: filename,
            title: record.title.clone(),
        });
    }

    let mut entries = Vec::with_capacity(chapters.len() + 3);
    entries.push(PackageEntry {
        id: NAV_ID.to_string(),
        filename: NAV_FILE.to_string(),
        media_type: MediaType::Nav,
        content: render_nav(&metadata.title, &toc, &options.language).into_bytes(),
    });
    entries.push(PackageEntry {
        id: NCX_ID.to_string(),
        filename: NCX_FILE.to_string(),
        media_type: MediaType::Ncx,
        content: render_ncx(&metadata.title, &options.identifier, &toc).into_bytes(),
    });
    entries.push(PackageEntry {
        id: STYLE_ID.to_string(),
        filename: STYLE_FILE.to_string(),
        media_type: MediaType::Css,
        content: STYLESHEET.as_bytes().to_vec(),
    });
    entries.extend(chapters);

    Package {
        metadata: metadata.clone(),
        identifier: options.identifier.clone(),
        language: options.language.clone(),
        entries,
        spine,
        toc,
    }
}

impl Package {
    /// True when no chapter made it into the package.
    pub fn is_empty(&self) -> bool {
        self.spine.is_empty()
    }

    pub fn chapter_count(&self) -> usize {
        self.spine.len()
    }

    pub fn entry(&self, id: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Verify the manifest, spine and TOC agree: unique ids and file names, every spine and TOC
    /// reference resolves to a chapter entry, every chapter entry is in the spine, and the TOC
    /// follows the spine order.
    pub fn check_references(&self) -> Result<(), PackageError> {
        let dangling = |detail: String| Err(PackageError::DanglingReference { detail });

        let mut ids = HashSet::new();
        let mut filenames = HashSet::new();
        for entry in &self.entries {
            if !ids.insert(entry.id.as_str()) {
                return dangling(format!("duplicate manifest id '{}'", entry.id));
            }
            if !filenames.insert(entry.filename.as_str()) {
                return dangling(format!("duplicate file name '{}'", entry.filename));
            }
        }

        let mut in_spine = HashSet::new();
        for id in &self.spine {
            match self.entry(id) {
                Some(e) if e.media_type == MediaType::Html => {}
                _ => return dangling(format!("spine item '{}' is not a chapter entry", id)),
            }
            if !in_spine.insert(id.as_str()) {
                return dangling(format!("spine lists '{}' twice", id));
            }
        }
        for entry in self.entries.iter().filter(|e| e.media_type == MediaType::Html) {
            if !in_spine.contains(entry.id.as_str()) {
                return dangling(format!("chapter '{}' is missing from the spine", entry.id));
            }
        }

        if self.toc.len() != self.spine.len() {
            return dangling(format!(
                "TOC has {} entries but spine has {}",
                self.toc.len(),
                self.spine.len()
            ));
        }
        for (point, id) in self.toc.iter().zip(&self.spine) {
            if &point.id != id {
                return dangling(format!("TOC entry '{}' out of spine order", point.id));
            }
            match self.entry(&point.id) {
                Some(e) if e.filename == point.href => {}
                _ => return dangling(format!("TOC link '{}' does not match its entry", point.href)),
            }
        }
        Ok(())
    }
}

/// Body paragraphs as `<p>` elements; line breaks inside a paragraph become `<br/>`.
pub(crate) fn render_body(record: &ChapterRecord) -> String {
    record
        .paragraphs()
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| html_escape(l.trim())).collect();
            format!("  <p>{}</p>\n", lines.join("<br/>"))
        })
        .collect()
}

fn render_chapter(record: &ChapterRecord, language: &str) -> String {
    let title = html_escape(&record.title);
    let lang = xml_escape(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{lang}" lang="{lang}">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="{STYLE_FILE}"/>
</head>
<body>
  <h1>{title}</h1>
{body}</body>
</html>
"#,
        lang = lang,
        title = title,
        body = render_body(record),
    )
}

fn render_nav(work_title: &str, toc: &[TocPoint], language: &str) -> String {
    let mut links = String::new();
    for point in toc {
        links.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            xml_escape(&point.href),
            html_escape(&point.title)
        ));
    }
    let lang = xml_escape(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="{STYLE_FILE}"/>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>Contents</h1>
    <ol>
{links}    </ol>
  </nav>
</body>
</html>
"#,
        lang = lang,
        title = html_escape(work_title),
        links = links,
    )
}

fn render_ncx(work_title: &str, identifier: &str, toc: &[TocPoint]) -> String {
    let mut nav_points = String::new();
    for (i, point) in toc.iter().enumerate() {
        nav_points.push_str(&format!(
            r#"    <navPoint id="{id}" playOrder="{order}">
      <navLabel><text>{label}</text></navLabel>
      <content src="{src}"/>
    </navPoint>
"#,
            id = xml_escape(&point.id),
            order = i + 1,
            label = xml_escape(&point.title),
            src = xml_escape(&point.href),
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
{nav_points}  </navMap>
</ncx>
"#,
        uid = xml_escape(identifier),
        title = xml_escape(work_title),
        nav_points = nav_points,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ordinal: u32, title: &str, body: &str) -> ChapterRecord {
        ChapterRecord {
            ordinal,
            title: title.to_string(),
            body: body.to_string(),
            source_url: format!("https://x.com/work/chapter-{}/", ordinal),
        }
    }

    fn metadata() -> WorkMetadata {
        WorkMetadata {
            title: "The Work".to_string(),
            author: "Someone".to_string(),
        }
    }

    fn options() -> PackageOptions {
        PackageOptions {
            identifier: "https://x.com/work/".to_string(),
            language: "en".to_string(),
        }
    }

    fn three() -> Vec<ChapterRecord> {
        vec![
            record(1, "Ch1", "One."),
            record(2, "Ch2", "Two.\n\nMore two."),
            record(3, "Ch3", "Three."),
        ]
    }

    fn content(package: &Package, id: &str) -> String {
        String::from_utf8(package.entry(id).unwrap().content.clone()).unwrap()
    }

    #[test]
    fn chapters_follow_record_order() {
        let package = assemble(&metadata(), &three(), &options());
        assert_eq!(package.spine, vec!["chap_1", "chap_2", "chap_3"]);
        let files: Vec<&str> = package
            .entries
            .iter()
            .filter(|e| e.media_type == MediaType::Html)
            .map(|e| e.filename.as_str())
            .collect();
        assert_eq!(files, vec!["chap_1.xhtml", "chap_2.xhtml", "chap_3.xhtml"]);
        let titles: Vec<&str> = package.toc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Ch1", "Ch2", "Ch3"]);
        assert_eq!(package.chapter_count(), 3);
    }

    #[test]
    fn structural_entries_always_present() {
        let package = assemble(&metadata(), &[], &options());
        assert!(package.is_empty());
        for (id, media) in [
            (NAV_ID, MediaType::Nav),
            (NCX_ID, MediaType::Ncx),
            (STYLE_ID, MediaType::Css),
        ] {
            assert_eq!(package.entry(id).map(|e| e.media_type), Some(media));
        }
        assert!(package.check_references().is_ok());
    }

    #[test]
    fn assembly_is_deterministic() {
        let a = assemble(&metadata(), &three(), &options());
        let b = assemble(&metadata(), &three(), &options());
        assert_eq!(a, b);
    }

    #[test]
    fn references_are_consistent() {
        let package = assemble(&metadata(), &three(), &options());
        assert!(package.check_references().is_ok());
        for point in &package.toc {
            assert_eq!(
                package.entries.iter().filter(|e| e.id == point.id).count(),
                1
            );
        }
    }

    #[test]
    fn check_references_catches_orphans_and_dangling_links() {
        let mut orphan = assemble(&metadata(), &three(), &options());
        orphan.spine.pop();
        orphan.toc.pop();
        assert!(matches!(
            orphan.check_references(),
            Err(PackageError::DanglingReference { .. })
        ));

        let mut dangling = assemble(&metadata(), &three(), &options());
        dangling.toc[1].href = "chap_9.xhtml".to_string();
        assert!(dangling.check_references().is_err());

        let mut reordered = assemble(&metadata(), &three(), &options());
        reordered.toc.swap(0, 1);
        assert!(reordered.check_references().is_err());

        let mut duplicate = assemble(&metadata(), &three(), &options());
        duplicate.spine[2] = "chap_1".to_string();
        duplicate.toc[2] = duplicate.toc[0].clone();
        assert!(duplicate.check_references().is_err());
    }

    #[test]
    fn chapter_document_has_title_and_paragraphs() {
        let package = assemble(&metadata(), &three(), &options());
        let doc = content(&package, "chap_2");
        assert!(doc.contains("<h1>Ch2</h1>"));
        assert!(doc.contains("<p>Two.</p>"));
        assert!(doc.contains("<p>More two.</p>"));
        assert!(doc.contains("href=\"style/nav.css\""));
    }

    #[test]
    fn render_body_escapes_and_keeps_line_breaks() {
        let r = record(1, "A", "Tom & Jerry\n<b>loud</b>\n\nNext");
        assert_eq!(
            render_body(&r),
            "  <p>Tom &amp; Jerry<br/>&lt;b&gt;loud&lt;/b&gt;</p>\n  <p>Next</p>\n"
        );
    }

    #[test]
    fn nav_and_ncx_link_every_chapter_in_order() {
        let package = assemble(&metadata(), &three(), &options());
        let nav = content(&package, NAV_ID);
        let first = nav.find("chap_1.xhtml").unwrap();
        let third = nav.find("chap_3.xhtml").unwrap();
        assert!(first < third);
        let ncx = content(&package, NCX_ID);
        assert!(ncx.contains(r#"<navPoint id="chap_2" playOrder="2">"#));
        assert!(ncx.contains(r#"<meta name="dtb:uid" content="https://x.com/work/"/>"#));
    }
}
