use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use zip::write::SimpleFileOptions;

use crate::assemble::{Book, ClassifiedChapter, SpineItem};

#[derive(Debug, Clone)]
pub struct CreateEpubOptions {
    pub force: bool,
    /// BCP-47 language tag used for EPUB metadata and XHTML documents.
    pub lang: String,
}

impl Default for CreateEpubOptions {
    fn default() -> Self {
        Self {
            force: false,
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl CoverImage {
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            "image/webp" => "webp",
            "image/avif" => "avif",
            _ => "jpg",
        }
    }
}

/// `Title: Part 1.epub` -> `Title_Part_1.epub`.
pub fn output_file_name(title: &str) -> String {
    format!("{title}.epub")
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect::<String>()
        .replace(' ', "_")
}

/// Writes the whole container to a sibling `.part` file and renames it into
/// place, so a failed write never leaves a truncated EPUB at `out_path`.
///
/// Without `force` the final path is claimed with `create_new` before writing;
/// a file that appears there in the meantime is never replaced.
pub fn write_epub(
    book: &Book,
    cover: Option<&CoverImage>,
    out_path: &Path,
    options: &CreateEpubOptions,
) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create epub parent dir: {}", parent.display()))?;
    }

    let claimed = !options.force;
    if claimed {
        match OpenOptions::new().write(true).create_new(true).open(out_path) {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                anyhow::bail!("epub output already exists: {}", out_path.display());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("open epub output: {}", out_path.display()));
            }
        }
    }

    let part_path = part_path(out_path);
    let result = write_zip(book, cover, &part_path, options).and_then(|()| {
        fs::rename(&part_path, out_path)
            .with_context(|| format!("move epub into place: {}", out_path.display()))
    });
    if let Err(err) = result {
        let _ = fs::remove_file(&part_path);
        if claimed {
            let _ = fs::remove_file(out_path);
        }
        return Err(err);
    }
    Ok(())
}

fn part_path(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    out_path.with_file_name(name)
}

fn write_zip(
    book: &Book,
    cover: Option<&CoverImage>,
    path: &Path,
    options: &CreateEpubOptions,
) -> anyhow::Result<()> {
    let title = book.work.title.as_str();
    let lang = options.lang.trim();
    let lang = if lang.is_empty() { "und" } else { lang };

    let uuid = uuid::Uuid::new_v4();
    let modified = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let container_xml = render_container_xml();
    let css = default_style_css();
    let nav_xhtml = render_nav_xhtml(book, lang);
    let toc_ncx = render_toc_ncx(book, uuid);
    let content_opf = render_content_opf(book, lang, uuid, &modified, cover);

    let out_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("open epub output: {}", path.display()))?;

    let mut zip = zip::ZipWriter::new(out_file);

    // `mimetype` must be the first entry and stored uncompressed.
    let mimetype_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    zip.start_file("mimetype", mimetype_options)
        .context("epub start_file mimetype")?;
    zip.write_all(b"application/epub+zip")
        .context("epub write mimetype")?;

    let deflated_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let fixed_entries = [
        ("META-INF/container.xml", container_xml.as_str()),
        ("OEBPS/content.opf", content_opf.as_str()),
        ("OEBPS/nav.xhtml", nav_xhtml.as_str()),
        ("OEBPS/toc.ncx", toc_ncx.as_str()),
        ("OEBPS/style.css", css),
    ];
    for (name, contents) in fixed_entries {
        zip.start_file(name, deflated_options)
            .with_context(|| format!("epub start_file {name}"))?;
        zip.write_all(contents.as_bytes())
            .with_context(|| format!("epub write {name}"))?;
    }

    if let Some(cover) = cover {
        let name = format!("OEBPS/cover.{}", cover.extension());
        zip.start_file(name.as_str(), deflated_options)
            .with_context(|| format!("epub start_file {name}"))?;
        zip.write_all(&cover.bytes)
            .with_context(|| format!("epub write {name}"))?;

        let cover_xhtml = render_cover_xhtml(cover, title, lang);
        zip.start_file("OEBPS/cover.xhtml", deflated_options)
            .context("epub start_file OEBPS/cover.xhtml")?;
        zip.write_all(cover_xhtml.as_bytes())
            .context("epub write OEBPS/cover.xhtml")?;
    }

    for chapter in book.chapters() {
        let xhtml = render_chapter_xhtml(chapter, title, lang);
        let name = format!("OEBPS/{}", chapter.file_name());
        zip.start_file(name.as_str(), deflated_options)
            .with_context(|| format!("epub start_file chapter: {name}"))?;
        zip.write_all(xhtml.as_bytes())
            .with_context(|| format!("epub write chapter: {name}"))?;
    }

    zip.finish().context("epub finish zip")?;
    Ok(())
}

fn render_container_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#
    .to_string()
}

fn default_style_css() -> &'static str {
    r#"@charset "utf-8";

html { font-family: serif; }
body { margin: 0; padding: 0 1.2em; line-height: 1.6; }
h1 { font-size: 1.4em; margin: 1.5em 0 1em; }
p { margin: 0 0 0.8em; text-indent: 1em; }
nav ol { list-style: none; padding-left: 1em; }
div.cover { text-align: center; }
div.cover img { max-width: 100%; max-height: 100%; }
"#
}

fn render_nav_xhtml(book: &Book, lang: &str) -> String {
    let title = xml_escape(&book.work.title);
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{}\" xml:lang=\"{}\">\n",
        xml_escape(lang),
        xml_escape(lang)
    ));
    out.push_str("<head>\n");
    out.push_str(&format!("  <title>{title}</title>\n"));
    out.push_str("  <meta charset=\"utf-8\" />\n");
    out.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\" />\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out.push_str(&format!("  <h1>{title}</h1>\n"));
    out.push_str("  <nav epub:type=\"toc\" id=\"toc\">\n");
    out.push_str("    <ol>\n");
    for section in &book.toc {
        out.push_str(&format!(
            "      <li><span>{}</span>\n",
            xml_escape(&section.label)
        ));
        out.push_str("        <ol>\n");
        for ch in &section.chapters {
            out.push_str(&format!(
                "          <li><a href=\"{}\">{}</a></li>\n",
                xml_escape(&ch.file_name()),
                xml_escape(&ch.heading())
            ));
        }
        out.push_str("        </ol>\n");
        out.push_str("      </li>\n");
    }
    out.push_str("    </ol>\n");
    out.push_str("  </nav>\n");
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn render_toc_ncx(book: &Book, uuid: uuid::Uuid) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(
        "<!DOCTYPE ncx PUBLIC \"-//NISO//DTD ncx 2005-1//EN\" \"http://www.daisy.org/z3986/2005/ncx-2005-1.dtd\">\n",
    );
    out.push_str("<ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\" version=\"2005-1\">\n");
    out.push_str("  <head>\n");
    out.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"urn:uuid:{uuid}\" />\n"
    ));
    out.push_str("    <meta name=\"dtb:depth\" content=\"2\" />\n");
    out.push_str("    <meta name=\"dtb:totalPageCount\" content=\"0\" />\n");
    out.push_str("    <meta name=\"dtb:maxPageNumber\" content=\"0\" />\n");
    out.push_str("  </head>\n");
    out.push_str("  <docTitle><text>");
    out.push_str(&xml_escape(&book.work.title));
    out.push_str("</text></docTitle>\n");
    out.push_str("  <navMap>\n");

    let mut play = 0_usize;
    for (section_idx, section) in book.toc.iter().enumerate() {
        let Some(first) = section.chapters.first() else {
            continue;
        };
        play += 1;
        out.push_str(&format!(
            "    <navPoint id=\"section-{}\" playOrder=\"{play}\">\n",
            section_idx + 1
        ));
        out.push_str("      <navLabel><text>");
        out.push_str(&xml_escape(&section.label));
        out.push_str("</text></navLabel>\n");
        out.push_str(&format!(
            "      <content src=\"{}\" />\n",
            xml_escape(&first.file_name())
        ));
        for ch in &section.chapters {
            play += 1;
            out.push_str(&format!(
                "      <navPoint id=\"chapter-{}\" playOrder=\"{play}\">\n",
                ch.index
            ));
            out.push_str("        <navLabel><text>");
            out.push_str(&xml_escape(&ch.heading()));
            out.push_str("</text></navLabel>\n");
            out.push_str(&format!(
                "        <content src=\"{}\" />\n",
                xml_escape(&ch.file_name())
            ));
            out.push_str("      </navPoint>\n");
        }
        out.push_str("    </navPoint>\n");
    }
    out.push_str("  </navMap>\n");
    out.push_str("</ncx>\n");
    out
}

fn render_content_opf(
    book: &Book,
    lang: &str,
    uuid: uuid::Uuid,
    modified: &str,
    cover: Option<&CoverImage>,
) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!(
        "<package xmlns=\"http://www.idpf.org/2007/opf\" unique-identifier=\"bookid\" version=\"3.0\" xml:lang=\"{}\">\n",
        xml_escape(lang)
    ));
    out.push_str("  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");
    out.push_str(&format!(
        "    <dc:identifier id=\"bookid\">urn:uuid:{uuid}</dc:identifier>\n"
    ));
    out.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        xml_escape(&book.work.title)
    ));
    out.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        xml_escape(lang)
    ));
    out.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        xml_escape(modified)
    ));
    if cover.is_some() {
        out.push_str("    <meta name=\"cover\" content=\"cover-image\" />\n");
    }
    out.push_str("  </metadata>\n");
    out.push_str("  <manifest>\n");
    out.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\" />\n",
    );
    out.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\" />\n",
    );
    out.push_str("    <item id=\"css\" href=\"style.css\" media-type=\"text/css\" />\n");
    if let Some(cover) = cover {
        out.push_str(&format!(
            "    <item id=\"cover-image\" href=\"cover.{}\" media-type=\"{}\" properties=\"cover-image\" />\n",
            cover.extension(),
            xml_escape(&cover.media_type)
        ));
        out.push_str(
            "    <item id=\"cover\" href=\"cover.xhtml\" media-type=\"application/xhtml+xml\" />\n",
        );
    }
    for ch in book.chapters() {
        out.push_str(&format!(
            "    <item id=\"chap_{}\" href=\"{}\" media-type=\"application/xhtml+xml\" />\n",
            ch.index,
            xml_escape(&ch.file_name())
        ));
    }
    out.push_str("  </manifest>\n");

    out.push_str("  <spine toc=\"ncx\">\n");
    if cover.is_some() {
        out.push_str("    <itemref idref=\"cover\" linear=\"no\" />\n");
    }
    for item in &book.spine {
        let idref = match item {
            SpineItem::Nav => "nav".to_owned(),
            SpineItem::Chapter(index) => format!("chap_{index}"),
        };
        out.push_str(&format!("    <itemref idref=\"{idref}\" />\n"));
    }
    out.push_str("  </spine>\n");
    out.push_str("</package>\n");
    out
}

fn render_cover_xhtml(cover: &CoverImage, book_title: &str, lang: &str) -> String {
    let body = format!(
        "<div class=\"cover\"><img src=\"cover.{}\" alt=\"{}\" /></div>\n",
        cover.extension(),
        xml_escape(book_title)
    );
    wrap_xhtml_document(book_title, lang, &body)
}

fn render_chapter_xhtml(chapter: &ClassifiedChapter, book_title: &str, lang: &str) -> String {
    let heading = chapter.heading();
    let mut body = format!("<h1>{}</h1>\n", xml_escape(&heading));
    for line in chapter.chapter.content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        body.push_str(&format!("<p>{}</p>\n", xml_escape(line)));
    }

    let doc_title = if heading.trim().is_empty() {
        book_title
    } else {
        heading.as_str()
    };
    wrap_xhtml_document(doc_title, lang, &body)
}

pub fn media_type_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "image/jpeg",
    }
}

fn wrap_xhtml_document(title: &str, lang: &str, body_html: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"{}\" xml:lang=\"{}\">\n",
        xml_escape(lang),
        xml_escape(lang)
    ));
    out.push_str("<head>\n");
    out.push_str(&format!("  <title>{}</title>\n", xml_escape(title)));
    out.push_str("  <meta charset=\"utf-8\" />\n");
    out.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\" />\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out.push_str(body_html);
    if !body_html.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
