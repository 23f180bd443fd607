use serde::{Deserialize, Serialize};

use crate::listing::ChapterStatus;

/// One line of `list` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub index: usize,
    pub link: String,
    pub title: String,
    pub status: ChapterStatus,
}

/// Chapter record returned by the content API (a WordPress REST post).
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub title: Rendered,
    pub slug: String,
    pub content: Rendered,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}

/// YAML dump of an assembled book, written by `build --toc-out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocDump {
    pub book_title: String,
    pub work_id: String,
    pub sections: Vec<TocDumpSection>,
    pub spine: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocDumpSection {
    pub label: String,
    pub chapters: Vec<TocDumpChapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocDumpChapter {
    pub file: String,
    pub heading: String,
    pub link: String,
}
