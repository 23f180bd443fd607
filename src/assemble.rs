//! Grouping of classified chapters into volumes, table of contents and spine.

use std::collections::BTreeMap;

use crate::classify::{Classification, VolumeKey, classify};
use crate::formats::{TocDump, TocDumpChapter, TocDumpSection};
use crate::listing::Chapter;
use crate::work::Work;

/// A content-filled chapter together with its one-time classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedChapter {
    /// Position in the listing; names the chapter document.
    pub index: usize,
    pub chapter: Chapter,
    pub classification: Classification,
}

impl ClassifiedChapter {
    /// Classifies on the chapter's current (authoritative) title.
    pub fn new(index: usize, chapter: Chapter) -> Self {
        let classification = classify(&chapter.title);
        Self {
            index,
            chapter,
            classification,
        }
    }

    pub fn file_name(&self) -> String {
        format!("chap_{}.xhtml", self.index)
    }

    pub fn heading(&self) -> String {
        self.classification.heading()
    }
}

/// Volume key to chapters in arrival order.
pub type VolumeGroups = BTreeMap<VolumeKey, Vec<ClassifiedChapter>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSection {
    pub key: VolumeKey,
    pub label: String,
    pub chapters: Vec<ClassifiedChapter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpineItem {
    Nav,
    /// Listing index of a chapter document.
    Chapter(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub work: Work,
    pub toc: Vec<TocSection>,
    pub spine: Vec<SpineItem>,
}

impl Book {
    /// Chapters in reading order.
    pub fn chapters(&self) -> impl Iterator<Item = &ClassifiedChapter> {
        self.toc.iter().flat_map(|section| section.chapters.iter())
    }

    pub fn chapter_count(&self) -> usize {
        self.toc.iter().map(|section| section.chapters.len()).sum()
    }
}

pub fn group(chapters: impl IntoIterator<Item = ClassifiedChapter>) -> VolumeGroups {
    chapters
        .into_iter()
        .fold(VolumeGroups::new(), |mut groups, chapter| {
            groups
                .entry(chapter.classification.volume_key())
                .or_default()
                .push(chapter);
            groups
        })
}

pub fn assemble(work: Work, chapters: impl IntoIterator<Item = ClassifiedChapter>) -> Book {
    let toc = group(chapters)
        .into_iter()
        .map(|(key, chapters)| TocSection {
            key,
            label: key.to_string(),
            chapters,
        })
        .collect::<Vec<_>>();

    let spine = std::iter::once(SpineItem::Nav)
        .chain(
            toc.iter()
                .flat_map(|section| section.chapters.iter())
                .map(|chapter| SpineItem::Chapter(chapter.index)),
        )
        .collect();

    Book { work, toc, spine }
}

impl From<&Book> for TocDump {
    fn from(book: &Book) -> Self {
        Self {
            book_title: book.work.title.clone(),
            work_id: book.work.id.clone(),
            sections: book
                .toc
                .iter()
                .map(|section| TocDumpSection {
                    label: section.label.clone(),
                    chapters: section
                        .chapters
                        .iter()
                        .map(|c| TocDumpChapter {
                            file: c.file_name(),
                            heading: c.heading(),
                            link: c.chapter.link.clone(),
                        })
                        .collect(),
                })
                .collect(),
            spine: book
                .spine
                .iter()
                .map(|item| match item {
                    SpineItem::Nav => "nav".to_owned(),
                    SpineItem::Chapter(index) => format!("chap_{index}.xhtml"),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ChapterStatus;

    fn work() -> Work {
        Work {
            id: "1".to_owned(),
            title: "Test Work".to_owned(),
            cover_url: None,
        }
    }

    fn classified(titles: &[&str]) -> Vec<ClassifiedChapter> {
        titles
            .iter()
            .enumerate()
            .map(|(idx, title)| {
                let chapter = Chapter::new(
                    format!("https://x/c{idx}"),
                    *title,
                    ChapterStatus::Available,
                );
                ClassifiedChapter::new(idx, chapter)
            })
            .collect()
    }

    fn spine_chapters(book: &Book) -> Vec<usize> {
        book.spine
            .iter()
            .filter_map(|item| match item {
                SpineItem::Chapter(idx) => Some(*idx),
                SpineItem::Nav => None,
            })
            .collect()
    }

    #[test]
    fn extra_section_precedes_volumes() {
        let chapters = classified(&["Volume 1 Chapter 1: Dawn", "Interlude"]);
        let book = assemble(work(), chapters);

        let labels = book.toc.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["Extra", "Volume 1"]);
        assert_eq!(book.toc[0].chapters[0].index, 1);
        assert_eq!(book.toc[1].chapters[0].index, 0);
        assert_eq!(
            book.spine,
            [SpineItem::Nav, SpineItem::Chapter(1), SpineItem::Chapter(0)]
        );
    }

    #[test]
    fn grouping_preserves_arrival_order_and_count() {
        let titles = [
            "Volume 2 Chapter 5: Late",
            "Volume 1 Chapter 9: Nine",
            "Side Story",
            "Volume 2 Chapter 1: Early",
            "Volume 1 Chapter 2: Two",
            "Afterword",
        ];
        let groups = group(classified(&titles));

        let total = groups.values().map(Vec::len).sum::<usize>();
        assert_eq!(total, titles.len());

        let order = |key| {
            groups[&key]
                .iter()
                .map(|c: &ClassifiedChapter| c.index)
                .collect::<Vec<_>>()
        };
        assert_eq!(order(VolumeKey::Extra), [2, 5]);
        assert_eq!(order(VolumeKey::Volume(1)), [1, 4]);
        assert_eq!(order(VolumeKey::Volume(2)), [0, 3]);
    }

    #[test]
    fn flattened_toc_equals_spine_without_nav() {
        let titles = [
            "Volume 3 Chapter 1: c",
            "Extra 1",
            "Volume 1 Chapter 1: a",
            "Volume 10 Chapter 1: d",
            "Volume 2 Chapter 1: b",
        ];
        let book = assemble(work(), classified(&titles));

        assert_eq!(book.spine.first(), Some(&SpineItem::Nav));
        assert_eq!(book.spine.len(), titles.len() + 1);
        assert_eq!(book.chapter_count(), titles.len());

        let flattened = book.chapters().map(|c| c.index).collect::<Vec<_>>();
        assert_eq!(flattened, spine_chapters(&book));
        assert_eq!(flattened, [1, 2, 4, 0, 3]);
    }

    #[test]
    fn empty_input_yields_nav_only() {
        let book = assemble(work(), Vec::<ClassifiedChapter>::new());
        assert!(book.toc.is_empty());
        assert_eq!(book.spine, [SpineItem::Nav]);
    }

    #[test]
    fn toc_dump_mirrors_sections_and_spine() {
        let book = assemble(
            work(),
            classified(&["Volume 1 Chapter 1: Dawn", "Interlude"]),
        );
        let dump = TocDump::from(&book);

        assert_eq!(dump.sections[0].label, "Extra");
        assert_eq!(dump.sections[0].chapters[0].file, "chap_1.xhtml");
        assert_eq!(dump.sections[1].chapters[0].heading, "Chapter 1: Dawn");
        assert_eq!(dump.spine, ["nav", "chap_1.xhtml", "chap_0.xhtml"]);
    }
}
