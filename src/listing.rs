//! Chapter enumeration through the site's bulk listing endpoint.
//!
//! The endpoint answers with a single text blob of records shaped like
//! `LINK.data.ENCODED_TITLE.data.SLUG.data.STATUS.end_data.`; records appear in
//! reading order.

use std::io::Write as _;
use std::sync::LazyLock;

use anyhow::Context as _;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cli::ListArgs;
use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::formats::ListingRecord;
use crate::http::Fetcher;

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://.*?)\.data\.(.*?)\.data\.(.*?)\.data\.(available|locked)\.end_data\.")
        .expect("listing record pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    Available,
    Locked,
}

impl ChapterStatus {
    fn from_token(token: &str) -> Self {
        if token == "locked" {
            Self::Locked
        } else {
            Self::Available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Public chapter page; unique within a listing.
    pub link: String,
    /// Listing title until content is fetched, then the authoritative one.
    pub title: String,
    pub slug: String,
    /// Plain text body.
    pub content: String,
    pub status: ChapterStatus,
}

impl Chapter {
    pub fn new(link: impl Into<String>, title: impl Into<String>, status: ChapterStatus) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            slug: String::new(),
            content: String::new(),
            status,
        }
    }
}

/// Single-pass sequence of chapters parsed out of one listing response.
///
/// Records are decoded as the iterator advances. Starting over requires a new
/// [`list`] call.
#[derive(Debug)]
pub struct ChapterListing {
    body: String,
    cursor: usize,
}

impl ChapterListing {
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            cursor: 0,
        }
    }
}

impl Iterator for ChapterListing {
    type Item = Chapter;

    fn next(&mut self) -> Option<Chapter> {
        if self.cursor >= self.body.len() {
            return None;
        }
        let Some(caps) = RECORD.captures_at(&self.body, self.cursor) else {
            self.cursor = self.body.len();
            return None;
        };
        self.cursor = caps.get(0).map_or(self.body.len(), |m| m.end());

        let link = caps.get(1).map_or("", |m| m.as_str());
        let encoded_title = caps.get(2).map_or("", |m| m.as_str());
        let status = ChapterStatus::from_token(caps.get(4).map_or("", |m| m.as_str()));
        let title = percent_decode_str(encoded_title).decode_utf8_lossy();

        Some(Chapter::new(link, title, status))
    }
}

pub fn list(fetcher: &Fetcher, config: &SiteConfig, work_id: &str) -> Result<ChapterListing> {
    let endpoint = config.listing_endpoint()?;
    let response = fetcher
        .post_form(
            &endpoint,
            &[("action", "crn_chapter_list"), ("view_id", work_id)],
        )
        .map_err(|err| Error::listing(work_id, format!("POST {endpoint}: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::listing(
            work_id,
            format!("POST {endpoint} returned {status}"),
        ));
    }
    let body = response
        .text()
        .map_err(|err| Error::listing(work_id, format!("read listing body: {err}")))?;

    tracing::debug!(work_id, bytes = body.len(), "received chapter listing");
    Ok(ChapterListing::from_body(body))
}

/// Prints the listing of a work as JSON lines without fetching chapter content.
pub fn run(args: ListArgs) -> anyhow::Result<()> {
    let config = SiteConfig::from_args(&args.site).context("site config")?;
    let url = config.validate_work_url(&args.url)?;
    let fetcher = config.fetcher().context("build http client")?;

    let work = crate::work::fetch(&fetcher, &url).context("landing page")?;
    tracing::info!(work_id = %work.id, title = %work.title, "found work");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0_usize;
    for (index, chapter) in list(&fetcher, &config, &work.id)
        .context("chapter listing")?
        .enumerate()
    {
        let record = ListingRecord {
            index,
            link: chapter.link,
            title: chapter.title,
            status: chapter.status,
        };
        serde_json::to_writer(&mut out, &record).context("write listing record json")?;
        out.write_all(b"\n").context("write listing record newline")?;
        count += 1;
    }
    out.flush().context("flush listing")?;

    tracing::info!(chapters = count, "listed chapters");
    Ok(())
}
