//! Error types for the novel pipeline.
//!
//! Every variant is fatal to a run; the binary wraps these with `anyhow` context.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input URL or landing page does not describe a work on the configured site.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The landing page could not be downloaded.
    #[error("cannot fetch landing page {url}: {message}")]
    Landing { url: String, message: String },

    /// The public chapter page did not point at a content location.
    #[error("cannot resolve content location for {link}: {message}")]
    Resolution { link: String, message: String },

    /// The chapter listing request failed.
    #[error("chapter listing failed for work {work_id}: {message}")]
    Listing { work_id: String, message: String },

    /// The content API returned something other than a chapter record.
    #[error("cannot fetch chapter content from {location}: {message}")]
    ContentFetch { location: String, message: String },

    #[error("cannot fetch cover image {url}: {message}")]
    Cover { url: String, message: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn landing(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Landing {
            url: url.into(),
            message: msg.into(),
        }
    }

    pub fn resolution(link: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Resolution {
            link: link.into(),
            message: msg.into(),
        }
    }

    pub fn listing(work_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Listing {
            work_id: work_id.into(),
            message: msg.into(),
        }
    }

    pub fn content_fetch(location: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ContentFetch {
            location: location.into(),
            message: msg.into(),
        }
    }

    pub fn cover(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Cover {
            url: url.into(),
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
