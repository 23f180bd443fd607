//! Landing page discovery: work identifier, display title and cover art.

use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use url::Url;

use crate::epub::{CoverImage, media_type_for_path};
use crate::error::{Error, Result};
use crate::http::Fetcher;

/// The serialized novel being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    /// Internal identifier used by the listing endpoint.
    pub id: String,
    pub title: String,
    pub cover_url: Option<Url>,
}

pub fn fetch(fetcher: &Fetcher, url: &Url) -> Result<Work> {
    let response = fetcher
        .get(url)
        .map_err(|err| Error::landing(url.as_str(), err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::landing(url.as_str(), format!("HTTP {status}")));
    }
    let html = response
        .text()
        .map_err(|err| Error::landing(url.as_str(), err.to_string()))?;

    parse_landing_page(&html, url)
}

pub fn parse_landing_page(html: &str, page_url: &Url) -> Result<Work> {
    let document = Html::parse_document(html);

    let id = document
        .select(&selector("div#chapter_list_novel_page")?)
        .next()
        .and_then(|node| node.value().attr("class"))
        .and_then(|classes| classes.split_whitespace().next())
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::validation(format!("no work identifier on landing page {page_url}"))
        })?;

    let title = document
        .select(&selector("title")?)
        .next()
        .map(|node| node.text().collect::<String>())
        .and_then(|text| text.split('-').next().map(|head| head.trim().to_owned()))
        .filter(|title| !title.is_empty())
        .ok_or_else(|| {
            Error::validation(format!(
                "could not retrieve the work title from {page_url}; check the URL and try again"
            ))
        })?;

    let cover_url = document
        .select(&selector("img.book_cover")?)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| match page_url.join(src.trim()) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(src, %err, "ignoring unparsable cover url");
                None
            }
        });

    Ok(Work {
        id,
        title,
        cover_url,
    })
}

pub fn fetch_cover(fetcher: &Fetcher, url: &Url) -> Result<CoverImage> {
    let response = fetcher
        .get(url)
        .map_err(|err| Error::cover(url.as_str(), err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::cover(url.as_str(), format!("HTTP {status}")));
    }

    let header_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|v| v.starts_with("image/"));
    let media_type = header_type.unwrap_or_else(|| media_type_for_path(url.path()).to_owned());

    let bytes = response
        .bytes()
        .map_err(|err| Error::cover(url.as_str(), err.to_string()))?
        .to_vec();

    Ok(CoverImage { bytes, media_type })
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| Error::validation(format!("invalid selector {css}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"<!doctype html>
<html>
  <head><title>The Long Road &amp; Home - Creative Novels</title></head>
  <body>
    <img class="book_cover wp-image" src="/wp-content/uploads/cover.jpg" />
    <div id="chapter_list_novel_page" class="12345 loading">…</div>
  </body>
</html>
"#;

    fn page_url() -> Url {
        Url::parse("https://creativenovels.com/novel/the-long-road/").unwrap()
    }

    #[test]
    fn parses_identifier_title_and_cover() {
        let work = parse_landing_page(LANDING, &page_url()).unwrap();
        assert_eq!(work.id, "12345");
        assert_eq!(work.title, "The Long Road & Home");
        assert_eq!(
            work.cover_url.unwrap().as_str(),
            "https://creativenovels.com/wp-content/uploads/cover.jpg"
        );
    }

    #[test]
    fn cover_is_optional() {
        let html = LANDING.replace("book_cover", "other");
        let work = parse_landing_page(&html, &page_url()).unwrap();
        assert!(work.cover_url.is_none());
    }

    #[test]
    fn missing_identifier_is_a_validation_error() {
        let html = LANDING.replace("chapter_list_novel_page", "something_else");
        let err = parse_landing_page(&html, &page_url()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn blank_title_is_a_validation_error() {
        let html = LANDING.replace("The Long Road &amp; Home - Creative Novels", " - Creative");
        let err = parse_landing_page(&html, &page_url()).unwrap_err();
        assert!(err.to_string().contains("work title"));
    }
}
