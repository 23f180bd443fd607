use scraper::{Html, Node};
use url::Url;

use crate::error::{Error, Result};
use crate::formats::PostRecord;
use crate::http::Fetcher;
use crate::listing::Chapter;

/// Authoritative chapter data pulled from the content API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    pub title: String,
    pub slug: String,
    pub text: String,
}

impl Chapter {
    /// Replaces the listing title with the authoritative one and stores the body text.
    pub fn fill(&mut self, content: ChapterContent) {
        self.title = content.title;
        self.slug = content.slug;
        self.content = content.text;
    }
}

pub fn fetch(fetcher: &Fetcher, location: &Url) -> Result<ChapterContent> {
    let response = fetcher
        .get(location)
        .map_err(|err| Error::content_fetch(location.as_str(), err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::content_fetch(
            location.as_str(),
            format!("HTTP {status}"),
        ));
    }
    let body = response
        .text()
        .map_err(|err| Error::content_fetch(location.as_str(), err.to_string()))?;

    parse_post(&body).map_err(|message| Error::content_fetch(location.as_str(), message))
}

fn parse_post(body: &str) -> std::result::Result<ChapterContent, String> {
    let post: PostRecord =
        serde_json::from_str(body).map_err(|err| format!("unexpected chapter record: {err}"))?;

    Ok(ChapterContent {
        title: decode_entities(&post.title.rendered).trim().to_owned(),
        slug: post.slug,
        text: html_to_text(&post.content.rendered),
    })
}

/// Decodes character references only; a literal `<Gate>` in a title is kept.
pub fn decode_entities(input: &str) -> String {
    Html::parse_fragment(&input.replace('<', "&lt;"))
        .root_element()
        .text()
        .collect::<String>()
}

/// Visible text of an HTML fragment. Markup is dropped, `<br>` and the start of a
/// block element become a newline, script and style bodies are skipped.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Element(element) if element.name() == "br" => out.push('\n'),
            Node::Element(element) if is_block(element.name()) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|e| matches!(e.name(), "script" | "style" | "template"))
                });
                if !hidden {
                    out.push_str(text);
                }
            }
            _ => {}
        }
    }

    out
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "hr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_post_and_normalizes_title() {
        let body = r#"{
            "id": 42,
            "slug": "volume-1-chapter-1",
            "title": {"rendered": "  Volume 1 Chapter 1: Dawn&#8217;s Edge &amp; More "},
            "content": {"rendered": "<p>First line.</p>\n<p>Second <em>line</em>.</p>\n", "protected": false}
        }"#;
        let content = parse_post(body).unwrap();

        assert_eq!(content.title, "Volume 1 Chapter 1: Dawn\u{2019}s Edge & More");
        assert_eq!(content.slug, "volume-1-chapter-1");
        assert_eq!(content.text, "First line.\nSecond line.\n");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let err = parse_post(r#"{"slug": "x", "title": {"rendered": "T"}}"#).unwrap_err();
        assert!(err.contains("content"), "{err}");

        let err = parse_post("<html>not json</html>").unwrap_err();
        assert!(err.contains("unexpected chapter record"), "{err}");
    }

    #[test]
    fn text_extraction_skips_scripts_and_keeps_breaks() {
        let html = "<p>a<br>b</p><script>var x = 1;</script><style>p{}</style><div>c &lt; d</div>";
        assert_eq!(html_to_text(html), "a\nb\nc < d");
    }

    #[test]
    fn adjacent_blocks_land_on_separate_lines() {
        assert_eq!(
            html_to_text("<p>First.</p><p>Second.</p><h2>Third</h2><ul><li>x</li><li>y</li></ul>"),
            "First.\nSecond.\nThird\nx\ny"
        );
        assert_eq!(html_to_text("<div><p>Nested</p></div>"), "Nested");
    }

    #[test]
    fn title_decoding_keeps_literal_angle_brackets() {
        assert_eq!(
            decode_entities("Volume 1 Chapter 3: The <Gate> Opens"),
            "Volume 1 Chapter 3: The <Gate> Opens"
        );
        assert_eq!(decode_entities("Tom &amp; Jerry&#8217;s &lt;b&gt;"), "Tom & Jerry\u{2019}s <b>");
    }

    #[test]
    fn fill_overwrites_listing_title() {
        let mut chapter = Chapter::new(
            "https://x/c1",
            "listing title",
            crate::listing::ChapterStatus::Available,
        );
        chapter.fill(ChapterContent {
            title: "Interlude".to_owned(),
            slug: "interlude".to_owned(),
            text: "body".to_owned(),
        });
        assert_eq!(chapter.title, "Interlude");
        assert_eq!(chapter.slug, "interlude");
        assert_eq!(chapter.content, "body");
    }
}
