//! Indirection from a public chapter page to its content API location.
//!
//! Chapter pages advertise their REST record through an RFC 8288 `Link` header,
//! e.g. `<https://site/wp-json/wp/v2/posts/42>; rel="alternate"; type="application/json"`.
//! The entry is selected by relation name, never by position.

use reqwest::header::LINK;
use url::Url;

use crate::error::{Error, Result};
use crate::http::Fetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkEntry<'a> {
    target: &'a str,
    rels: Vec<&'a str>,
    media_type: Option<&'a str>,
}

pub fn resolve(fetcher: &Fetcher, link: &str, rel: &str) -> Result<Url> {
    let page_url =
        Url::parse(link).map_err(|err| Error::resolution(link, format!("invalid link: {err}")))?;
    let response = fetcher
        .get(&page_url)
        .map_err(|err| Error::resolution(link, err.to_string()))?;

    let header = response
        .headers()
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");
    if header.trim().is_empty() {
        return Err(Error::resolution(
            link,
            format!("response ({}) has no Link header", response.status()),
        ));
    }

    let target = select_link(&header, rel).map_err(|message| Error::resolution(link, message))?;
    let location = response
        .url()
        .join(target)
        .map_err(|err| Error::resolution(link, format!("invalid target {target:?}: {err}")))?;

    tracing::debug!(%link, %location, "resolved content location");
    Ok(location)
}

/// Returns the target of the entry whose `rel` contains `rel`, preferring a JSON
/// media type when several entries share the relation.
fn select_link<'a>(header: &'a str, rel: &str) -> std::result::Result<&'a str, String> {
    let mut candidates = Vec::new();
    for raw in split_entries(header) {
        let Some(entry) = parse_entry(raw) else {
            if raw.contains(&format!("rel=\"{rel}\"")) || raw.contains(&format!("rel={rel}")) {
                return Err(format!("malformed Link entry: {}", raw.trim()));
            }
            continue;
        };
        if entry.rels.iter().any(|r| r.eq_ignore_ascii_case(rel)) {
            candidates.push(entry);
        }
    }

    let preferred = candidates
        .iter()
        .find(|entry| entry.media_type.is_some_and(|t| t.contains("json")))
        .or_else(|| candidates.first());
    match preferred {
        Some(entry) => Ok(entry.target),
        None => Err(format!("Link header has no entry with rel={rel:?}")),
    }
}

/// Splits a header value on commas that sit outside `<...>` and quoted strings.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in header.char_indices() {
        match ch {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                entries.push(&header[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);

    entries.retain(|entry| !entry.trim().is_empty());
    entries
}

fn parse_entry(raw: &str) -> Option<LinkEntry<'_>> {
    let raw = raw.trim();
    let rest = raw.strip_prefix('<')?;
    let close = rest.find('>')?;
    let target = rest[..close].trim();
    if target.is_empty() {
        return None;
    }

    let mut rels = Vec::new();
    let mut media_type = None;
    for param in rest[close + 1..].split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim().to_ascii_lowercase().as_str() {
            "rel" => rels.extend(value.split_whitespace()),
            "type" => media_type = Some(value),
            _ => {}
        }
    }

    Some(LinkEntry {
        target,
        rels,
        media_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDPRESS: &str = concat!(
        "<https://creativenovels.com/wp-json/>; rel=\"https://api.w.org/\", ",
        "<https://creativenovels.com/wp-json/wp/v2/posts/42>; rel=\"alternate\"; type=\"application/json\", ",
        "<https://creativenovels.com/?p=42>; rel=shortlink"
    );

    #[test]
    fn selects_entry_by_relation_name() {
        assert_eq!(
            select_link(WORDPRESS, "alternate").unwrap(),
            "https://creativenovels.com/wp-json/wp/v2/posts/42"
        );
        assert_eq!(
            select_link(WORDPRESS, "shortlink").unwrap(),
            "https://creativenovels.com/?p=42"
        );
    }

    #[test]
    fn entry_position_does_not_matter() {
        let header = concat!(
            "<https://x/?p=1>; rel=shortlink, ",
            "<https://x/wp-json/>; rel=\"https://api.w.org/\", ",
            "<https://x/wp-json/wp/v2/posts/1>; rel=\"alternate\"; type=\"application/json\""
        );
        assert_eq!(
            select_link(header, "alternate").unwrap(),
            "https://x/wp-json/wp/v2/posts/1"
        );
    }

    #[test]
    fn prefers_json_among_entries_sharing_a_relation() {
        let header = concat!(
            "<https://x/feed/>; rel=\"alternate\"; type=\"application/rss+xml\", ",
            "<https://x/wp-json/wp/v2/posts/7>; rel=\"alternate\"; type=\"application/json\""
        );
        assert_eq!(
            select_link(header, "alternate").unwrap(),
            "https://x/wp-json/wp/v2/posts/7"
        );
    }

    #[test]
    fn commas_inside_targets_do_not_split_entries() {
        let header = "<https://x/a,b>; rel=alternate, <https://x/c>; rel=next";
        assert_eq!(split_entries(header).len(), 2);
        assert_eq!(select_link(header, "alternate").unwrap(), "https://x/a,b");
    }

    #[test]
    fn missing_relation_is_an_error() {
        let header = "<https://x/wp-json/>; rel=\"https://api.w.org/\"";
        let err = select_link(header, "alternate").unwrap_err();
        assert!(err.contains("no entry"), "{err}");
    }

    #[test]
    fn malformed_matching_entry_is_an_error() {
        let header = "https://x/wp-json/wp/v2/posts/1; rel=\"alternate\"";
        let err = select_link(header, "alternate").unwrap_err();
        assert!(err.contains("malformed"), "{err}");
    }

    #[test]
    fn space_separated_relations_match_individually() {
        let entry = parse_entry("<https://x/1>; rel=\"alternate canonical\"").unwrap();
        assert_eq!(entry.rels, ["alternate", "canonical"]);
    }
}
