//! Site configuration.
//!
//! CLI flags are the only configuration source; every field has a default that
//! targets the live site.

use std::time::Duration;

use url::Url;

use crate::cli::SiteArgs;
use crate::error::{Error, Result};
use crate::http::Fetcher;

pub const DEFAULT_SITE_BASE: &str = "https://creativenovels.com";

/// `rel` value of the `Link` header entry that carries the REST location of a post.
pub const DEFAULT_LINK_REL: &str = "alternate";

const LISTING_PATH: &str = "/wp-admin/admin-ajax.php";

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: Url,
    pub link_rel: String,
    pub timeout: Option<Duration>,
    pub retries: u32,
}

impl SiteConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| Error::validation(format!("invalid site base url {base_url}: {err}")))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(Error::validation(format!(
                "site base url must be http/https: {base_url}"
            )));
        }
        if base_url.host_str().is_none() {
            return Err(Error::validation(format!(
                "site base url must have a host: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            link_rel: DEFAULT_LINK_REL.to_owned(),
            timeout: None,
            retries: 0,
        })
    }

    pub fn from_args(args: &SiteArgs) -> Result<Self> {
        let mut config = Self::new(&args.site_base)?;
        config.link_rel = args.link_rel.trim().to_owned();
        if config.link_rel.is_empty() {
            return Err(Error::validation("--link-rel must not be empty"));
        }
        config.timeout = args.timeout_secs.map(Duration::from_secs);
        config.retries = args.retries;
        Ok(config)
    }

    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    pub fn listing_endpoint(&self) -> Result<Url> {
        self.base_url
            .join(LISTING_PATH)
            .map_err(|err| Error::validation(format!("build listing endpoint: {err}")))
    }

    /// Accepts only work URLs hosted on the configured site (or one of its subdomains).
    pub fn validate_work_url(&self, raw: &str) -> Result<Url> {
        let raw = raw.trim();
        let url = Url::parse(raw)
            .map_err(|err| Error::validation(format!("invalid work url {raw:?}: {err}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::validation(format!("work url must be http/https: {url}")));
        }

        let site_host = self.host();
        let on_site = url
            .host_str()
            .is_some_and(|host| host == site_host || host.ends_with(&format!(".{site_host}")));
        if !on_site {
            return Err(Error::validation(format!(
                "the URL must be from {site_host}: {url}"
            )));
        }
        Ok(url)
    }

    pub fn fetcher(&self) -> reqwest::Result<Fetcher> {
        Fetcher::new(self.timeout, self.retries)
    }
}
