use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use url::Url;

const USER_AGENT: &str = concat!("novelbookify/", env!("CARGO_PKG_VERSION"));
const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Blocking HTTP transport shared by every pipeline stage.
///
/// Without a timeout a request blocks until the remote answers. `retries` counts
/// extra attempts after the first one, taken only on transport errors and 5xx.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retries: u32,
}

impl Fetcher {
    pub fn new(timeout: Option<Duration>, retries: u32) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, retries })
    }

    pub fn get(&self, url: &Url) -> reqwest::Result<Response> {
        tracing::debug!(%url, "GET");
        self.send_with_retry(|| {
            self.client
                .get(url.clone())
                .header(ACCEPT, "text/html,application/json;q=0.9,*/*;q=0.8")
        })
    }

    pub fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> reqwest::Result<Response> {
        tracing::debug!(%url, "POST");
        self.send_with_retry(|| self.client.post(url.clone()).form(form))
    }

    fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> reqwest::Result<Response> {
        let mut attempt = 0;
        loop {
            let result = build().send();
            let retryable = match &result {
                Ok(response) => response.status().is_server_error(),
                Err(err) => !err.is_builder(),
            };
            if !retryable || attempt >= self.retries {
                return result;
            }

            attempt += 1;
            match &result {
                Ok(response) => {
                    tracing::warn!(status = %response.status(), attempt, "retrying request")
                }
                Err(err) => tracing::warn!(%err, attempt, "retrying request"),
            }
            std::thread::sleep(RETRY_PAUSE);
        }
    }
}
