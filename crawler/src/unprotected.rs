use std::{str::FromStr, sync::OnceLock, time::Duration};

use reqwest::{
    Client, ClientBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use tracing::debug;

use crate::{errors::CrawlerError, request::Request, traits::CrawlerResponse};

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

const USER_AGENT: &str = "shrine/0.1 (product catalog image loader)";

static REQWEST_CLIENT: OnceLock<Client> = OnceLock::new();

#[derive(Copy, Clone)]
pub struct UnprotectedCrawler {}

impl Default for UnprotectedCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl UnprotectedCrawler {
    pub fn new() -> Self {
        Self {}
    }

    fn create_client() -> &'static Client {
        REQWEST_CLIENT.get_or_init(|| {
            ClientBuilder::new()
                .gzip(true)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
                .user_agent(USER_AGENT)
                .build()
                .expect("Valid base reqwest to be built")
        })
    }

    /// Sends a single GET, there is no retry. Anything outside of 2xx is
    /// reported as `CrawlerError::UnsuccessfulStatus`.
    pub async fn make_web_request(
        &self,
        request: Request,
    ) -> Result<CrawlerResponse, CrawlerError> {
        let client = Self::create_client();

        let mut request_builder = client.get(request.url.clone());

        if let Some(headers) = request.headers {
            let mut header_map = HeaderMap::new();

            for (key, value) in headers.iter() {
                header_map.append(HeaderName::from_str(key)?, HeaderValue::from_str(value)?);
            }

            request_builder = request_builder.headers(header_map);
        }

        debug!("Sending request to {}", request.url);

        let response = request_builder.send().await?;

        debug!("{response:?}");

        let status = response.status();

        if !status.is_success() {
            return Err(CrawlerError::UnsuccessfulStatus(status.as_u16()));
        }

        let headers = response.headers().clone();
        let raw_bytes = response.bytes().await?.to_vec();

        Ok(CrawlerResponse {
            status,
            raw_bytes,
            headers,
        })
    }
}
