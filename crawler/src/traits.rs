use reqwest::{StatusCode, header::HeaderMap};

#[derive(Debug)]
pub struct CrawlerResponse {
    pub status: StatusCode,
    pub raw_bytes: Vec<u8>,
    pub headers: HeaderMap,
}

impl CrawlerResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}
