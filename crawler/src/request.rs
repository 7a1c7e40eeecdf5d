/// A GET request for a single resource. Images are the only thing this
/// crate downloads, so there is no body or method to configure.
#[derive(Debug, Default)]
pub struct Request {
    pub(crate) url: String,
    pub(crate) headers: Option<Vec<(String, String)>>,
}

#[derive(Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: Request::default(),
        }
    }

    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();

        self
    }

    pub fn set_headers(mut self, headers: &[(String, String)]) -> Self {
        self.request.headers = Some(headers.to_vec());

        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_url_and_headers() {
        let request = RequestBuilder::new()
            .set_url("https://example.com/bowl.png")
            .set_headers(&[("accept".into(), "image/*".into())])
            .build();

        assert_eq!(request.url, "https://example.com/bowl.png");
        assert_eq!(
            request.headers,
            Some(vec![("accept".to_string(), "image/*".to_string())])
        );
    }
}
