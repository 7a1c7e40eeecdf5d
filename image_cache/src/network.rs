use async_trait::async_trait;
use common::image_cache::DecodedImage;
use crawler::{request::RequestBuilder, unprotected::UnprotectedCrawler};
use tracing::{debug, trace};

use crate::{errors::FetchError, traits::ImageFetcher};

const ACCEPT_IMAGES: &str = "image/png,image/jpeg;q=0.9,*/*;q=0.5";

#[derive(Default, Clone, Copy)]
pub struct HttpImageFetcher {
    crawler: UnprotectedCrawler,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            crawler: UnprotectedCrawler::new(),
        }
    }
}

pub(crate) fn decode_image(bytes: &[u8]) -> Result<DecodedImage, FetchError> {
    let decoded = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = decoded.dimensions();

    Ok(DecodedImage::new(width, height, decoded.into_raw()))
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<DecodedImage, FetchError> {
        let request = RequestBuilder::new()
            .set_url(url)
            .set_headers(&[("accept".into(), ACCEPT_IMAGES.into())])
            .build();

        let response = self.crawler.make_web_request(request).await?;

        trace!(
            "Received {} bytes of {:?} for {}",
            response.raw_bytes.len(),
            response.content_type(),
            url
        );

        // decoding a large JPEG takes long enough to stall other downloads
        let raw_bytes = response.raw_bytes;
        let image = tokio::task::spawn_blocking(move || decode_image(&raw_bytes))
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))??;

        debug!("Decoded {} into {:?}", url, image);

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn decodes_png_into_rgba() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut encoded = Cursor::new(Vec::new());
        source.write_to(&mut encoded, ImageFormat::Png).unwrap();

        let image = decode_image(encoded.get_ref()).unwrap();

        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.byte_size(), 24);
        assert_eq!(&image.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = decode_image(b"definitely not an image");

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
