//! JPEG picture encoder backed by the `image` crate.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, RgbImage};

use crate::capture::ScreenImage;
use crate::encode::{Error, Geometry, PictureEncoder, ResizeFilter, Result};

/// Quality settings tried in order until the encoding fits the budget.
const QUALITY_LADDER: [u8; 6] = [90, 80, 70, 55, 40, 25];

impl ResizeFilter {
    fn kernel(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Resizes captured screens to a target geometry and JPEG-encodes them under
/// a byte budget.
///
/// When the first quality setting overshoots the budget the encoder walks
/// down a quality ladder, so a busy frame degrades instead of failing; only
/// a frame that stays too large at the lowest setting is an error.
pub struct JpegPictureEncoder {
    geometry: Geometry,
    filter: ResizeFilter,
    max_bytes: usize,
    jpeg: Vec<u8>,
}

impl JpegPictureEncoder {
    /// Build an encoder and encode `image` immediately.
    pub fn new(
        image: &ScreenImage,
        geometry: Geometry,
        filter: ResizeFilter,
        max_bytes: usize,
    ) -> Result<Self> {
        let mut encoder = JpegPictureEncoder {
            geometry,
            filter,
            max_bytes,
            jpeg: Vec::new(),
        };
        encoder.update_image(image)?;
        Ok(encoder)
    }

    fn encode(&mut self, image: &ScreenImage) -> Result<()> {
        let (source_width, source_height) = (image.width(), image.height());
        let rgb: RgbImage =
            ImageBuffer::from_raw(source_width, source_height, image.data().to_vec()).ok_or(
                Error::InvalidImage {
                    width: source_width,
                    height: source_height,
                },
            )?;

        let (width, height) = self.geometry.fit(source_width, source_height);
        let resized = if (width, height) != (source_width, source_height) {
            imageops::resize(&rgb, width, height, self.filter.kernel())
        } else {
            rgb
        };

        let mut last_size = 0;
        for quality in QUALITY_LADDER {
            let mut buffer = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
            encoder.encode(
                resized.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )?;

            if buffer.len() <= self.max_bytes {
                self.jpeg = buffer;
                return Ok(());
            }
            last_size = buffer.len();
        }

        Err(Error::TooLarge {
            size: last_size,
            budget: self.max_bytes,
        })
    }
}

impl PictureEncoder for JpegPictureEncoder {
    fn update_image(&mut self, image: &ScreenImage) -> Result<()> {
        self.encode(image)
    }

    fn encoded_len(&self) -> usize {
        self.jpeg.len()
    }

    fn encoded_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    fn set_filter(&mut self, filter: ResizeFilter) {
        self.filter = filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A diagonal gradient, busy enough that JPEG output is non-trivial.
    fn gradient(width: u32, height: u32) -> ScreenImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        ScreenImage::new(width, height, data)
    }

    #[test]
    fn test_encodes_within_budget() {
        let image = gradient(320, 240);
        let encoder = JpegPictureEncoder::new(
            &image,
            Geometry::new(320, 240),
            ResizeFilter::Triangle,
            100_000,
        )
        .unwrap();

        assert!(encoder.encoded_len() > 0);
        assert!(encoder.encoded_len() <= 100_000);
        assert_eq!(encoder.encoded_len(), encoder.encoded_bytes().len());
        // JPEG SOI marker.
        assert_eq!(&encoder.encoded_bytes()[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_resizes_to_fit_geometry() {
        let image = gradient(640, 480);
        let mut encoder = JpegPictureEncoder::new(
            &image,
            Geometry::new(320, 240),
            ResizeFilter::Triangle,
            100_000,
        )
        .unwrap();
        let small = encoder.encoded_len();

        // Feeding the same frame again re-encodes deterministically.
        encoder.update_image(&image).unwrap();
        assert_eq!(encoder.encoded_len(), small);
    }

    #[test]
    fn test_impossible_budget_is_an_error() {
        let image = gradient(320, 240);
        let result = JpegPictureEncoder::new(
            &image,
            Geometry::new(320, 240),
            ResizeFilter::Triangle,
            16,
        )
        .map(|_| ());

        match result {
            Err(Error::TooLarge { size, budget }) => {
                assert!(size > budget);
                assert_eq!(budget, 16);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_follows_source_size_changes() {
        let mut encoder = JpegPictureEncoder::new(
            &gradient(64, 64),
            Geometry::new(32, 32),
            ResizeFilter::Nearest,
            50_000,
        )
        .unwrap();

        encoder.update_image(&gradient(16, 16)).unwrap();
        assert!(encoder.encoded_len() > 0);
    }
}
