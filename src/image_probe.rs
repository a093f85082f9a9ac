//! Illustrative-image lookup and displayability probing.
//!
//! A linked-data claim of "image" is not itself proof of a fetchable,
//! decodable resource, so candidate URLs pass a second check that fetches
//! the payload and decodes it before anything is shown.

use std::io::Read;
use std::time::Duration;

use image::DynamicImage;
use log::debug;
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

use crate::config::ImageConfig;
use crate::graph_client::GraphQueryService;
use crate::similarity::resource_reference;

/// Interface for locating and verifying illustrative images.
pub trait ImageSource: Send + Sync {
    /// Returns a candidate image URL for a display label, `Ok(None)` when the
    /// linked-data endpoint binds nothing.
    fn find_image(&self, label: &str) -> Result<Option<String>, String>;
    /// Confirms that `url` serves a decodable image. Any failure is `false`.
    fn is_displayable(&self, url: &str) -> bool;
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

/// Decodes an in-memory payload, falling back to a non-strict JPEG decoder
/// when the primary decoder rejects the bytes.
pub fn decode_image_from_memory_with_fallback(bytes: &[u8]) -> Option<DynamicImage> {
    image::load_from_memory(bytes)
        .ok()
        .or_else(|| decode_jpeg_non_strict(bytes))
}

/// Returns true if an HTTP content-type header indicates an image payload.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}

/// Image source backed by a linked-data SPARQL endpoint plus an HTTP probe.
pub struct LinkedDataImageSource<'a> {
    graph: &'a dyn GraphQueryService,
    resource_namespace: &'a str,
    settings: &'a ImageConfig,
    http_client: ureq::Agent,
}

impl<'a> LinkedDataImageSource<'a> {
    pub fn new(
        graph: &'a dyn GraphQueryService,
        resource_namespace: &'a str,
        settings: &'a ImageConfig,
    ) -> Self {
        let probe_timeout = Duration::from_secs(u64::from(settings.probe_timeout_secs));
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(probe_timeout)
            .timeout_read(probe_timeout)
            .timeout_write(probe_timeout)
            .build();
        Self {
            graph,
            resource_namespace,
            settings,
            http_client,
        }
    }

    fn build_query(&self, label: &str) -> String {
        let resource = resource_reference(self.resource_namespace, label);
        format!(
            "PREFIX dbo: <http://dbpedia.org/ontology/>\n\
             PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
             SELECT ?img WHERE {{\n  \
             VALUES ?person {{ <{resource}> }}\n  \
             OPTIONAL {{ ?person dbo:thumbnail ?img }}\n  \
             OPTIONAL {{ ?person foaf:depiction ?img }}\n  \
             FILTER(bound(?img))\n}} LIMIT 1"
        )
    }

    fn max_payload_bytes(&self) -> u64 {
        u64::from(self.settings.probe_max_payload_mb) * 1024 * 1024
    }
}

impl ImageSource for LinkedDataImageSource<'_> {
    fn find_image(&self, label: &str) -> Result<Option<String>, String> {
        let query = self.build_query(label);
        debug!("image query for '{label}':\n{query}");
        let rows = self.graph.select(&query)?;
        Ok(rows
            .first()
            .and_then(|row| row.value("img"))
            .map(ToOwned::to_owned))
    }

    fn is_displayable(&self, url: &str) -> bool {
        let response = match self
            .http_client
            .get(url)
            .timeout(Duration::from_secs(u64::from(
                self.settings.probe_timeout_secs,
            )))
            .call()
        {
            Ok(response) => response,
            Err(err) => {
                debug!("image probe failed for '{url}': {err}");
                return false;
            }
        };
        if response.status() != 200 {
            return false;
        }
        if !is_image_content_type(response.content_type()) {
            return false;
        }

        let mut bytes = Vec::new();
        if response
            .into_reader()
            .take(self.max_payload_bytes())
            .read_to_end(&mut bytes)
            .is_err()
        {
            return false;
        }
        decode_image_from_memory_with_fallback(&bytes).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{
        codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb,
        RgbImage, Rgba,
    };

    use super::{
        decode_image_from_memory_with_fallback, is_image_content_type, ImageSource,
        LinkedDataImageSource,
    };
    use crate::config::ImageConfig;
    use crate::graph_client::{GraphQueryService, SolutionRow};

    struct FixedGraph {
        rows: Vec<SolutionRow>,
    }

    impl GraphQueryService for FixedGraph {
        fn select(&self, _query: &str) -> Result<Vec<SolutionRow>, String> {
            Ok(self.rows.clone())
        }
    }

    struct FailingGraph;

    impl GraphQueryService for FailingGraph {
        fn select(&self, _query: &str) -> Result<Vec<SolutionRow>, String> {
            Err("endpoint unreachable".to_string())
        }
    }

    #[test]
    fn test_find_image_returns_first_binding() {
        let graph = FixedGraph {
            rows: vec![
                SolutionRow::from_pairs(&[("img", "http://img.example/einstein.jpg")]),
                SolutionRow::from_pairs(&[("img", "http://img.example/other.jpg")]),
            ],
        };
        let settings = ImageConfig::default();
        let source = LinkedDataImageSource::new(&graph, "http://dbpedia.org/resource/", &settings);
        let found = source.find_image("Albert Einstein").expect("query succeeds");
        assert_eq!(found.as_deref(), Some("http://img.example/einstein.jpg"));
    }

    #[test]
    fn test_find_image_absent_on_no_binding() {
        let graph = FixedGraph { rows: Vec::new() };
        let settings = ImageConfig::default();
        let source = LinkedDataImageSource::new(&graph, "http://dbpedia.org/resource/", &settings);
        let found = source.find_image("Albert Einstein").expect("query succeeds");
        assert!(found.is_none());
    }

    #[test]
    fn test_find_image_propagates_endpoint_failures() {
        let settings = ImageConfig::default();
        let source =
            LinkedDataImageSource::new(&FailingGraph, "http://dbpedia.org/resource/", &settings);
        assert!(source.find_image("Albert Einstein").is_err());
    }

    #[test]
    fn test_image_content_type_detection() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("IMAGE/PNG"));
        assert!(!is_image_content_type("text/html"));
        assert!(!is_image_content_type("application/json"));
    }

    #[test]
    fn test_decode_fallback_accepts_jpeg_with_trailing_garbage() {
        let rgb = RgbImage::from_pixel(12, 9, Rgb([90, 140, 210]));
        let mut encoded = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 85);
            encoder
                .encode_image(&DynamicImage::ImageRgb8(rgb))
                .expect("jpeg encoding should succeed");
        }
        // Simulate trailing garbage often seen in malformed files.
        encoded.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let decoded = decode_image_from_memory_with_fallback(&encoded)
            .expect("fallback decoder should decode jpeg bytes");
        assert_eq!(decoded.dimensions(), (12, 9));
    }

    #[test]
    fn test_decode_fallback_decodes_png_bytes() {
        let source =
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(7, 5, Rgba([8, 16, 24, 255])));
        let mut cursor = Cursor::new(Vec::<u8>::new());
        source
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("png encoding should succeed");
        let encoded = cursor.into_inner();

        let decoded = decode_image_from_memory_with_fallback(&encoded)
            .expect("primary decoder should decode png bytes");
        assert_eq!(decoded.dimensions(), (7, 5));
    }

    #[test]
    fn test_decode_fallback_rejects_non_image_bytes() {
        assert!(decode_image_from_memory_with_fallback(b"definitely-not-an-image").is_none());
    }
}
