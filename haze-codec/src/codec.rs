//! [`FingerprintCodec`] implementation backed by the `blurhash` crate.

use bytes::Bytes;
use tracing::debug;

use haze_core::constants::{ENCODE_WORKING_SIZE, MAX_COMPONENTS};
use haze_core::{DecodeParams, EncodeParams, FingerprintCodec, FingerprintResult, HazeError, ImageMetadata, Result};

use crate::raster::{encode_png, prepare};

const BASE83_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Checks that `hash` is a well-formed blurhash: base83 only, and exactly as long
/// as its size flag says.
pub fn validate_blurhash(hash: &str) -> Result<()> {
    if hash.len() < 6 {
        return Err(HazeError::Validation(format!(
            "blurhash must be at least 6 characters, got {}",
            hash.len()
        )));
    }

    if !hash.bytes().all(|b| BASE83_ALPHABET.contains(&b)) {
        return Err(HazeError::Validation("blurhash contains invalid characters".into()));
    }

    // First character encodes (y - 1) * 9 + (x - 1).
    let size_flag = BASE83_ALPHABET
        .iter()
        .position(|&c| c == hash.as_bytes()[0])
        .unwrap_or(0);
    let component_x = size_flag % MAX_COMPONENTS as usize + 1;
    let component_y = size_flag / MAX_COMPONENTS as usize + 1;
    if component_y > MAX_COMPONENTS as usize {
        return Err(HazeError::Validation(format!(
            "blurhash size flag encodes {} vertical components, at most {} allowed",
            component_y, MAX_COMPONENTS
        )));
    }
    let expected = 4 + 2 * component_x * component_y;

    if hash.len() != expected {
        return Err(HazeError::Validation(format!(
            "blurhash length mismatch: expected {} characters for {}x{} components, got {}",
            expected,
            component_x,
            component_y,
            hash.len()
        )));
    }
    Ok(())
}

/// Blurhash codec.
#[derive(Clone, Debug)]
pub struct BlurhashCodec {
    working_size: u32,
}

impl BlurhashCodec {
    /// Creates a codec that shrinks images to 32×32 before encoding.
    pub fn new() -> Self {
        Self::with_working_size(ENCODE_WORKING_SIZE)
    }

    /// Creates a codec with a custom working size.
    pub fn with_working_size(working_size: u32) -> Self {
        Self {
            working_size: working_size.max(1),
        }
    }
}

impl Default for BlurhashCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintCodec for BlurhashCodec {
    fn encode(&self, image: &[u8], params: EncodeParams) -> Result<FingerprintResult> {
        let prepared = prepare(image, self.working_size)?;

        let fingerprint = blurhash::encode(
            params.component_x(),
            params.component_y(),
            prepared.width,
            prepared.height,
            &prepared.pixels,
        )
        .map_err(|e| HazeError::Transform(format!("Blurhash encoding failed: {:?}", e)))?;

        debug!(
            fingerprint = %fingerprint,
            width = prepared.source_width,
            height = prepared.source_height,
            "Encoded blurhash"
        );

        Ok(FingerprintResult {
            fingerprint,
            metadata: ImageMetadata {
                width: prepared.source_width,
                height: prepared.source_height,
                format: prepared.format,
                size: image.len(),
                component_x: params.component_x(),
                component_y: params.component_y(),
            },
        })
    }

    fn decode(&self, fingerprint: &str, params: DecodeParams) -> Result<Bytes> {
        validate_blurhash(fingerprint)?;

        let pixels = blurhash::decode(fingerprint, params.width(), params.height(), params.punch())
            .map_err(|e| HazeError::Transform(format!("Blurhash decoding failed: {:?}", e)))?;

        let png = encode_png(pixels, params.width(), params.height())?;
        Ok(Bytes::from(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};
    use test_case::test_case;

    fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 4) as u8, (y * 4) as u8, 200, 255])
        });
        encode_png(img.into_raw(), width, height).unwrap()
    }

    #[test]
    fn test_encode_reports_source_metadata() {
        let png = gradient_png(60, 40);
        let result = BlurhashCodec::new().encode(&png, EncodeParams::new(4, 3)).unwrap();

        // 4 + 2 * 4 * 3
        assert_eq!(result.fingerprint.len(), 28);
        assert_eq!(result.metadata.width, 60);
        assert_eq!(result.metadata.height, 40);
        assert_eq!(result.metadata.format, "png");
        assert_eq!(result.metadata.size, png.len());
        assert_eq!((result.metadata.component_x, result.metadata.component_y), (4, 3));
        validate_blurhash(&result.fingerprint).unwrap();
    }

    #[test]
    fn test_encode_is_deterministic() {
        let png = gradient_png(16, 16);
        let codec = BlurhashCodec::new();
        let a = codec.encode(&png, EncodeParams::default()).unwrap();
        let b = codec.encode(&png, EncodeParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_garbage_is_transform_error() {
        let err = BlurhashCodec::new().encode(b"nope", EncodeParams::default()).unwrap_err();
        assert!(matches!(err, HazeError::Transform(_)));
    }

    #[test]
    fn test_decode_renders_png() {
        let params = DecodeParams::new(20, 10, 1.0).unwrap();
        let png = BlurhashCodec::new().decode("LEHV6nWB2yk8pyo0adR*.7kCMdnj", params).unwrap();

        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
    }

    #[test_case("abc"; "too short")]
    #[test_case("LEHV6nWB2yk8pyo0adR*.7kCMdn"; "length mismatch")]
    #[test_case("LEHV6nWB2yk8pyo0adR*.7kCMd\"j"; "invalid character")]
    #[test_case(&format!("}}{}", "0".repeat(23)); "ten vertical components")]
    #[test_case(&format!("~{}", "0".repeat(43)); "two by ten components")]
    fn test_decode_rejects_malformed(hash: &str) {
        let err = BlurhashCodec::new().decode(hash, DecodeParams::default()).unwrap_err();
        assert!(err.is_validation_error());
    }
}
