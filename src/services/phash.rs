use cpu_time::ThreadTime;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::api::error::PhashError;
use crate::models::PhashResult;

/// Side length of the hash grid. 8x8 gives a 64 bit fingerprint.
pub const HASH_SIZE: u32 = 8;

/// Hex characters in a serialized fingerprint
pub const PHASH_HEX_LEN: usize = (HASH_SIZE * HASH_SIZE / 4) as usize;

/// DCT based perceptual hashing
#[derive(Debug, Clone, Copy, Default)]
pub struct PhashService;

impl PhashService {
    pub fn new() -> Self {
        Self
    }

    fn hasher(&self) -> image_hasher::Hasher {
        HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher()
    }

    /// Decode an image from disk. The format is sniffed from the content,
    /// not the file name.
    pub fn decode(&self, path: &Path) -> Result<DynamicImage, PhashError> {
        let reader = image::io::Reader::open(path)
            .map_err(|e| PhashError::Internal(format!("Failed to open image file: {}", e)))?
            .with_guessed_format()
            .map_err(|e| PhashError::Internal(format!("Failed to read image file: {}", e)))?;

        if reader.format().is_none() {
            return Err(PhashError::Decode("unrecognized image format".to_string()));
        }

        reader
            .decode()
            .map_err(|e| PhashError::Decode(e.to_string()))
    }

    /// Fingerprint of an already decoded image
    pub fn fingerprint(&self, img: &DynamicImage) -> ImageHash {
        self.hasher().hash_image(img)
    }

    /// Hash an image, returning the hex fingerprint and the CPU time of the
    /// hashing step alone
    pub fn hash_image(&self, img: &DynamicImage) -> (String, Duration) {
        let hasher = self.hasher();
        let start = ThreadTime::now();
        let hash = hasher.hash_image(img);
        let elapsed = start.elapsed();
        (hex::encode(hash.as_bytes()), elapsed)
    }

    /// Decode and hash the file at `path`
    pub fn hash_file(&self, path: &Path) -> Result<PhashResult, PhashError> {
        let img = self.decode(path)?;
        let image_size = (img.width(), img.height());
        let (phash, elapsed) = self.hash_image(&img);

        debug!(
            "Hashed {}x{} image in {:?} CPU",
            image_size.0, image_size.1, elapsed
        );

        Ok(PhashResult {
            phash,
            image_size,
            time_taken: elapsed.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    /// Large blocks with a diagonal gradient: plenty of low frequency energy.
    fn fixture(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let block = ((x * 4 / width) + (y * 4 / height)) % 2;
            let base = if block == 0 { 40u32 } else { 200u32 };
            let shade = (x + y) * 40 / (width + height);
            let v = (base + shade).min(255) as u8;
            Rgb([v, v.saturating_sub(20), v / 2])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_hash_file_png() {
        let img = fixture(320, 200);
        let file = write_temp(&encode(&img, ImageOutputFormat::Png));

        let result = PhashService::new().hash_file(file.path()).unwrap();
        assert_eq!(result.phash.len(), PHASH_HEX_LEN);
        assert!(result.phash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(result.image_size, (320, 200));
        assert!(result.time_taken >= 0.0);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let bytes = encode(&fixture(128, 96), ImageOutputFormat::Png);
        let a = PhashService::new().hash_file(write_temp(&bytes).path()).unwrap();
        let b = PhashService::new().hash_file(write_temp(&bytes).path()).unwrap();
        assert_eq!(a.phash, b.phash);
    }

    #[test]
    fn test_lossless_reencoding_keeps_hash() {
        let img = fixture(200, 150);
        let png = write_temp(&encode(&img, ImageOutputFormat::Png));
        let bmp = write_temp(&encode(&img, ImageOutputFormat::Bmp));

        let service = PhashService::new();
        let from_png = service.hash_file(png.path()).unwrap();
        let from_bmp = service.hash_file(bmp.path()).unwrap();
        assert_eq!(from_png.phash, from_bmp.phash);
        assert_eq!(from_png.image_size, from_bmp.image_size);
    }

    #[test]
    fn test_jpeg_reencoding_stays_close() {
        let img = fixture(256, 256);
        let service = PhashService::new();

        let jpeg = write_temp(&encode(&img, ImageOutputFormat::Jpeg(95)));
        let decoded = service.decode(jpeg.path()).unwrap();

        let original = service.fingerprint(&img);
        let recompressed = service.fingerprint(&decoded);
        assert!(original.dist(&recompressed) <= 8);
    }

    #[test]
    fn test_format_sniffed_from_content() {
        // A PNG payload behind a misleading name still decodes.
        let bytes = encode(&fixture(64, 48), ImageOutputFormat::Png);
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let result = PhashService::new().hash_file(file.path()).unwrap();
        assert_eq!(result.image_size, (64, 48));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let file = write_temp(b"definitely not an image");
        let err = PhashService::new().hash_file(file.path()).unwrap_err();
        assert!(matches!(err, PhashError::Decode(_)));
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let bytes = encode(&fixture(64, 64), ImageOutputFormat::Png);
        let file = write_temp(&bytes[..bytes.len() / 3]);
        let err = PhashService::new().hash_file(file.path()).unwrap_err();
        assert!(matches!(err, PhashError::Decode(_)));
    }

    #[test]
    fn test_missing_file_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PhashService::new()
            .hash_file(&dir.path().join("gone.png"))
            .unwrap_err();
        assert!(matches!(err, PhashError::Internal(_)));
        assert!(err.message().contains("Failed to open image file"));
    }
}
