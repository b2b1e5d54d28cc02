// Metadata Scoring
// Payload size and pixel dimensions, independent of pixel content

use image::ImageReader;
use std::io::Cursor;

use crate::models::{ImageDimensions, ImageSubject, SignalResult};
use super::SignalOutput;

pub const INTEGRITY_SIGNAL: &str = "File Integrity";
pub const METADATA_SIGNAL: &str = "Metadata Analysis";

const INTEGRITY_BASE: i32 = 70;
const METADATA_BASE: i32 = 65;
const SCORE_MIN: i32 = 10;
const SCORE_MAX: i32 = 95;

const SMALL_PAYLOAD: usize = 10 * 1024;
const LARGE_PAYLOAD: usize = 5 * 1024 * 1024;

/// Output sizes common to image generators.
const GENERATOR_SIDES: &[u32] = &[256, 512, 768, 1024, 2048];

/// Known dimensions, or read from the image header without a full decode.
pub fn resolve_dimensions(subject: &ImageSubject) -> Option<ImageDimensions> {
    if let Some(dims) = subject.decoded_dimensions {
        return Some(dims);
    }
    let reader = ImageReader::new(Cursor::new(subject.bytes.as_slice()))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(ImageDimensions { width, height })
}

/// Scores size and the dimensions already attached to the subject; never decodes.
pub fn analyze_metadata(subject: &ImageSubject) -> SignalOutput {
    let mut warnings = Vec::new();

    let mut integrity = INTEGRITY_BASE;
    let size = subject.payload_size();
    if size < SMALL_PAYLOAD {
        integrity -= 15;
        warnings.push("Very small file size may indicate heavy compression or editing".to_string());
    } else if size > LARGE_PAYLOAD {
        integrity += 5;
    }

    let mut metadata = METADATA_BASE;
    if let Some(dims) = subject.decoded_dimensions {
        if GENERATOR_SIDES.contains(&dims.width) && GENERATOR_SIDES.contains(&dims.height) {
            metadata -= 15;
            warnings.push("Image dimensions match common AI generation sizes".to_string());
            if dims.width == dims.height {
                metadata -= 10;
                warnings.push("Square dimensions typical of AI image generators".to_string());
            }
        }
    }

    SignalOutput {
        results: vec![
            SignalResult::new(INTEGRITY_SIGNAL, integrity.clamp(SCORE_MIN, SCORE_MAX)),
            SignalResult::new(METADATA_SIGNAL, metadata.clamp(SCORE_MIN, SCORE_MAX)),
        ],
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::image_heuristics::fixtures::{textured, uniform_gray};

    fn scores(out: &SignalOutput) -> (i32, i32) {
        (out.results[0].score, out.results[1].score)
    }

    #[test]
    fn test_square_generator_size_penalized_twice() {
        let subject = ImageSubject::new(uniform_gray(512, 512), "image/png").with_dimensions(512, 512);
        let out = analyze_metadata(&subject);
        // Tiny PNG as well.
        assert_eq!(scores(&out), (55, 40));
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn test_non_square_generator_size() {
        let subject = ImageSubject::new(vec![0; 20 * 1024], "image/png").with_dimensions(1024, 768);
        let out = analyze_metadata(&subject);
        assert_eq!(scores(&out), (70, 50));
        assert_eq!(out.warnings, vec!["Image dimensions match common AI generation sizes".to_string()]);
    }

    #[test]
    fn test_ordinary_photo_size() {
        let subject = ImageSubject::new(textured(640, 480), "image/png");
        assert_eq!(resolve_dimensions(&subject), Some(ImageDimensions { width: 640, height: 480 }));
        let out = analyze_metadata(&subject.with_dimensions(640, 480));
        assert_eq!(scores(&out), (70, 65));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_large_payload_bonus() {
        let subject = ImageSubject::new(vec![0; 6 * 1024 * 1024], "image/jpeg").with_dimensions(4000, 3000);
        assert_eq!(scores(&analyze_metadata(&subject)), (75, 65));
    }

    #[test]
    fn test_unknown_dimensions_use_size_only() {
        let subject = ImageSubject::new(vec![1, 2, 3], "image/png");
        assert_eq!(resolve_dimensions(&subject), None);
        assert_eq!(scores(&analyze_metadata(&subject)), (55, 65));
    }

    #[test]
    fn test_scores_attached_dimensions_without_probing() {
        let bytes = uniform_gray(512, 512);
        let bare = ImageSubject::new(bytes.clone(), "image/png");
        assert_eq!(scores(&analyze_metadata(&bare)), (55, 65));

        let resolved = ImageSubject::new(bytes, "image/png").with_dimensions(512, 512);
        assert_eq!(scores(&analyze_metadata(&resolved)), (55, 40));
    }
}
