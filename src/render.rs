/// Intensity/phase panels for a mode field, written as PNG.

use crate::config::BeamConfig;
use crate::error::RenderError;
use crate::physics::{mode_field, Field, Grid};
use crate::selector::Mode;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use std::fs;
use std::path::Path;

/// White gap between the intensity and phase panels, in pixels.
const GUTTER: u32 = 16;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

// matplotlib "bone" segment data: (position, value) per channel.
const BONE_RED: &[(f64, f64)] = &[(0.0, 0.0), (0.746032, 0.652778), (1.0, 1.0)];
const BONE_GREEN: &[(f64, f64)] = &[
    (0.0, 0.0),
    (0.365079, 0.319444),
    (0.746032, 0.777778),
    (1.0, 1.0),
];
const BONE_BLUE: &[(f64, f64)] = &[(0.0, 0.0), (0.365079, 0.444444), (1.0, 1.0)];

fn interpolate(segments: &[(f64, f64)], t: f64) -> f64 {
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if t <= x1 {
            let s = if x1 > x0 { (t - x0) / (x1 - x0) } else { 0.0 };
            return y0 + (y1 - y0) * s;
        }
    }
    segments.last().map_or(0.0, |&(_, y)| y)
}

/// Blue-tinted greyscale; `t` is clamped to [0, 1].
pub fn bone(t: f64) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let channel = |segments: &[(f64, f64)]| (interpolate(segments, t) * 255.0).round() as u8;
    Rgb([channel(BONE_RED), channel(BONE_GREEN), channel(BONE_BLUE)])
}

/// Scale to [0, 1] by the maximum. An all-zero input stays zero.
fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / max).collect()
}

/// Scale min..max to [0, 1]. A constant input maps to 0.5.
fn normalize_range(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

/// Intensity on the left, phase on the right.
pub fn render_panels(field: &Field) -> Result<RgbImage, RenderError> {
    if field.width == 0 || field.height == 0 || field.data.len() != field.width * field.height {
        return Err(RenderError::Dimensions);
    }
    let panel_w = u32::try_from(field.width).map_err(|_| RenderError::Dimensions)?;
    let panel_h = u32::try_from(field.height).map_err(|_| RenderError::Dimensions)?;
    let total_w = panel_w
        .checked_mul(2)
        .and_then(|w| w.checked_add(GUTTER))
        .ok_or(RenderError::Dimensions)?;

    let intensity = normalize_by_max(&field.intensity());
    let phase = normalize_range(&field.phase_turns());

    let mut image = RgbImage::from_pixel(total_w, panel_h, BACKGROUND);
    let phase_x = panel_w + GUTTER;
    for (idx, (i, p)) in intensity.iter().zip(&phase).enumerate() {
        let x = (idx % field.width) as u32;
        let y = (idx / field.width) as u32;
        image.put_pixel(x, y, bone(*i));
        image.put_pixel(phase_x + x, y, bone(*p));
    }
    Ok(image)
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_png(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

/// Evaluate mode `(a, b)` and encode its panels.
pub fn render_mode_png(beam: &BeamConfig, mode: Mode, a: u32, b: u32) -> Result<Vec<u8>, RenderError> {
    let grid = Grid::new(beam);
    let field = mode_field(&grid, beam, mode, a, b);
    encode_png(&render_panels(&field)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use num_complex::Complex64;

    #[test]
    fn bone_endpoints() {
        assert_eq!(bone(0.0), Rgb([0, 0, 0]));
        assert_eq!(bone(1.0), Rgb([255, 255, 255]));
        assert_eq!(bone(-3.0), Rgb([0, 0, 0]));
        assert_eq!(bone(f64::NAN), Rgb([0, 0, 0]));
        let mid = bone(0.5);
        // Blue leads in the lower half of the map.
        assert!(mid.0[2] > mid.0[0]);
    }

    #[test]
    fn panels_sit_side_by_side() {
        let mut field = Field::zeros(4, 3);
        field.data[0] = Complex64::new(2.0, 0.0);
        let image = render_panels(&field).unwrap();
        assert_eq!(image.dimensions(), (4 * 2 + GUTTER, 3));
        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(4, 0), BACKGROUND);
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(matches!(
            render_panels(&Field::zeros(0, 0)),
            Err(RenderError::Dimensions)
        ));
    }

    #[test]
    fn constant_phase_is_mid_grey() {
        assert_eq!(normalize_range(&[0.25, 0.25]), vec![0.5, 0.5]);
        assert_eq!(normalize_by_max(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn rendered_mode_is_png() {
        let beam = BeamConfig {
            points: 32,
            ..BeamConfig::default()
        };
        let bytes = render_mode_png(&beam, Mode::LG, 1, 2).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32 * 2 + GUTTER, 32));
    }

    #[test]
    fn write_creates_directories() {
        let dir = std::env::temp_dir().join(format!("gauss-modes-{}", std::process::id()));
        let path = dir.join("HG").join("0_0.png");
        write_png(&path, b"data").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data");
        let _ = fs::remove_dir_all(&dir);
    }
}
