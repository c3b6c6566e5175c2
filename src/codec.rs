//! Packing of decoded bitmaps into the fixed device layouts.
//!
//! All traversal is row-major (`y` outer, `x` inner). The one-bit formats pad
//! every row to a whole byte and fill bits MSB-first.

use image::Rgba;

use crate::bitmap::{size_advisory, DecodedBitmap, Resize};
use crate::format::PixelFormat;

/// Packed pixel data together with the dimensions that produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedBuffer {
    /// Packed bytes.
    pub bytes: Vec<u8>,
    /// Width of the encoded bitmap, after any resize.
    pub width: u32,
    /// Height of the encoded bitmap, after any resize.
    pub height: u32,
}

impl EncodedBuffer {
    /// Number of packed bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bytes per row of a one-bit format, `ceil(width / 8)`.
#[must_use]
pub fn bit_row_stride(width: u32) -> usize {
    (width as usize).div_ceil(8)
}

/// Exact encoded size of a `width` x `height` bitmap in `format`.
#[must_use]
pub fn packed_len(format: PixelFormat, width: u32, height: u32) -> usize {
    let pixels = width as usize * height as usize;
    match format {
        PixelFormat::Grayscale => pixels,
        PixelFormat::Rgb24 => pixels * 3,
        PixelFormat::Rgb565 => pixels * 2,
        PixelFormat::Binary | PixelFormat::TransparentBinary | PixelFormat::Rgba32Binary => {
            bit_row_stride(width) * height as usize
        }
    }
}

/// Luma of an RGB pixel using the ITU-R 601-2 weights in 16-bit fixed point.
#[must_use]
pub fn luma(Rgba([r, g, b, _]): Rgba<u8>) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471;
    ((weighted + 0x8000) >> 16) as u8
}

/// Monochrome threshold without dithering: luma of 128 and up is white.
#[must_use]
pub fn is_white(pixel: Rgba<u8>) -> bool {
    luma(pixel) >= 0x80
}

/// Pack a 5-6-5 word from 8-bit channels.
#[must_use]
pub fn rgb565(Rgba([r, g, b, _]): Rgba<u8>) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

/// Encode `bitmap` into `format`.
///
/// Pure and deterministic. The output length always equals
/// [`packed_len`]`(format, width, height)`.
#[must_use]
pub fn encode(bitmap: &DecodedBitmap, format: PixelFormat) -> EncodedBuffer {
    let (width, height) = (bitmap.width(), bitmap.height());
    let mut bytes = Vec::with_capacity(packed_len(format, width, height));

    match format {
        PixelFormat::Grayscale => bytes.extend(bitmap.pixels().map(|&px| luma(px))),
        PixelFormat::Rgb24 => {
            for &Rgba([r, g, b, _]) in bitmap.pixels() {
                bytes.extend_from_slice(&[r, g, b]);
            }
        }
        PixelFormat::Rgb565 => {
            for &px in bitmap.pixels() {
                bytes.extend_from_slice(&rgb565(px).to_be_bytes());
            }
        }
        // The bit marks the white (background) pixel, black ink stays 0.
        // Firmware relies on this polarity.
        PixelFormat::Binary => pack_bits(bitmap, &mut bytes, is_white),
        PixelFormat::TransparentBinary | PixelFormat::Rgba32Binary => {
            pack_bits(bitmap, &mut bytes, |Rgba([_, _, _, a])| a == 0);
        }
    }

    EncodedBuffer {
        bytes,
        width,
        height,
    }
}

fn pack_bits(bitmap: &DecodedBitmap, out: &mut Vec<u8>, is_set: impl Fn(Rgba<u8>) -> bool) {
    let stride = bit_row_stride(bitmap.width());
    for y in 0..bitmap.height() {
        let row_start = out.len();
        out.resize(row_start + stride, 0);
        let row = &mut out[row_start..];
        for x in 0..bitmap.width() {
            if is_set(bitmap.pixel(x, y)) {
                row[x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
    }
}

/// What the device draws for `bitmap` in `format`, for editor previews.
///
/// Grayscale becomes opaque luma and Binary becomes opaque black and white
/// by the same threshold as [`encode`]. The color formats drop alpha. The
/// transparency formats keep the bitmap as is.
#[must_use]
pub fn preview(bitmap: &DecodedBitmap, format: PixelFormat) -> DecodedBitmap {
    let mut image = bitmap.as_image().clone();
    match format {
        PixelFormat::Grayscale => {
            for px in image.pixels_mut() {
                let v = luma(*px);
                *px = Rgba([v, v, v, 0xFF]);
            }
        }
        PixelFormat::Binary => {
            for px in image.pixels_mut() {
                let v = if is_white(*px) { 0xFF } else { 0x00 };
                *px = Rgba([v, v, v, 0xFF]);
            }
        }
        PixelFormat::Rgb24 | PixelFormat::Rgb565 => {
            for px in image.pixels_mut() {
                px.0[3] = 0xFF;
            }
        }
        PixelFormat::TransparentBinary | PixelFormat::Rgba32Binary => {}
    }
    DecodedBitmap::new(image)
}

/// Fit `bitmap` into `resize` (when given) ahead of encoding a still image.
///
/// Logs a size advisory for large sources without a resize.
#[must_use]
pub fn prepare_image(bitmap: &DecodedBitmap, resize: Option<Resize>) -> DecodedBitmap {
    if let Some(advisory) = size_advisory(bitmap.width(), bitmap.height(), resize) {
        tracing::warn!("{advisory}");
    }
    match resize {
        Some(bounds) => bitmap.thumbnail(bounds),
        None => bitmap.clone(),
    }
}

/// Encode a still image, resizing it first when `resize` is given.
#[must_use]
pub fn encode_image(
    bitmap: &DecodedBitmap,
    format: PixelFormat,
    resize: Option<Resize>,
) -> EncodedBuffer {
    encode(&prepare_image(bitmap, resize), format)
}
