//! PNG decode and encode for pixel buffers.

use std::io::Cursor;

use dither_engine::PixelBuffer;

use crate::error::RenderError;

/// Decode a PNG into an RGBA buffer.
///
/// Palette, grayscale and 16-bit images are expanded to 8-bit RGBA; images
/// without an alpha channel become fully opaque.
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, RenderError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| RenderError::PngDecode(e.to_string()))?;

    let mut data = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut data)
        .map_err(|e| RenderError::PngDecode(e.to_string()))?;
    data.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(RenderError::UnsupportedPng(format!(
            "bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => data,
        png::ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Indexed => {
            return Err(RenderError::UnsupportedPng(
                "indexed color was not expanded".to_string(),
            ))
        }
    };

    tracing::debug!(
        width = info.width,
        height = info.height,
        color_type = ?info.color_type,
        "Decoded PNG"
    );
    Ok(PixelBuffer::new(info.width, info.height, rgba)?)
}

/// Encode an RGBA buffer as an 8-bit RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, buffer.width(), buffer.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(buffer.bytes())
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Losslessly re-compress PNG bytes with oxipng.
///
/// Returns the input unchanged if optimization fails.
pub fn optimize_png(png_bytes: Vec<u8>) -> Vec<u8> {
    match oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            ..Default::default()
        },
    ) {
        Ok(optimized) => {
            tracing::debug!(
                before = png_bytes.len(),
                after = optimized.len(),
                "Optimized PNG"
            );
            optimized
        }
        Err(e) => {
            tracing::warn!(%e, "PNG optimization failed, keeping original");
            png_bytes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_raw(
        width: u32,
        height: u32,
        color: png::ColorType,
        depth: png::BitDepth,
        palette: Option<&[u8]>,
        data: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, width, height);
            encoder.set_color(color);
            encoder.set_depth(depth);
            if let Some(palette) = palette {
                encoder.set_palette(palette);
            }
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        buf
    }

    #[test]
    fn test_rgba_round_trip() {
        let mut buffer = PixelBuffer::filled(3, 2, [10, 20, 30, 40]);
        buffer.set_pixel(2, 1, [255, 0, 128, 255]);
        let decoded = decode_png(&encode_png(&buffer).unwrap()).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn test_grayscale_expands_to_opaque_rgba() {
        let png = encode_raw(
            2,
            1,
            png::ColorType::Grayscale,
            png::BitDepth::Eight,
            None,
            &[7, 200],
        );
        let decoded = decode_png(&png).unwrap();
        assert_eq!(decoded.bytes(), &[7, 7, 7, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_indexed_expands_through_palette() {
        // Two pixels at 1 bit: indices 1, 0
        let png = encode_raw(
            2,
            1,
            png::ColorType::Indexed,
            png::BitDepth::One,
            Some(&[0, 0, 0, 255, 0, 0]),
            &[0b1000_0000],
        );
        let decoded = decode_png(&png).unwrap();
        assert_eq!(decoded.bytes(), &[255, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_sixteen_bit_is_stripped() {
        let png = encode_raw(
            1,
            1,
            png::ColorType::Rgb,
            png::BitDepth::Sixteen,
            None,
            &[0x12, 0x34, 0xAB, 0xCD, 0xFF, 0xFF],
        );
        let decoded = decode_png(&png).unwrap();
        assert_eq!(decoded.bytes(), &[0x12, 0xAB, 0xFF, 255]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            decode_png(b"not a png"),
            Err(RenderError::PngDecode(_))
        ));
    }

    #[test]
    fn test_optimize_keeps_pixels() {
        let buffer = PixelBuffer::filled(16, 16, [0, 0, 0, 255]);
        let original = encode_png(&buffer).unwrap();
        let optimized = optimize_png(original.clone());
        assert_eq!(decode_png(&optimized).unwrap(), buffer);
        assert!(optimized.len() <= original.len());
    }
}
