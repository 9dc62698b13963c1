//! Domain-critical regression tests for dither-engine.
//!
//! Each test names the class of bug it guards against.

#[cfg(test)]
mod domain_tests {
    use crate::buffer::{luminance, Color, PixelBuffer};
    use crate::dither::{run, CustomKernel, Dither, DitherAlgorithm, DitherParams, Family};
    use crate::palette::extract_palette;
    use crate::resample::upscale_nearest;
    use crate::tiling::TilePlan;
    use crate::tone::ToneAdjustment;

    fn uniform(size: u32, value: u8) -> PixelBuffer {
        PixelBuffer::from_luminance(size, size, &vec![value; (size * size) as usize]).unwrap()
    }

    fn mean_luminance(buffer: &PixelBuffer) -> f64 {
        let sum: f64 = buffer
            .bytes()
            .chunks_exact(4)
            .map(|p| luminance(p[0] as f32, p[1] as f32, p[2] as f32) as f64)
            .sum();
        sum / buffer.pixel_count() as f64
    }

    /// A photo-like RGBA buffer with varying alpha.
    fn scene(width: u32, height: u32) -> PixelBuffer {
        let mut bytes = Vec::new();
        for y in 0..height {
            for x in 0..width {
                bytes.extend_from_slice(&[
                    (x * 255 / width.max(1)) as u8,
                    (y * 255 / height.max(1)) as u8,
                    ((x * 7 + y * 13) % 256) as u8,
                    ((x + y) % 200) as u8,
                ]);
            }
        }
        PixelBuffer::new(width, height, bytes).unwrap()
    }

    fn params_for(algorithm: DitherAlgorithm) -> DitherParams {
        let params = DitherParams::new(algorithm).seed(11);
        if algorithm == DitherAlgorithm::Custom {
            params.custom_kernel(CustomKernel::new(vec![vec![0, 0, 0, 8, 4], vec![2, 4, 8, 4, 2]], 32))
        } else {
            params
        }
    }

    // ========================================================================
    // Shape: output length and alpha
    // ========================================================================

    /// If this breaks, it means: some strategy changed the buffer size or let
    /// source alpha leak into the output.
    #[test]
    fn test_every_strategy_preserves_length_and_forces_alpha() {
        let buffer = scene(37, 23);
        for algorithm in DitherAlgorithm::ALL {
            let out = run(&buffer, &params_for(algorithm)).unwrap();
            assert_eq!(out.dimensions(), buffer.dimensions(), "{algorithm}");
            assert_eq!(out.bytes().len(), buffer.bytes().len(), "{algorithm}");
            assert!(
                out.bytes().chunks_exact(4).all(|p| p[3] == 255),
                "{algorithm} left alpha below 255"
            );
        }
    }

    /// If this breaks, it means: palette mode produced a color that is not in
    /// the palette or kept source alpha.
    #[test]
    fn test_palette_mode_alpha_and_membership() {
        let palette = vec![
            Color::BLACK,
            Color::WHITE,
            Color::new(200, 30, 30),
            Color::new(30, 160, 40),
        ];
        let buffer = scene(31, 19);
        for algorithm in DitherAlgorithm::ALL {
            if algorithm.family() != Family::ErrorDiffusion {
                continue;
            }
            let params = params_for(algorithm).palette(palette.clone());
            let out = run(&buffer, &params).unwrap();
            for px in out.bytes().chunks_exact(4) {
                assert_eq!(px[3], 255);
                assert!(palette.contains(&Color::new(px[0], px[1], px[2])), "{algorithm}");
            }
        }
    }

    // ========================================================================
    // Energy: conserving versus lossy kernels
    // ========================================================================

    /// If this breaks, it means: Floyd-Steinberg no longer conserves energy
    /// (weights no longer sum to the divisor, or error is being clamped in a
    /// byte buffer), or Atkinson started propagating all of its error.
    #[test]
    fn test_floyd_steinberg_conserves_atkinson_lightens() {
        let buffer = uniform(32, 180);

        let fs = run(&buffer, &DitherParams::new(DitherAlgorithm::FloydSteinberg)).unwrap();
        let fs_mean = mean_luminance(&fs);
        assert!(
            (fs_mean - 180.0).abs() < 2.0,
            "REGRESSION: Floyd-Steinberg mean {fs_mean:.2}, expected ~180"
        );

        let atkinson = run(&buffer, &DitherParams::new(DitherAlgorithm::Atkinson)).unwrap();
        let lift = mean_luminance(&atkinson) - 180.0;
        assert!(
            lift > 8.0 && lift < 30.0,
            "REGRESSION: Atkinson lifted mean by {lift:.2}, expected a bounded lightening"
        );
    }

    /// If this breaks, it means: error diffusion runs on a clamped byte buffer
    /// again and loses energy at the extremes of a gradient.
    #[test]
    fn test_energy_conserving_kernels_track_gradient_mean() {
        let values: Vec<u8> = (0..64 * 64).map(|i| ((i % 64) * 4) as u8).collect();
        let buffer = PixelBuffer::from_luminance(64, 64, &values).unwrap();
        let input = mean_luminance(&buffer);
        for algorithm in [
            DitherAlgorithm::FloydSteinberg,
            DitherAlgorithm::Burkes,
            DitherAlgorithm::Stucki,
            DitherAlgorithm::Sierra,
            DitherAlgorithm::SierraLite,
            DitherAlgorithm::SierraTwoRow,
            DitherAlgorithm::JarvisJudiceNinke,
            DitherAlgorithm::StevensonArce,
        ] {
            let out = run(&buffer, &DitherParams::new(algorithm)).unwrap();
            let mean = mean_luminance(&out);
            assert!(
                (mean - input).abs() < 4.0,
                "{algorithm}: mean {mean:.2}, input {input:.2}"
            );
        }
    }

    // ========================================================================
    // Exact small cases
    // ========================================================================

    /// If this breaks, it means: the binary threshold comparison changed
    /// direction or lost its `< threshold is black` rule.
    #[test]
    fn test_threshold_four_pixels() {
        let buffer = PixelBuffer::from_luminance(4, 1, &[50, 50, 200, 200]).unwrap();
        let out = run(&buffer, &DitherParams::new(DitherAlgorithm::Threshold).threshold(128.0))
            .unwrap();
        let expected: Vec<u8> = [0u8, 0, 255, 255]
            .iter()
            .flat_map(|&v| [v, v, v, 255])
            .collect();
        assert_eq!(out.bytes(), expected.as_slice());
    }

    /// If this breaks, it means: Bayer thresholds are no longer `cell * 255 /
    /// n²` or the matrix is indexed `(x, y)` instead of `(y, x)`.
    #[test]
    fn test_bayer_2x2_mid_grey_pattern() {
        let out = run(&uniform(2, 128), &DitherParams::new(DitherAlgorithm::Bayer2x2)).unwrap();
        assert_eq!(out.pixel(0, 0)[0], 255);
        assert_eq!(out.pixel(1, 0)[0], 255);
        assert_eq!(out.pixel(0, 1)[0], 0);
        assert_eq!(out.pixel(1, 1)[0], 255);
    }

    /// If this breaks, it means: error diffusion writes to neighbours outside
    /// the buffer, or a 1x1 image no longer thresholds correctly.
    #[test]
    fn test_floyd_steinberg_single_pixel() {
        let out = run(&uniform(1, 100), &DitherParams::new(DitherAlgorithm::FloydSteinberg))
            .unwrap();
        assert_eq!(out.bytes(), &[0, 0, 0, 255]);
    }

    /// If this breaks, it means: a kernel reaching further than the image
    /// (Stevenson-Arce spans 7 columns and 4 rows) indexes out of bounds.
    #[test]
    fn test_wide_kernels_on_tiny_images() {
        for (w, h) in [(1, 1), (1, 5), (5, 1), (2, 2), (3, 4)] {
            let buffer = PixelBuffer::from_luminance(w, h, &vec![77; (w * h) as usize]).unwrap();
            for algorithm in DitherAlgorithm::ALL {
                let out = run(&buffer, &params_for(algorithm)).unwrap();
                assert_eq!(out.dimensions(), (w, h));
            }
        }
    }

    // ========================================================================
    // Palette extraction
    // ========================================================================

    /// If this breaks, it means: median cut splits boxes with a single color,
    /// keeps duplicate colors, or the cap changes the result for simple
    /// images.
    #[test]
    fn test_two_color_image_extracts_two_colors() {
        let mut buffer = PixelBuffer::filled(20, 10, [12, 80, 200, 255]);
        for y in 0..10 {
            for x in 0..7 {
                buffer.set_pixel(x, y, [240, 200, 20, 255]);
            }
        }
        for cap in [2, 8, 64] {
            let palette = extract_palette(&buffer, cap).unwrap();
            assert_eq!(
                palette,
                vec![Color::new(12, 80, 200), Color::new(240, 200, 20)],
                "cap {cap}"
            );
        }
    }

    /// If this breaks, it means: extracted palettes stopped feeding cleanly
    /// into palette-mode diffusion.
    #[test]
    fn test_extracted_palette_drives_diffusion() {
        let buffer = scene(40, 30);
        let palette = extract_palette(&buffer, 6).unwrap();
        let params = DitherParams::new(DitherAlgorithm::Sierra).palette(palette.clone());
        let out = run(&buffer, &params).unwrap();
        assert!(out
            .bytes()
            .chunks_exact(4)
            .all(|p| palette.contains(&Color::new(p[0], p[1], p[2]))));
    }

    // ========================================================================
    // Upscale and tiling
    // ========================================================================

    /// If this breaks, it means: export upscaling started interpolating and
    /// smears the dither pattern instead of repeating it as solid blocks.
    #[test]
    fn test_integer_upscale_makes_solid_blocks() {
        let dithered = run(&scene(9, 6), &DitherParams::new(DitherAlgorithm::Atkinson)).unwrap();
        for k in [1u32, 2, 5] {
            let up = upscale_nearest(&dithered, 9 * k, 6 * k);
            for y in 0..6 * k {
                for x in 0..9 * k {
                    assert_eq!(up.pixel(x, y), dithered.pixel(x / k, y / k));
                }
            }
        }
    }

    /// If this breaks, it means: a strategy that claims to be tile-safe
    /// produces seams when run tile by tile.
    #[test]
    fn test_tile_safe_strategies_match_whole_buffer() {
        let buffer = scene(150, 90);
        let tile = 64;
        let plan = TilePlan::with_tile_size(150, 90, tile);
        for algorithm in DitherAlgorithm::ALL {
            let params = params_for(algorithm).halftone_cell(8);
            if !algorithm.is_tile_safe(&params, tile) {
                continue;
            }
            let whole = algorithm.run(&buffer, &params).unwrap();
            let mut stitched = buffer.clone();
            for t in plan.tiles() {
                let part = algorithm.run(&buffer.crop(&t), &params).unwrap();
                stitched.blit(&t, &part).unwrap();
            }
            assert_eq!(stitched, whole, "{algorithm} is not tile-safe at {tile}");
        }
    }

    // ========================================================================
    // Tone
    // ========================================================================

    /// If this breaks, it means: the neutral short-circuit stopped working or
    /// tone adjustment started touching alpha.
    #[test]
    fn test_tone_neutral_and_alpha() {
        let original = scene(12, 12);
        let mut neutral = original.clone();
        ToneAdjustment::default().apply(&mut neutral);
        assert_eq!(neutral, original);

        let mut adjusted = original.clone();
        ToneAdjustment::new()
            .contrast(40.0)
            .gamma(0.8)
            .highlights(50.0)
            .apply(&mut adjusted);
        for (a, b) in adjusted.bytes().chunks_exact(4).zip(original.bytes().chunks_exact(4)) {
            assert_eq!(a[3], b[3]);
        }
    }
}
