//! Property-based tests for pixel statistics
//!
//! Checks the counting invariants of `PixelStats` over arbitrary grayscale
//! rasters and white levels.

use image::{DynamicImage, GrayImage, Luma, LumaA};
use pagefix::{PixelStats, WhiteLevels};
use proptest::prelude::*;

// Strategy for small grayscale rasters
prop_compose! {
    fn gray_strategy()(
        width in 1u32..24,
        height in 1u32..24,
    )(
        samples in prop::collection::vec(any::<u8>(), (width * height) as usize),
        width in Just(width),
        height in Just(height),
    ) -> GrayImage {
        GrayImage::from_raw(width, height, samples).unwrap()
    }
}

// Strategy for valid white levels (near <= exact)
prop_compose! {
    fn levels_strategy()(exact in any::<u8>())(
        near in 0..=exact,
        exact in Just(exact),
    ) -> WhiteLevels {
        WhiteLevels::new(exact, near)
    }
}

proptest! {
    #[test]
    fn test_counts_never_exceed_total(image in gray_strategy(), levels in levels_strategy()) {
        let stats = PixelStats::from_gray(&image, levels);

        prop_assert_eq!(stats.total, u64::from(image.width() * image.height()));
        prop_assert!(stats.exact_white <= stats.total);
        prop_assert!(stats.near_white <= stats.total);
        prop_assert!((0.0..=1.0).contains(&stats.white_ratio()));
    }

    #[test]
    fn test_exact_white_is_also_near_white(image in gray_strategy(), levels in levels_strategy()) {
        let stats = PixelStats::from_gray(&image, levels);
        prop_assert!(stats.exact_white <= stats.near_white);
        prop_assert_eq!(stats.white_count(), stats.near_white);
    }

    #[test]
    fn test_lowering_near_level_never_lowers_ratio(
        image in gray_strategy(),
        near in 0u8..=250,
    ) {
        let strict = PixelStats::from_gray(&image, WhiteLevels::new(255, 250));
        let lenient = PixelStats::from_gray(&image, WhiteLevels::new(255, near));
        prop_assert!(lenient.white_ratio() >= strict.white_ratio());
    }

    #[test]
    fn test_alpha_channel_is_ignored(image in gray_strategy(), alpha in any::<u8>()) {
        let with_alpha = image::ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            let Luma([value]) = *image.get_pixel(x, y);
            LumaA([value, alpha])
        });

        let levels = WhiteLevels::default();
        let plain = PixelStats::from_gray(&image, levels);
        let translucent = PixelStats::from_image(&DynamicImage::ImageLumaA8(with_alpha), levels);
        prop_assert_eq!(plain, translucent);
    }
}
