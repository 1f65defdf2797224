use serde::Serialize;

/// A canonical resolution class and its quality weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionTier {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub score: f64,
}

/// Ascending in both dimensions
pub const RESOLUTION_TIERS: [ResolutionTier; 8] = [
    ResolutionTier { label: "240p", width: 426, height: 240, score: 0.1 },
    ResolutionTier { label: "360p", width: 640, height: 360, score: 0.2 },
    ResolutionTier { label: "480p", width: 854, height: 480, score: 0.3 },
    ResolutionTier { label: "720p", width: 1280, height: 720, score: 0.5 },
    ResolutionTier { label: "1080p", width: 1920, height: 1080, score: 0.7 },
    ResolutionTier { label: "1440p", width: 2560, height: 1440, score: 0.8 },
    ResolutionTier { label: "4K", width: 3840, height: 2160, score: 0.9 },
    ResolutionTier { label: "8K", width: 7680, height: 4320, score: 1.0 },
];

/// Ceiling lookup: index of the smallest tier whose bound contains `value`.
/// Values beyond the largest tier land on the last one.
fn ceiling_index(value: u32, bound: impl Fn(&ResolutionTier) -> u32) -> usize {
    RESOLUTION_TIERS
        .iter()
        .position(|tier| value <= bound(tier))
        .unwrap_or(RESOLUTION_TIERS.len() - 1)
}

/// Resolve width and height independently, then meet in the middle (rounding down)
pub fn tier_index(width: u32, height: u32) -> usize {
    let by_width = ceiling_index(width, |t| t.width);
    let by_height = ceiling_index(height, |t| t.height);
    (by_width + by_height) / 2
}

pub fn tier_for(width: u32, height: u32) -> &'static ResolutionTier {
    &RESOLUTION_TIERS[tier_index(width, height)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_ascending() {
        for pair in RESOLUTION_TIERS.windows(2) {
            assert!(pair[0].width < pair[1].width);
            assert!(pair[0].height < pair[1].height);
            assert!(pair[0].score < pair[1].score);
        }
        assert_eq!(RESOLUTION_TIERS[0].score, 0.1);
        assert_eq!(RESOLUTION_TIERS[7].score, 1.0);
    }

    #[test]
    fn test_zero_dimensions_pick_lowest_tier() {
        assert_eq!(tier_index(0, 0), 0);
        assert_eq!(tier_for(0, 0).label, "240p");
    }

    #[test]
    fn test_exact_bound_selects_that_tier() {
        assert_eq!(tier_index(1280, 720), 3);
        assert_eq!(tier_for(1280, 720).score, 0.5);
        assert_eq!(tier_index(1920, 1080), 4);
    }

    #[test]
    fn test_one_pixel_over_moves_up() {
        assert_eq!(tier_index(1281, 721), 4);
    }

    #[test]
    fn test_oversized_clamps_to_last_tier() {
        assert_eq!(tier_index(10_000, 10_000), 7);
        assert_eq!(tier_for(15_360, 8_640).label, "8K");
    }

    #[test]
    fn test_unusual_aspect_ratio_averages_down() {
        // Ultra-wide 2560x1080: width -> 1440p (5), height -> 1080p (4), floor(9/2) = 4
        assert_eq!(tier_index(2560, 1080), 4);
        // Portrait 720x1280: width -> 480p (2), height -> 1440p (5)
        assert_eq!(tier_index(720, 1280), 3);
        // 1920x240: width 4, height 0 -> 2
        assert_eq!(tier_index(1920, 240), 2);
    }
}
