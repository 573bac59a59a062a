//! Standard vs oversized size tier.

use super::entities::ProductDimensions;
use super::schedule::SizeLimits;

/// A package is oversized as soon as any single limit is exceeded.
pub fn is_oversized(dimensions: &ProductDimensions, limits: &SizeLimits) -> bool {
    dimensions.weight > limits.max_weight
        || dimensions.length > limits.max_length
        || dimensions.width > limits.max_width
        || dimensions.height > limits.max_height
        || dimensions.volume() > limits.max_volume
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: SizeLimits = SizeLimits {
        max_weight: 20.0,
        max_length: 18.0,
        max_width: 14.0,
        max_height: 8.0,
        max_volume: 1728.0,
    };

    #[test]
    fn small_package_is_standard() {
        let dims = ProductDimensions::new(6.0, 4.0, 3.0, 0.5);
        assert!(!is_oversized(&dims, &LIMITS));
    }

    #[test]
    fn limits_are_exclusive() {
        let dims = ProductDimensions::new(18.0, 12.0, 8.0, 20.0);
        assert!(!is_oversized(&dims, &LIMITS));
    }

    #[test]
    fn any_single_breach_is_oversized() {
        let base = ProductDimensions::new(10.0, 10.0, 5.0, 2.0);
        let breaches = [
            ProductDimensions { weight: 20.5, ..base },
            ProductDimensions { length: 18.5, ..base },
            ProductDimensions { width: 14.5, ..base },
            ProductDimensions { height: 8.5, ..base },
        ];
        for dims in breaches {
            assert!(is_oversized(&dims, &LIMITS), "{dims:?}");
        }
    }

    #[test]
    fn volume_alone_can_breach() {
        // 18 x 14 x 7 stays inside every edge limit but is 1764 in³.
        let dims = ProductDimensions::new(18.0, 14.0, 7.0, 5.0);
        assert!(is_oversized(&dims, &LIMITS));
    }

    #[test]
    fn classification_is_monotonic() {
        let steps = [0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0];
        let base = ProductDimensions::new(6.0, 4.0, 3.0, 0.5);
        let grow: [fn(ProductDimensions, f64) -> ProductDimensions; 4] = [
            |d, s| ProductDimensions { length: d.length + s, ..d },
            |d, s| ProductDimensions { width: d.width + s, ..d },
            |d, s| ProductDimensions { height: d.height + s, ..d },
            |d, s| ProductDimensions { weight: d.weight + s, ..d },
        ];
        for grow in grow {
            let mut seen_oversized = false;
            for step in steps {
                let oversized = is_oversized(&grow(base, step), &LIMITS);
                assert!(!(seen_oversized && !oversized));
                seen_oversized |= oversized;
            }
            assert!(seen_oversized);
        }
    }
}
