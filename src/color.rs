use std::sync::LazyLock;

use regex::Regex;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

static RGB_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*[\d.]+\s*)?\)$")
        .expect("valid regex")
});

/// `#rgb` or `#rrggbb`, any case.
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// Normalizes `rgb(r, g, b)` / `rgba(r, g, b, a)` into `#rrggbb`.
///
/// Hex input and anything unrecognized come back untouched, so the result
/// still has to go through [`is_hex_color`].
pub fn to_hex(value: &str) -> String {
    let Some(caps) = RGB_COLOR.captures(value.trim()) else {
        return value.to_string();
    };

    let channel = |i: usize| -> u8 {
        caps[i]
            .parse::<u32>()
            .map(|v| v.min(255) as u8)
            .unwrap_or(u8::MAX)
    };

    format!("#{:02x}{:02x}{:02x}", channel(1), channel(2), channel(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_long_hex() {
        assert!(is_hex_color("#FF0000"));
        assert!(is_hex_color("#00bfff"));
        assert!(is_hex_color("#abc"));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "notahex", "FF0000", "#GG0000", "#12345", "#1234567", " #112233"] {
            assert!(!is_hex_color(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn converts_rgb_notation() {
        assert_eq!(to_hex("rgb(255, 0, 0)"), "#ff0000");
        assert_eq!(to_hex("rgb(0,191,255)"), "#00bfff");
        assert_eq!(to_hex("rgba(50, 205, 50, 0.5)"), "#32cd32");
    }

    #[test]
    fn clamps_out_of_range_channels() {
        assert_eq!(to_hex("rgb(300, 0, 16)"), "#ff0010");
    }

    #[test]
    fn leaves_hex_and_unknown_input_alone() {
        assert_eq!(to_hex("#FFA500"), "#FFA500");
        assert_eq!(to_hex("orange"), "orange");
        assert_eq!(to_hex("  #112233 "), "  #112233 ");
        assert!(!is_hex_color(&to_hex("  #112233 ")));
    }
}
