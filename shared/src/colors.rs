/// Parse a `#RRGGBB` token into (r, g, b). Case-insensitive, leading `#` required.
pub fn parse_hex(token: &str) -> Option<(u8, u8, u8)> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// HSL lightness (0..1) of an RGB color: the midpoint of its brightest and
/// darkest channel.
pub fn lightness(r: u8, g: u8, b: u8) -> f64 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    (f64::from(max) + f64::from(min)) / (2.0 * 255.0)
}

/// Text color that stays legible on top of `fill`.
///
/// Light fills (HSL lightness above 0.6) get black text, everything else white.
/// Tokens that are not `#RRGGBB` fall back to white, which is what the map
/// draws labels in by default.
pub fn legend_text_color(fill: &str) -> &'static str {
    match parse_hex(fill) {
        Some((r, g, b)) if lightness(r, g, b) > 0.6 => "#000000",
        _ => "#FFFFFF",
    }
}

#[cfg(test)]
mod tests {
    use super::{legend_text_color, lightness, parse_hex};

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn parse_hex_accepts_both_cases() {
        assert_eq!(parse_hex("#DC143C"), Some((220, 20, 60)));
        assert_eq!(parse_hex("#dc143c"), Some((220, 20, 60)));
    }

    #[test]
    fn parse_hex_rejects_malformed_tokens() {
        assert_eq!(parse_hex("DC143C"), None);
        assert_eq!(parse_hex("#DC143"), None);
        assert_eq!(parse_hex("#NOTACOLOR"), None);
        assert_eq!(parse_hex("#GG143C"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn lightness_spans_black_to_white() {
        assert_close(lightness(0, 0, 0), 0.0);
        assert_close(lightness(255, 255, 255), 1.0);
        assert_close(lightness(255, 0, 0), 0.5);
        assert_close(lightness(128, 128, 128), 128.0 / 255.0);
        assert_close(lightness(220, 20, 60), 120.0 / 255.0);
    }

    #[test]
    fn legend_text_color_contrasts_with_fill() {
        assert_eq!(legend_text_color("#FFD700"), "#FFFFFF");
        assert_eq!(legend_text_color("#F0F0F0"), "#000000");
        assert_eq!(legend_text_color("#DC143C"), "#FFFFFF");
        assert_eq!(legend_text_color("not-a-color"), "#FFFFFF");
    }
}
