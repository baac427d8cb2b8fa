/// Project colour tokens. Purely cosmetic.
use rand::RngExt;

const PALETTE: &[&str] = &[
    "hsl(210, 100%, 92%)",
    "hsl(180, 100%, 92%)",
    "hsl(150, 100%, 92%)",
    "hsl(300, 100%, 95%)",
    "hsl(330, 100%, 95%)",
    "hsl(30, 100%, 94%)",
    "hsl(50, 100%, 94%)",
];

/// Pick a pastel token from the palette.
pub fn random_pastel() -> String {
    let mut rng = rand::rng();
    PALETTE[rng.random_range(0..PALETTE.len())].to_string()
}

/// Parse an `hsl(h, s%, l%)` token into RGB bytes.
pub fn hsl_to_rgb(token: &str) -> Option<(u8, u8, u8)> {
    let inner = token.trim().strip_prefix("hsl(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let h: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    let l: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let (s, l) = (s / 100.0, l / 100.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Some((to_byte(r), to_byte(g), to_byte(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_pastel_comes_from_palette() {
        for _ in 0..20 {
            assert!(PALETTE.contains(&random_pastel().as_str()));
        }
    }

    #[test]
    fn parses_palette_tokens() {
        for token in PALETTE {
            assert!(hsl_to_rgb(token).is_some(), "{token}");
        }
        assert_eq!(hsl_to_rgb("hsl(0, 100%, 50%)"), Some((255, 0, 0)));
        assert_eq!(hsl_to_rgb("hsl(120, 100%, 50%)"), Some((0, 255, 0)));
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(hsl_to_rgb("#FF5733"), None);
        assert_eq!(hsl_to_rgb("hsl(10, 20, 30)"), None);
    }
}
