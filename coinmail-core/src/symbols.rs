//! Stylized currency glyphs used in exchange notifications.
//!
//! The exchange renders some tickers with non-ASCII look-alikes (e.g. `ΞTH`).
//! Every extraction pattern assumes ASCII tickers, so text is passed through
//! [`normalize_symbols`] before classification or matching.

/// Stylized glyph -> canonical lowercase ticker.
pub const GLYPH_TICKERS: &[(&str, &str)] = &[("XɃT", "btc"), ("ŁTC", "ltc"), ("ΞTH", "eth")];

/// Replace every stylized currency glyph with its canonical ticker.
pub fn normalize_symbols(text: &str) -> String {
    let mut out = text.to_string();
    for (glyph, ticker) in GLYPH_TICKERS {
        if out.contains(glyph) {
            out = out.replace(glyph, ticker);
        }
    }
    out
}

/// True if `text` still carries any of the stylized glyphs.
pub fn contains_stylized_glyph(text: &str) -> bool {
    GLYPH_TICKERS.iter().any(|(glyph, _)| text.contains(glyph))
}
