//! Literal inputs shared by every catalog scenario.
//!
//! Both scenarios insert exactly these values so a read-back can be compared
//! value for value.

pub const MIN_TINY: i64 = i8::MIN as i64;
pub const MAX_TINY: i64 = i8::MAX as i64;
pub const MIN_SMALL: i64 = i16::MIN as i64;
pub const MAX_SMALL: i64 = i16::MAX as i64;
pub const MIN_INT: i64 = i32::MIN as i64;
pub const MAX_INT: i64 = i32::MAX as i64;
pub const MIN_BIG: i64 = i64::MIN;
pub const MAX_BIG: i64 = i64::MAX;

/// Latin letters with diacritics.
pub const ACCENTS: &str = "ÅÁÀÂÄÉÈÊËÍÌÎÏÓÒÔÖÚÙÛÜÇåáàâäéèêëíìîïóòôöúùûüçõã";

/// ASCII punctuation, without the single quote.
pub const SYMBOLS: &str = r#"~`!@#$%^&*()_-+={}[]\|:;"<>,./?"#;

/// Typographic and multi-script characters.
pub const SPECIALS: &str = r#"`¡™£¢∞§¶•ªº–≠œ∑´®†\¨ˆøπ“‘«åß∂ƒ©˙∆˚¬…æΩ≈ç√∫˜µ≤≥÷`⁄€‹›ﬁﬂ‡°·‚—±Œ„´‰ˇÁ¨ˆØ∏”’»ÅÍÎÏ˝ÓÔÒÚÆ¸˛Ç◊ı˜Â¯˘¿"#;

/// Payload written to VARBINARY columns.
pub const BINARY_PAYLOAD: &[u8] = b"eh?";

/// Literal inserted into REAL columns.
pub const REAL_LITERAL: &str = "0.14285714285714286";
/// Literal inserted into DOUBLE columns.
pub const DOUBLE_LITERAL: &str = "0.14285714285714285714";
/// Negative literal used for both REAL and DOUBLE in the maximum row.
pub const NEGATIVE_FRACTION_LITERAL: &str = "-.14285714285714285714";

pub const DECIMAL_LITERAL: &str = "3.14";
pub const NEGATIVE_DECIMAL_LITERAL: &str = "-3.14";

/// Every character of each inclusive range, in order.
pub fn char_range(ranges: &[(char, char)]) -> String {
    ranges.iter().flat_map(|&(from, to)| from..=to).collect()
}

/// `A-Z`, `a-z` then `0-9`.
pub fn alphanumerics() -> String {
    char_range(&[('A', 'Z'), ('a', 'z'), ('0', '9')])
}
