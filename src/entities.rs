//!
//! Latin-1 supplement (0xA1..=0xFF) to HTML named-entity translation, used by the
//! assembler when `eight_bit_clean` is false. A simple immutable codepoint table,
//! per the Design Notes' "global process-wide state" guidance: no runtime mutation,
//! just a perfect-hash lookup.

use phf::phf_map;

pub static LATIN1_ENTITIES: phf::Map<u8, &'static str> = phf_map! {
    0xA1u8 => "iexcl",
    0xA2u8 => "cent",
    0xA3u8 => "pound",
    0xA4u8 => "curren",
    0xA5u8 => "yen",
    0xA6u8 => "brvbar",
    0xA7u8 => "sect",
    0xA8u8 => "uml",
    0xA9u8 => "copy",
    0xAAu8 => "ordf",
    0xABu8 => "laquo",
    0xACu8 => "not",
    0xADu8 => "shy",
    0xAEu8 => "reg",
    0xAFu8 => "macr",
    0xB0u8 => "deg",
    0xB1u8 => "plusmn",
    0xB2u8 => "sup2",
    0xB3u8 => "sup3",
    0xB4u8 => "acute",
    0xB5u8 => "micro",
    0xB6u8 => "para",
    0xB7u8 => "middot",
    0xB8u8 => "cedil",
    0xB9u8 => "sup1",
    0xBAu8 => "ordm",
    0xBBu8 => "raquo",
    0xBCu8 => "frac14",
    0xBDu8 => "frac12",
    0xBEu8 => "frac34",
    0xBFu8 => "iquest",
    0xC0u8 => "Agrave",
    0xC1u8 => "Aacute",
    0xC2u8 => "Acirc",
    0xC3u8 => "Atilde",
    0xC4u8 => "Auml",
    0xC5u8 => "Aring",
    0xC6u8 => "AElig",
    0xC7u8 => "Ccedil",
    0xC8u8 => "Egrave",
    0xC9u8 => "Eacute",
    0xCAu8 => "Ecirc",
    0xCBu8 => "Euml",
    0xCCu8 => "Igrave",
    0xCDu8 => "Iacute",
    0xCEu8 => "Icirc",
    0xCFu8 => "Iuml",
    0xD0u8 => "ETH",
    0xD1u8 => "Ntilde",
    0xD2u8 => "Ograve",
    0xD3u8 => "Oacute",
    0xD4u8 => "Ocirc",
    0xD5u8 => "Otilde",
    0xD6u8 => "Ouml",
    0xD7u8 => "times",
    0xD8u8 => "Oslash",
    0xD9u8 => "Ugrave",
    0xDAu8 => "Uacute",
    0xDBu8 => "Ucirc",
    0xDCu8 => "Uuml",
    0xDDu8 => "Yacute",
    0xDEu8 => "THORN",
    0xDFu8 => "szlig",
    0xE0u8 => "agrave",
    0xE1u8 => "aacute",
    0xE2u8 => "acirc",
    0xE3u8 => "atilde",
    0xE4u8 => "auml",
    0xE5u8 => "aring",
    0xE6u8 => "aelig",
    0xE7u8 => "ccedil",
    0xE8u8 => "egrave",
    0xE9u8 => "eacute",
    0xEAu8 => "ecirc",
    0xEBu8 => "euml",
    0xECu8 => "igrave",
    0xEDu8 => "iacute",
    0xEEu8 => "icirc",
    0xEFu8 => "iuml",
    0xF0u8 => "eth",
    0xF1u8 => "ntilde",
    0xF2u8 => "ograve",
    0xF3u8 => "oacute",
    0xF4u8 => "ocirc",
    0xF5u8 => "otilde",
    0xF6u8 => "ouml",
    0xF7u8 => "divide",
    0xF8u8 => "oslash",
    0xF9u8 => "ugrave",
    0xFAu8 => "uacute",
    0xFBu8 => "ucirc",
    0xFCu8 => "uuml",
    0xFDu8 => "yacute",
    0xFEu8 => "thorn",
    0xFFu8 => "yuml",
};

/// Rewrites each Latin-1 supplement byte in `text` (interpreted as Latin-1, one byte
/// per codepoint) to its HTML named entity. Bytes outside 0xA1..=0xFF, and any byte
/// with no table entry, pass through unchanged.
pub fn encode_latin1_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let cp = ch as u32;
        if (0xA1..=0xFF).contains(&cp)
            && let Some(name) = LATIN1_ENTITIES.get(&(cp as u8))
        {
            out.push('&');
            out.push_str(name);
            out.push(';');
        } else {
            out.push(ch);
        }
    }
    out
}
