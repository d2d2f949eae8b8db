//! Conversions between host booleans / characters and their one-byte C form.
//!
//! Characters are Latin-1: a byte `b` is the code point `U+00bb`, so only
//! code points `0..=255` fit in a C `char`.

use crate::{Kind, PtrError};

/// `true` is stored as 1, `false` as 0.
#[inline]
pub const fn bool_to_byte(value: bool) -> u8 {
    value as u8
}

/// Only the zero byte is `false`.
///
/// Any other byte, not just 1, decodes to `true`, which mirrors how C judges
/// truthiness.
#[inline]
pub const fn byte_to_bool(byte: u8) -> bool {
    byte != 0
}

/// Encode a character as its single byte code.
///
/// # Examples
///
/// ```
/// use wm_ptr::convert;
///
/// assert_eq!(convert::char_to_byte('A').unwrap(), 65);
/// assert_eq!(convert::char_to_byte('é').unwrap(), 0xE9);
/// assert!(convert::char_to_byte('€').is_err());
/// ```
#[inline]
pub fn char_to_byte(ch: char) -> Result<u8, PtrError> {
    let code = ch as u32;
    u8::try_from(code).map_err(|_| PtrError::CodeOutOfRange(code))
}

/// Encode a one-character string as its single byte code.
///
/// Fails with [`PtrError::NotOneChar`] unless `text` holds exactly one
/// character, then with [`PtrError::CodeOutOfRange`] if that character does
/// not fit in a byte.
pub fn str_to_byte(text: &str) -> Result<u8, PtrError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => char_to_byte(ch),
        _ => Err(PtrError::NotOneChar(text.chars().count())),
    }
}

/// Decode a byte code, given as a wider integer, to a character.
///
/// ```
/// use wm_ptr::convert;
///
/// assert_eq!(convert::byte_to_char(97).unwrap(), 'a');
/// assert!(convert::byte_to_char(256).is_err());
/// ```
#[inline]
pub fn byte_to_char(code: u32) -> Result<char, PtrError> {
    u8::try_from(code)
        .map(char::from)
        .map_err(|_| PtrError::CodeOutOfRange(code))
}

/// Byte width of a kind given by name.
#[inline]
pub fn size_of(name: &str) -> Result<usize, PtrError> {
    Kind::from_name(name).map(Kind::size)
}

#[inline]
pub fn is_valid_type(name: &str) -> bool {
    Kind::is_valid_name(name)
}
