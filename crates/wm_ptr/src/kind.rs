use alloc::string::ToString;
use core::fmt;
use core::str::FromStr;

use crate::PtrError;

// -----------------------------------------------------------------------------
// Kind

/// The numeric encodings a guest slot can hold.
///
/// Names follow the C / Emscripten spelling (`i8` ... `i64`, `float`, `double`),
/// and every integer kind is signed.
///
/// # Examples
///
/// ```
/// use wm_ptr::Kind;
///
/// let kind: Kind = "double".parse().unwrap();
/// assert_eq!(kind, Kind::F64);
/// assert_eq!(kind.size(), 8);
/// assert!(!Kind::is_valid_name("u32"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Kind {
    /// Every supported kind, narrowest integer first.
    pub const ALL: [Kind; 6] = [
        Kind::I8,
        Kind::I16,
        Kind::I32,
        Kind::I64,
        Kind::F32,
        Kind::F64,
    ];

    /// Width of one value of this kind in guest memory.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Kind::I8 => 1,
            Kind::I16 => 2,
            Kind::I32 | Kind::F32 => 4,
            Kind::I64 | Kind::F64 => 8,
        }
    }

    /// The canonical type name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::F32 => "float",
            Kind::F64 => "double",
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Kind::F32 | Kind::F64)
    }

    /// Resolve a type name, failing with [`PtrError::UnsupportedType`] for
    /// anything outside the six known names.
    pub fn from_name(name: &str) -> Result<Kind, PtrError> {
        Self::lookup(name).ok_or_else(|| PtrError::UnsupportedType(name.to_string()))
    }

    /// Non-failing variant of [`from_name`](Self::from_name).
    #[inline]
    pub fn is_valid_name(name: &str) -> bool {
        Self::lookup(name).is_some()
    }

    fn lookup(name: &str) -> Option<Kind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = PtrError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Kind;
    use crate::{ErrorKind, PtrError};

    #[test]
    fn sizes() {
        let sizes: [usize; 6] = Kind::ALL.map(Kind::size);
        assert_eq!(sizes, [1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn names_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_name(kind.name()).unwrap(), kind);
            assert!(Kind::is_valid_name(kind.name()));
        }
    }

    #[test]
    fn unknown_name() {
        let err = Kind::from_name("u8").unwrap_err();
        assert!(matches!(&err, PtrError::UnsupportedType(name) if name == "u8"));
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(!Kind::is_valid_name(""));
        assert!(!Kind::is_valid_name("I32"));
        assert!("f32".parse::<Kind>().is_err());
    }
}
