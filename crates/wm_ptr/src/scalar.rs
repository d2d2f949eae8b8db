use crate::{Kind, PtrError};

// -----------------------------------------------------------------------------
// Scalar

/// One value of one [`Kind`].
///
/// `I64` carries a full `i64`, so wide values never lose precision on the way
/// through the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// The kind this value is tagged with.
    #[inline]
    pub const fn kind(self) -> Kind {
        match self {
            Scalar::I8(_) => Kind::I8,
            Scalar::I16(_) => Kind::I16,
            Scalar::I32(_) => Kind::I32,
            Scalar::I64(_) => Kind::I64,
            Scalar::F32(_) => Kind::F32,
            Scalar::F64(_) => Kind::F64,
        }
    }

    /// Convert to `kind` the way a C assignment would.
    ///
    /// Integers wrap when narrowed and floats truncate (saturating) into
    /// integer slots. A float can not be stored into an `i64` slot; wide
    /// values must come from an integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use wm_ptr::{Kind, Scalar};
    ///
    /// assert_eq!(Scalar::I32(300).cast(Kind::I8).unwrap(), Scalar::I8(44));
    /// assert_eq!(Scalar::I8(-3).cast(Kind::F64).unwrap(), Scalar::F64(-3.0));
    /// assert!(Scalar::F64(1.5).cast(Kind::I64).is_err());
    /// ```
    pub fn cast(self, kind: Kind) -> Result<Scalar, PtrError> {
        if self.kind() == kind {
            return Ok(self);
        }

        let value = match (self, kind) {
            (Scalar::F32(_) | Scalar::F64(_), Kind::I64) => {
                return Err(PtrError::KindMismatch { kind, value: self });
            }
            (Scalar::F32(v), Kind::F64) => Scalar::F64(v as f64),
            (Scalar::F64(v), Kind::F32) => Scalar::F32(v as f32),
            (Scalar::F32(v), _) => Self::from_float(v as f64, kind),
            (Scalar::F64(v), _) => Self::from_float(v, kind),
            (int, _) => Self::from_int(int.widen(), kind),
        };
        Ok(value)
    }

    /// Sign-extends any integer variant.
    #[inline]
    fn widen(self) -> i64 {
        match self {
            Scalar::I8(v) => v as i64,
            Scalar::I16(v) => v as i64,
            Scalar::I32(v) => v as i64,
            Scalar::I64(v) => v,
            Scalar::F32(v) => v as i64,
            Scalar::F64(v) => v as i64,
        }
    }

    fn from_int(v: i64, kind: Kind) -> Scalar {
        match kind {
            Kind::I8 => Scalar::I8(v as i8),
            Kind::I16 => Scalar::I16(v as i16),
            Kind::I32 => Scalar::I32(v as i32),
            Kind::I64 => Scalar::I64(v),
            Kind::F32 => Scalar::F32(v as f32),
            Kind::F64 => Scalar::F64(v as f64),
        }
    }

    fn from_float(v: f64, kind: Kind) -> Scalar {
        match kind {
            Kind::I8 => Scalar::I8(v as i8),
            Kind::I16 => Scalar::I16(v as i16),
            Kind::I32 => Scalar::I32(v as i32),
            Kind::I64 => Scalar::I64(v as i64),
            Kind::F32 => Scalar::F32(v as f32),
            Kind::F64 => Scalar::F64(v),
        }
    }

    /// Little-endian encoding, written into the front of `buf`.
    pub fn encode(self, buf: &mut [u8; 8]) -> &[u8] {
        let len = self.kind().size();
        match self {
            Scalar::I8(v) => buf[..1].copy_from_slice(&v.to_le_bytes()),
            Scalar::I16(v) => buf[..2].copy_from_slice(&v.to_le_bytes()),
            Scalar::I32(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            Scalar::I64(v) => buf.copy_from_slice(&v.to_le_bytes()),
            Scalar::F32(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            Scalar::F64(v) => buf.copy_from_slice(&v.to_le_bytes()),
        }
        &buf[..len]
    }

    /// Decode a little-endian value of `kind`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `kind.size()`.
    pub fn decode(kind: Kind, bytes: &[u8]) -> Scalar {
        match kind {
            Kind::I8 => Scalar::I8(i8::from_le_bytes(take(bytes))),
            Kind::I16 => Scalar::I16(i16::from_le_bytes(take(bytes))),
            Kind::I32 => Scalar::I32(i32::from_le_bytes(take(bytes))),
            Kind::I64 => Scalar::I64(i64::from_le_bytes(take(bytes))),
            Kind::F32 => Scalar::F32(f32::from_le_bytes(take(bytes))),
            Kind::F64 => Scalar::F64(f64::from_le_bytes(take(bytes))),
        }
    }

    /// Extract the payload if this value is tagged with `T`'s kind.
    ///
    /// ```
    /// use wm_ptr::Scalar;
    ///
    /// assert_eq!(Scalar::I64(i64::MAX).get::<i64>(), Some(i64::MAX));
    /// assert_eq!(Scalar::I64(1).get::<i32>(), None);
    /// ```
    #[inline]
    pub fn get<T: Primitive>(self) -> Option<T> {
        T::from_scalar(self)
    }
}

#[inline]
fn take<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

// -----------------------------------------------------------------------------
// Primitive

/// Host types that map one-to-one onto a [`Kind`].
pub trait Primitive: Copy + Into<Scalar> {
    const KIND: Kind;

    fn from_scalar(value: Scalar) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Scalar {
            #[inline(always)]
            fn from(value: $ty) -> Self {
                Scalar::$variant(value)
            }
        }

        impl Primitive for $ty {
            const KIND: Kind = Kind::$variant;

            #[inline]
            fn from_scalar(value: Scalar) -> Option<Self> {
                match value {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_primitive!(i8, I8);
impl_primitive!(i16, I16);
impl_primitive!(i32, I32);
impl_primitive!(i64, I64);
impl_primitive!(f32, F32);
impl_primitive!(f64, F64);
