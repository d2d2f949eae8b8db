use alloc::string::String;
use alloc::vec::Vec;

use crate::{Kind, RuntimeError, Scalar};

// -----------------------------------------------------------------------------
// GuestRuntime

/// The capabilities a guest module must provide for handles to work on it.
///
/// Only the four raw primitives are required; the typed and string helpers
/// are built on top of them and may be overridden when the runtime can do
/// better (e.g. scanning a memory slice directly).
///
/// Methods take `&self`. Implementations are expected to use interior
/// mutability and to be driven from a single thread.
pub trait GuestRuntime {
    /// Reserve `size` bytes and return their address. Must never return 0.
    fn allocate(&self, size: usize) -> Result<u32, RuntimeError>;

    /// Free a block previously returned by [`allocate`](Self::allocate).
    fn release(&self, address: u32);

    /// Fill `buf` from guest memory starting at `address`.
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> Result<(), RuntimeError>;

    /// Copy `bytes` into guest memory starting at `address`.
    fn write_bytes(&self, address: u32, bytes: &[u8]) -> Result<(), RuntimeError>;

    /// Store `value` at its own kind's width.
    fn write_typed(&self, address: u32, value: Scalar) -> Result<(), RuntimeError> {
        let mut buf = [0; 8];
        self.write_bytes(address, value.encode(&mut buf))
    }

    /// Load one value of `kind`.
    fn read_typed(&self, address: u32, kind: Kind) -> Result<Scalar, RuntimeError> {
        let mut buf = [0; 8];
        let bytes = &mut buf[..kind.size()];
        self.read_bytes(address, bytes)?;
        Ok(Scalar::decode(kind, bytes))
    }

    /// Write `text` as UTF-8 plus a NUL terminator, using at most `max_bytes`
    /// bytes in total.
    ///
    /// Text that does not fit is cut at the last whole character; nothing is
    /// written when `max_bytes` is 0.
    fn encode_utf8(&self, text: &str, address: u32, max_bytes: usize) -> Result<(), RuntimeError> {
        if max_bytes == 0 {
            return Ok(());
        }
        let mut end = text.len().min(max_bytes - 1);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = Vec::with_capacity(end + 1);
        bytes.extend_from_slice(&text.as_bytes()[..end]);
        bytes.push(0);
        self.write_bytes(address, &bytes)
    }

    /// Read the NUL-terminated string at `address`.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`.
    fn decode_utf8(&self, address: u32) -> Result<String, RuntimeError> {
        let mut bytes = Vec::new();
        let mut cursor = address;
        loop {
            let mut byte = [0];
            self.read_bytes(cursor, &mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
            cursor = offset(cursor, 1)?;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Bytes `text` occupies once encoded, without the terminator.
    #[inline]
    fn byte_length_utf8(&self, text: &str) -> usize {
        text.len()
    }
}

/// `address + bytes`, failing instead of wrapping past the 32-bit space.
#[inline]
pub fn offset(address: u32, bytes: usize) -> Result<u32, RuntimeError> {
    u32::try_from(bytes)
        .ok()
        .and_then(|bytes| address.checked_add(bytes))
        .ok_or(RuntimeError::AccessOutOfRange { address, len: bytes })
}

#[cfg(test)]
mod tests {
    use super::{GuestRuntime, offset};
    use crate::testing::MockHeap;
    use crate::{Kind, RuntimeError, Scalar};

    #[test]
    fn typed_access() {
        let heap = MockHeap::new(64);
        let addr = heap.allocate(8).unwrap();

        heap.write_typed(addr, Scalar::I16(-300)).unwrap();
        assert_eq!(heap.read_typed(addr, Kind::I16).unwrap(), Scalar::I16(-300));
        assert_eq!(heap.byte(addr), 0xD4);
        assert_eq!(heap.byte(addr + 1), 0xFE);

        heap.write_typed(addr, Scalar::F64(0.1)).unwrap();
        assert_eq!(heap.read_typed(addr, Kind::F64).unwrap(), Scalar::F64(0.1));
    }

    #[test]
    fn utf8_encode_truncates_on_char_boundary() {
        let heap = MockHeap::new(64);
        let addr = heap.allocate(16).unwrap();

        heap.encode_utf8("héllo", addr, 16).unwrap();
        assert_eq!(heap.decode_utf8(addr).unwrap(), "héllo");

        // "h" + 2-byte "é" does not fit in 2 bytes of text.
        heap.encode_utf8("héllo", addr, 3).unwrap();
        assert_eq!(heap.decode_utf8(addr).unwrap(), "h");

        heap.write_bytes(addr, b"keep\0").unwrap();
        heap.encode_utf8("gone", addr, 0).unwrap();
        assert_eq!(heap.decode_utf8(addr).unwrap(), "keep");
    }

    #[test]
    fn decode_stops_at_first_nul() {
        let heap = MockHeap::new(64);
        let addr = heap.allocate(8).unwrap();
        heap.write_bytes(addr, b"ab\0cd\0").unwrap();
        assert_eq!(heap.decode_utf8(addr).unwrap(), "ab");
        assert_eq!(heap.byte_length_utf8("日本"), 6);
    }

    #[test]
    fn offset_overflow() {
        assert_eq!(offset(8, 4).unwrap(), 12);
        assert_eq!(
            offset(u32::MAX, 1).unwrap_err(),
            RuntimeError::AccessOutOfRange { address: u32::MAX, len: 1 }
        );
    }
}
