//! End-to-end handle lifecycles on a [`LinearHeap`], with the guest's C
//! functions played by plain Rust closures over the heap.

use alloc::string::ToString;
use alloc::vec::Vec;

use wm_ptr::{
    ArrayHandle, CharHandle, ErrorKind, FlagHandle, GuestRuntime, Handle, Kind, PtrError, Scalar,
    ScalarHandle, TextHandle,
};

use crate::{HeapConfig, LinearHeap};

fn heap() -> LinearHeap {
    LinearHeap::new(HeapConfig {
        size: 4096,
        poison: Some(0x5A),
        ..HeapConfig::default()
    })
}

/// `void modify_<kind>_array(T *arr, int size)`: doubles each element.
fn double_array(heap: &LinearHeap, address: u32, kind: Kind, len: usize) {
    for index in 0..len {
        let at = address + (index * kind.size()) as u32;
        let doubled = match heap.read_typed(at, kind).unwrap() {
            Scalar::I8(v) => Scalar::I8(v.wrapping_mul(2)),
            Scalar::I16(v) => Scalar::I16(v.wrapping_mul(2)),
            Scalar::I32(v) => Scalar::I32(v.wrapping_mul(2)),
            Scalar::I64(v) => Scalar::I64(v.wrapping_mul(2)),
            Scalar::F32(v) => Scalar::F32(v * 2.0),
            Scalar::F64(v) => Scalar::F64(v * 2.0),
        };
        heap.write_typed(at, doubled).unwrap();
    }
}

/// `void modify_string(char *str)` with a caller-chosen suffix.
fn strcat(heap: &LinearHeap, address: u32, suffix: &str) {
    let current = heap.decode_utf8(address).unwrap();
    let end = address + current.len() as u32;
    let mut bytes = suffix.as_bytes().to_vec();
    bytes.push(0);
    heap.write_bytes(end, &bytes).unwrap();
}

#[test]
fn i32_array_doubled_by_guest() {
    let heap = heap();
    let mut array = ArrayHandle::from_values(&heap, Kind::I32, 3, &[1, 2, 3]).unwrap();

    double_array(&heap, array.address(), Kind::I32, array.len());

    assert_eq!(
        array.read_then_release().unwrap(),
        [Scalar::I32(2), Scalar::I32(4), Scalar::I32(6)]
    );
    assert!(!array.is_valid());
    assert_eq!(heap.live_allocations(), 0);
}

#[test]
fn every_kind_doubled_in_place() {
    let heap = heap();
    let cases: [(Kind, [Scalar; 2]); 6] = [
        (Kind::I8, [Scalar::I8(-3), Scalar::I8(100)]),
        (Kind::I16, [Scalar::I16(-300), Scalar::I16(1000)]),
        (Kind::I32, [Scalar::I32(-70_000), Scalar::I32(5)]),
        (Kind::I64, [Scalar::I64(1 << 55), Scalar::I64(-1)]),
        (Kind::F32, [Scalar::F32(1.25), Scalar::F32(-0.5)]),
        (Kind::F64, [Scalar::F64(1e-3), Scalar::F64(4.0)]),
    ];

    for (kind, values) in cases {
        let mut array = ArrayHandle::from_values(&heap, kind, 2, &values).unwrap();
        double_array(&heap, array.address(), kind, 2);
        let doubled = array.read_then_release().unwrap();
        assert_eq!(doubled.len(), 2);
        assert_ne!(doubled, values, "{kind} array was not modified");
    }
    assert_eq!(heap.live_allocations(), 0);
}

#[test]
fn string_appended_by_guest() {
    let heap = heap();
    let mut text = TextHandle::from_text(&heap, 20, "Hi").unwrap();

    strcat(&heap, text.address(), " there");

    assert_eq!(text.read_then_release().unwrap(), "Hi there");
    assert_eq!(heap.live_allocations(), 0);
}

#[test]
fn narrow_array_add_out_of_bounds() {
    let heap = heap();
    let mut array = ArrayHandle::allocate(&heap, Kind::I8, 2).unwrap();

    let err = array.add(2, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    let msg = err.to_string();
    assert!(msg.contains("index 2"), "{msg}");
    assert!(msg.contains("length 2"), "{msg}");

    // Untouched: still the poison pattern.
    assert_eq!(array.read().unwrap(), [Scalar::I8(0x5A), Scalar::I8(0x5A)]);
    array.release();
}

#[test]
fn prefix_write_leaves_tail() {
    let heap = heap();
    let mut array = ArrayHandle::from_values(&heap, Kind::I16, 4, &[1i16, 2]).unwrap();
    let values = array.read().unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values[..2], [Scalar::I16(1), Scalar::I16(2)]);
    assert_eq!(values[2], Scalar::I16(0x5A5A));

    assert_eq!(
        array.write(&[0i16; 5]).unwrap_err(),
        PtrError::LengthMismatch { capacity: 4, len: 5 }
    );
    assert_eq!(array.read().unwrap(), values);
    array.release();
}

#[test]
fn scalar_pointers() {
    let heap = heap();

    let mut value = ScalarHandle::from_value(&heap, Kind::F64, 0.75).unwrap();
    double_array(&heap, value.address(), Kind::F64, 1);
    assert_eq!(value.read_then_release().unwrap(), Scalar::F64(1.5));

    let mut wide = ScalarHandle::from_value(&heap, Kind::I64, i64::MAX / 2).unwrap();
    double_array(&heap, wide.address(), Kind::I64, 1);
    assert_eq!(wide.read_then_release().unwrap(), Scalar::I64(i64::MAX - 1));
}

#[test]
fn char_and_flag_pointers() {
    let heap = heap();

    let mut ch = CharHandle::from_text(&heap, "a").unwrap();
    let mut byte = [0];
    heap.read_bytes(ch.address(), &mut byte).unwrap();
    heap.write_bytes(ch.address(), &[byte[0] + 1]).unwrap();
    assert_eq!(ch.read_then_release().unwrap(), 'b');

    // Allocation is poisoned, yet a bare flag starts out false.
    let mut flag = FlagHandle::allocate(&heap).unwrap();
    assert!(!flag.read().unwrap());
    heap.write_bytes(flag.address(), &[2]).unwrap();
    assert!(flag.read_then_release().unwrap());
}

#[test]
fn released_blocks_are_recycled() {
    let heap = heap();
    let mut first = ScalarHandle::from_value(&heap, Kind::I32, 7).unwrap();
    let address = first.address();
    first.release();
    first.release();
    assert_eq!(heap.live_allocations(), 0);

    let mut second = ArrayHandle::allocate(&heap, Kind::I8, 4).unwrap();
    assert_eq!(second.address(), address);
    assert_eq!(first.read().unwrap_err(), PtrError::InvalidPointer);
    second.release();
}

#[test]
fn handles_over_a_trait_object() {
    let heap = heap();
    let runtime: &dyn GuestRuntime = &heap;

    let mut handles: Vec<_> = ["a", "bb", "ccc"]
        .into_iter()
        .map(|text| TextHandle::from_text(runtime, 4, text).unwrap())
        .collect();
    assert_eq!(heap.live_allocations(), 3);

    let texts: Vec<_> = handles
        .iter_mut()
        .map(|handle| handle.read_then_release().unwrap())
        .collect();
    assert_eq!(texts, ["a", "bb", "ccc"]);
    assert_eq!(heap.live_allocations(), 0);
}

#[test]
fn dropped_handle_leaks_instead_of_freeing() {
    let heap = heap();
    drop(FlagHandle::from_bool(&heap, true).unwrap());
    assert_eq!(heap.live_allocations(), 1);

    let address = CharHandle::from_char(&heap, 'x').unwrap().into_address();
    assert!(heap.is_live(address));

    let mut adopted = CharHandle::from_address(&heap, address).unwrap();
    assert_eq!(adopted.read_then_release().unwrap(), 'x');
    assert!(!heap.is_live(address));
}
