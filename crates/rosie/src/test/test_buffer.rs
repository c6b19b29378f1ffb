use crate::rosie_buffer::ByteBuffer;

#[test]
fn test_buffer_keeps_embedded_nul() {
    let buffer = ByteBuffer::copy_from(b"ab\0cd").unwrap();
    assert_eq!(buffer.len(), 5);
    assert_eq!(buffer.as_bytes(), b"ab\0cd");
    assert_eq!(buffer.to_string_lossy(), "ab\0cd");
}

#[test]
fn test_buffer_conversions() {
    let from_string = ByteBuffer::try_from(String::from("héllo")).unwrap();
    let from_vec = ByteBuffer::try_from("héllo".as_bytes().to_vec()).unwrap();
    assert_eq!(from_string, from_vec);
    assert_eq!(from_string.len(), 6);
    assert_eq!(from_vec.into_vec(), "héllo".as_bytes());

    let empty = ByteBuffer::new();
    assert!(empty.is_empty());
    assert_eq!(empty, ByteBuffer::default());
}

#[test]
fn test_buffer_lossy_view() {
    let buffer = ByteBuffer::copy_from(&[b'a', 0xff, b'b']).unwrap();
    assert_eq!(buffer.to_string_lossy(), "a\u{fffd}b");
    assert!(format!("{buffer:?}").contains("len: 3"));
}
