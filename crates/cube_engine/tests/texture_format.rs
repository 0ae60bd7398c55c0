use cube_engine::assets::texture::{
    check_compatible, TextureError, HEADER_SIZE, PIXEL_FORMAT_RGB, PIXEL_FORMAT_RGBA, PIXEL_TYPE_UNSIGNED_BYTE,
};
use cube_engine::assets::TextureData;

fn tex(width: u32, height: u32, format: u32, pixel_type: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
    for field in [width, height, format, pixel_type] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(data);
    bytes
}

#[test]
fn rgb_expands_to_opaque_rgba() {
    let rgb = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120];
    let texture = TextureData::parse(&tex(2, 2, PIXEL_FORMAT_RGB, PIXEL_TYPE_UNSIGNED_BYTE, &rgb)).unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 2));
    assert_eq!(texture.size_bytes(), 16);
    for (pixel, source) in texture.pixels.chunks_exact(4).zip(rgb.chunks_exact(3)) {
        assert_eq!(&pixel[..3], source);
        assert_eq!(pixel[3], 255);
    }
}

#[test]
fn rejects_non_byte_pixels() {
    let result = TextureData::parse(&tex(1, 1, PIXEL_FORMAT_RGBA, 0x1406, &[0; 16]));
    assert!(matches!(result, Err(TextureError::UnsupportedType(0x1406))));
}

#[test]
fn encoded_file_parses_back() {
    let rgb = [1, 2, 3];
    let original = TextureData::parse(&tex(1, 1, PIXEL_FORMAT_RGB, PIXEL_TYPE_UNSIGNED_BYTE, &rgb)).unwrap();
    let reparsed = TextureData::parse(&original.encode()).unwrap();

    assert_eq!(reparsed.pixels, vec![1, 2, 3, 255]);
    assert_eq!(reparsed.header.format, PIXEL_FORMAT_RGBA);
}

#[test]
fn diffuse_and_normal_must_match() {
    let small = TextureData::parse(&tex(1, 1, PIXEL_FORMAT_RGBA, PIXEL_TYPE_UNSIGNED_BYTE, &[0; 4])).unwrap();
    let wide = TextureData::parse(&tex(2, 1, PIXEL_FORMAT_RGBA, PIXEL_TYPE_UNSIGNED_BYTE, &[0; 8])).unwrap();

    assert!(check_compatible(&small, &small.clone()).is_ok());
    assert!(matches!(check_compatible(&small, &wide), Err(TextureError::Incompatible)));
}

#[test]
fn oversized_header_is_rejected() {
    let result = TextureData::parse(&tex(u32::MAX, u32::MAX, PIXEL_FORMAT_RGBA, PIXEL_TYPE_UNSIGNED_BYTE, &[]));
    assert!(matches!(
        result,
        Err(TextureError::InvalidDimensions {
            width: u32::MAX,
            height: u32::MAX
        })
    ));
}

#[test]
fn zero_sized_texture_is_rejected() {
    let result = TextureData::parse(&tex(0, 4, PIXEL_FORMAT_RGB, PIXEL_TYPE_UNSIGNED_BYTE, &[]));
    assert!(matches!(result, Err(TextureError::InvalidDimensions { width: 0, height: 4 })));
}
