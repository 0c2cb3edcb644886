use imgref::ImgRef;
use qoif::{
    decode, decode_config, decode_config_with_limits, decode_with_limits, encode, encode_slice,
    Channels, ColorSpace, DecodeError, EncodeError, EncodeOptions, ErrorKind, Header, Limits,
};
use rgb::RGBA8;
use std::io::{self, Write};

const END: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

fn encode_to_vec(pixels: &[RGBA8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::new();
    encode(
        &mut out,
        ImgRef::new(pixels, width, height),
        EncodeOptions::default(),
    )
    .unwrap();
    out
}

fn header(width: u32, height: u32, channels: u8, colorspace: u8) -> Vec<u8> {
    let mut bytes = b"qoif".to_vec();
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[channels, colorspace]);
    bytes
}

#[test]
fn single_black_pixel() {
    let pixel = RGBA8::new(0, 0, 0, 255);
    let encoded = encode_to_vec(&[pixel], 1, 1);

    let mut expected = header(1, 1, 4, 0);
    expected.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0xFF]);
    expected.extend_from_slice(&END);
    assert_eq!(encoded, expected);

    let decoded = decode(&encoded[..]).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1, 1));
    assert_eq!(decoded.buf(), &[pixel]);
}

#[test]
fn identical_red_pixels_become_a_run() {
    let red = RGBA8::new(255, 0, 0, 255);
    let encoded = encode_to_vec(&[red; 3], 3, 1);

    let mut expected = header(3, 1, 4, 0);
    expected.extend_from_slice(&[0xFF, 0xFF, 0x00, 0x00, 0xFF]);
    // two repeats, stored with a bias of -1
    expected.push(0b1100_0001);
    expected.extend_from_slice(&END);
    assert_eq!(encoded, expected);

    let decoded = decode(&encoded[..]).unwrap();
    assert_eq!(decoded.buf(), &[red; 3]);
}

#[test]
fn rgb_tagged_images_start_with_an_rgb_literal() {
    let options = EncodeOptions {
        channels: Channels::Rgb,
        colorspace: ColorSpace::Srgb,
    };

    let mut encoded = Vec::new();
    encode_slice(&mut encoded, 1, 1, &[RGBA8::new(10, 20, 30, 255)], options).unwrap();

    let mut expected = header(1, 1, 3, 0);
    expected.extend_from_slice(&[0xFE, 10, 20, 30]);
    expected.extend_from_slice(&END);
    assert_eq!(encoded, expected);
    assert_eq!(decode(&encoded[..]).unwrap().buf(), &[RGBA8::new(10, 20, 30, 255)]);

    // alpha can't be dropped losslessly, so a translucent first pixel stays RGBA
    let mut encoded = Vec::new();
    encode_slice(&mut encoded, 1, 1, &[RGBA8::new(10, 20, 30, 40)], options).unwrap();
    assert_eq!(&encoded[14..19], &[0xFF, 10, 20, 30, 40]);
}

#[test]
fn corrupt_magic_is_rejected() {
    let mut encoded = encode_to_vec(&[RGBA8::new(1, 2, 3, 4)], 1, 1);
    encoded[3] = b'g';

    let err = decode(&encoded[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidMagic { magic } if &magic == b"qoig"));
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("qoig"), "{err}");

    let err = decode_config(&encoded[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidMagic { magic } if &magic == b"qoig"));
}

#[test]
fn header_without_chunks_is_truncated() {
    let data = header(2, 2, 4, 0);

    let err = decode(&data[..]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Truncated);
}

#[test]
fn truncation_inside_a_chunk() {
    let mut data = header(1, 1, 4, 0);
    data.extend_from_slice(&[0xFF, 1, 2]);

    let err = decode(&data[..]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn truncated_header() {
    let data = header(2, 2, 4, 0);

    let err = decode_config(&data[..9]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");

    let err = decode(&data[..9]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn empty_input() {
    let err = decode_config(io::empty()).unwrap_err();
    assert!(matches!(err, DecodeError::EndOfStream), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::EndOfStream);

    // an image was required, so running out before it is a truncation
    let err = decode(io::empty()).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn invalid_header_fields() {
    let err = decode_config(&header(1, 1, 5, 0)[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidChannels { channels: 5 }));
    assert!(err.to_string().contains("invalid channel count"));

    let err = decode_config(&header(1, 1, 4, 2)[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidColorSpace { colorspace: 2 }));
    assert!(err.to_string().contains("invalid color space"));

    let err = decode_config(&header(0, 1, 4, 0)[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidDimensions { width: 0, height: 1 }));

    let err = decode_config(&header(7, 0, 3, 1)[..]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidDimensions { width: 7, height: 0 }));
}

#[test]
fn oversized_headers_are_rejected_before_reading_pixels() {
    // no chunk data at all: a truncation error would mean the pixels were attempted
    let data = header(60_000, 60_000, 4, 0);
    let err = decode(&data[..]).unwrap_err();
    assert!(matches!(err, DecodeError::TooManyPixels { .. }), "{err:?}");

    let data = header(11, 10, 4, 0);
    let limits = Limits::default().with_max_pixels(100);
    let err = decode_with_limits(&data[..], &limits).unwrap_err();
    assert!(
        matches!(
            err,
            DecodeError::TooManyPixels {
                width: 11,
                height: 10,
                max_pixels: 100
            }
        ),
        "{err:?}"
    );

    // even without a configured limit, the buffer has to be addressable
    let data = header(u32::MAX, u32::MAX, 4, 0);
    let err = decode_with_limits(&data[..], &Limits::none()).unwrap_err();
    assert!(matches!(err, DecodeError::TooManyPixels { .. }), "{err:?}");
}

#[test]
fn decode_config_accepts_custom_limits() {
    let data = header(20_001, 20_000, 4, 0);

    let err = decode_config(&data[..]).unwrap_err();
    assert!(
        matches!(
            err,
            DecodeError::TooManyPixels {
                width: 20_001,
                height: 20_000,
                max_pixels: 400_000_000
            }
        ),
        "{err:?}"
    );

    let config = decode_config_with_limits(&data[..], &Limits::none()).unwrap();
    assert_eq!((config.width, config.height), (20_001, 20_000));

    let limits = Limits::default().with_max_pixels(99);
    let err = decode_config_with_limits(&header(10, 10, 4, 0)[..], &limits).unwrap_err();
    assert!(matches!(err, DecodeError::TooManyPixels { max_pixels: 99, .. }), "{err:?}");
}

#[test]
fn large_header_with_few_chunks_is_truncated() {
    // passes the default limit, but the data ends after a handful of pixels
    let mut data = header(20_000, 20_000, 4, 0);
    data.extend_from_slice(&[0xFF, 1, 2, 3, 4, 0xFD, 0xC0]);

    let err = decode(&data[..]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn limit_is_inclusive() {
    let pixels = vec![RGBA8::new(3, 3, 3, 255); 100];
    let encoded = encode_to_vec(&pixels, 10, 10);

    let limits = Limits::default().with_max_pixels(100);
    let decoded = decode_with_limits(&encoded[..], &limits).unwrap();
    assert_eq!(decoded.buf(), &pixels[..]);
}

#[test]
fn decode_config_reads_only_the_header() {
    let pixels = vec![RGBA8::new(9, 8, 7, 6); 12];
    let mut encoded = Vec::new();
    encode(
        &mut encoded,
        ImgRef::new(&pixels, 4, 3),
        EncodeOptions {
            channels: Channels::Rgb,
            colorspace: ColorSpace::Linear,
        },
    )
    .unwrap();

    let mut r = &encoded[..];
    let header = decode_config(&mut r).unwrap();
    assert_eq!(
        header,
        Header::new(4, 3, Channels::Rgb, ColorSpace::Linear)
    );
    assert_eq!(r.len(), encoded.len() - 14);

    // the stored tags don't affect the decoded pixels
    let decoded = decode(&encoded[..]).unwrap();
    assert_eq!(decoded.buf(), &pixels[..]);
}

#[test]
fn corrupt_end_marker() {
    let mut encoded = encode_to_vec(&[RGBA8::new(1, 2, 3, 4); 4], 2, 2);
    let last = encoded.len() - 1;
    encoded[last] = 0x02;

    let err = decode(&encoded[..]).unwrap_err();
    assert!(
        matches!(err, DecodeError::InvalidEndMarker { marker } if marker == [0, 0, 0, 0, 0, 0, 0, 2]),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = decode(&encoded[..last]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn missing_end_marker() {
    let encoded = encode_to_vec(&[RGBA8::new(1, 2, 3, 4); 4], 2, 2);

    let err = decode(&encoded[..encoded.len() - 8]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof), "{err:?}");
}

#[test]
fn reader_errors_pass_through() {
    struct Broken;

    impl io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
        }
    }

    let err = decode(Broken).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    match err {
        DecodeError::Io { source } => assert_eq!(source.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_images_cannot_be_encoded() {
    let mut out = Vec::new();
    let err = encode_slice(&mut out, 0, 0, &[], EncodeOptions::default()).unwrap_err();

    assert!(matches!(err, EncodeError::InvalidDimensions { width: 0, height: 0 }));
    assert!(err.to_string().contains("0x0"), "{err}");
    assert!(out.is_empty());

    let err = encode_slice(&mut out, 5, 0, &[], EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, EncodeError::InvalidDimensions { width: 5, height: 0 }));
    assert!(out.is_empty());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn dimensions_beyond_u32_cannot_be_encoded() {
    let mut out = Vec::new();
    let err = encode_slice(&mut out, 1 << 32, 1, &[], EncodeOptions::default()).unwrap_err();

    assert!(matches!(err, EncodeError::InvalidDimensions { width, height: 1 } if width == 1 << 32));
    assert!(out.is_empty());
}

#[test]
fn pixel_count_has_to_match() {
    let mut out = Vec::new();
    let pixels = [RGBA8::default(); 5];
    let err = encode_slice(&mut out, 2, 2, &pixels, EncodeOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        EncodeError::PixelCountMismatch {
            width: 2,
            height: 2,
            pixel_count: 5
        }
    ));
    assert!(out.is_empty());
}

/// Accepts `budget` bytes, then fails every write and counts the attempts.
struct FailingWriter {
    budget: usize,
    written: Vec<u8>,
    failed_writes: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.budget {
            self.failed_writes += 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn first_write_error_stops_encoding() {
    let pixels: Vec<_> = (0..64u8).map(|i| RGBA8::new(i * 4, i, 255 - i, 255)).collect();

    for budget in [0, 10, 14, 20] {
        let mut w = FailingWriter {
            budget,
            written: Vec::new(),
            failed_writes: 0,
        };

        let err = encode(&mut w, ImgRef::new(&pixels, 8, 8), EncodeOptions::default())
            .unwrap_err();

        match err {
            EncodeError::WriteIo { source } => {
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(w.failed_writes, 1, "budget {budget}");
        assert!(w.written.len() <= budget);
    }
}
