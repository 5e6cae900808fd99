//! Fixture builders shared by the unit tests.
//!
//! Images are generated in memory; EXIF blocks are produced with
//! kamadak-exif's writer and spliced into JPEGs as an APP1 segment.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Top half `top`, bottom half `bottom`.
pub fn two_tone(width: u32, height: u32, top: [u8; 3], bottom: [u8; 3]) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgb(top)
        } else {
            Rgb(bottom)
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    encode(img, ImageFormat::Png)
}

pub fn jpeg_bytes(img: &DynamicImage) -> Vec<u8> {
    encode(img, ImageFormat::Jpeg)
}

/// Insert an EXIF APP1 segment holding `fields` right after the JPEG SOI.
pub fn with_exif(jpeg: &[u8], fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, degrees: f64) -> Field {
    let abs = degrees.abs();
    let d = abs.trunc();
    let m = ((abs - d) * 60.0).trunc();
    let s = (abs - d - m / 60.0) * 3600.0;
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: d as u32, denom: 1 },
            Rational { num: m as u32, denom: 1 },
            Rational {
                num: (s * 10_000.0).round() as u32,
                denom: 10_000,
            },
        ]),
    }
}

pub fn latitude_fields(lat: f64) -> Vec<Field> {
    let reference = if lat < 0.0 { "S" } else { "N" };
    vec![
        ascii(Tag::GPSLatitudeRef, reference),
        dms(Tag::GPSLatitude, lat),
    ]
}

pub fn longitude_fields(lng: f64) -> Vec<Field> {
    let reference = if lng < 0.0 { "W" } else { "E" };
    vec![
        ascii(Tag::GPSLongitudeRef, reference),
        dms(Tag::GPSLongitude, lng),
    ]
}

pub fn gps_fields(lat: f64, lng: f64) -> Vec<Field> {
    let mut fields = latitude_fields(lat);
    fields.extend(longitude_fields(lng));
    fields
}

pub fn orientation_field(orientation: u16) -> Field {
    Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![orientation]),
    }
}

pub fn date_field(exif_datetime: &str) -> Field {
    ascii(Tag::DateTimeOriginal, exif_datetime)
}

/// A small JPEG carrying the given coordinates.
pub fn geotagged_jpeg(lat: f64, lng: f64) -> Vec<u8> {
    let jpeg = jpeg_bytes(&solid_rgb(64, 48, [90, 140, 60]));
    with_exif(&jpeg, &gps_fields(lat, lng))
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}
