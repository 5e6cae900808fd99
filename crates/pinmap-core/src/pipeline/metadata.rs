//! EXIF metadata extraction: coordinates, capture date and orientation.

use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{GeoTag, GeotagOutcome};

use super::orientation::Orientation;

/// Metadata the index cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetadata {
    pub geotag: GeotagOutcome,
    /// Capture date as `YYYY-MM-DD`
    pub date: Option<String>,
}

/// One GPS axis as found in the container.
#[derive(Debug, PartialEq)]
enum Axis {
    Absent,
    Invalid,
    Degrees(f64),
}

/// Extracts EXIF metadata from image files.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Read metadata from a source file without modifying it.
    ///
    /// Only failing to open the file is an error. A missing or corrupt
    /// metadata container is reported through [`GeotagOutcome`].
    pub fn extract(path: &Path) -> PipelineResult<ExtractedMetadata> {
        let file = File::open(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        Ok(Self::from_container(
            Reader::new().read_from_container(&mut reader),
        ))
    }

    /// Orientation of an in-memory image; upright when there is no EXIF.
    pub fn orientation_from_bytes(bytes: &[u8]) -> Orientation {
        Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()
            .and_then(|exif| Self::get_u32(&exif, Tag::Orientation))
            .map(Orientation::from_exif)
            .unwrap_or_default()
    }

    fn from_container(parsed: Result<Exif, exif::Error>) -> ExtractedMetadata {
        match parsed {
            Ok(exif) => ExtractedMetadata {
                geotag: Self::geotag(&exif),
                date: Self::get_date(&exif),
            },
            Err(exif::Error::NotFound(_)) => ExtractedMetadata {
                geotag: GeotagOutcome::Missing,
                date: None,
            },
            Err(e) => ExtractedMetadata {
                geotag: GeotagOutcome::Unreadable(e.to_string()),
                date: None,
            },
        }
    }

    /// Combine both axes; anything short of two valid values is not a location.
    fn geotag(exif: &Exif) -> GeotagOutcome {
        let lat = Self::get_axis(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'N', b'S');
        let lng = Self::get_axis(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'E', b'W');

        match (lat, lng) {
            (Axis::Absent, Axis::Absent) => GeotagOutcome::Missing,
            (Axis::Degrees(lat), Axis::Degrees(lng))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
            {
                GeotagOutcome::Found(GeoTag { lat, lng })
            }
            _ => GeotagOutcome::Incomplete,
        }
    }

    /// Get one GPS coordinate as signed decimal degrees.
    fn get_axis(exif: &Exif, coord_tag: Tag, ref_tag: Tag, positive: u8, negative: u8) -> Axis {
        let Some(coord) = exif.get_field(coord_tag, In::PRIMARY) else {
            return Axis::Absent;
        };
        let Some(degrees) = Self::parse_gps_rationals(&coord.value) else {
            return Axis::Invalid;
        };

        let reference = exif
            .get_field(ref_tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Ascii(parts) => parts.first().and_then(|s| s.first()).copied(),
                _ => None,
            })
            .map(|c| c.to_ascii_uppercase());

        match reference {
            Some(c) if c == positive => Axis::Degrees(degrees),
            Some(c) if c == negative => Axis::Degrees(-degrees),
            _ => Axis::Invalid,
        }
    }

    /// Parse GPS rationals (degrees, minutes, seconds) to decimal degrees.
    fn parse_gps_rationals(value: &Value) -> Option<f64> {
        match value {
            Value::Rational(rationals)
                if rationals.len() >= 3 && rationals[..3].iter().all(|r| r.denom != 0) =>
            {
                let degrees = rationals[0].to_f64();
                let minutes = rationals[1].to_f64();
                let seconds = rationals[2].to_f64();
                Some(degrees + minutes / 60.0 + seconds / 3600.0)
            }
            _ => None,
        }
    }

    /// Capture date, preferring DateTimeOriginal over DateTime.
    fn get_date(exif: &Exif) -> Option<String> {
        [Tag::DateTimeOriginal, Tag::DateTime]
            .into_iter()
            .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
            .find_map(|f| match &f.value {
                Value::Ascii(parts) => {
                    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
                    Some(format!("{:04}-{:02}-{:02}", dt.year, dt.month, dt.day))
                }
                _ => None,
            })
    }

    /// Get a u32 field from EXIF data.
    fn get_u32(exif: &Exif, tag: Tag) -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use exif::{Field, Rational};

    fn extract_bytes(bytes: &[u8]) -> ExtractedMetadata {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, bytes).unwrap();
        MetadataExtractor::extract(&path).unwrap()
    }

    fn plain_jpeg() -> Vec<u8> {
        testutil::jpeg_bytes(&testutil::solid_rgb(16, 16, [1, 2, 3]))
    }

    #[test]
    fn test_extract_missing_file() {
        let result = MetadataExtractor::extract(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(PipelineError::Read { .. })));
    }

    #[test]
    fn test_jpeg_with_gps() {
        let meta = extract_bytes(&testutil::geotagged_jpeg(10.0, 20.0));
        assert_eq!(
            meta.geotag,
            GeotagOutcome::Found(GeoTag {
                lat: 10.0,
                lng: 20.0
            })
        );
        assert_eq!(meta.date, None);
    }

    #[test]
    fn test_southern_western_hemispheres_are_negative() {
        let meta = extract_bytes(&testutil::geotagged_jpeg(-33.75, -70.5));
        assert_eq!(
            meta.geotag,
            GeotagOutcome::Found(GeoTag {
                lat: -33.75,
                lng: -70.5
            })
        );
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        let meta = extract_bytes(&testutil::geotagged_jpeg(0.0, 0.0));
        assert_eq!(
            meta.geotag,
            GeotagOutcome::Found(GeoTag { lat: 0.0, lng: 0.0 })
        );
    }

    #[test]
    fn test_no_exif_is_missing() {
        let meta = extract_bytes(&plain_jpeg());
        assert_eq!(meta.geotag, GeotagOutcome::Missing);
    }

    #[test]
    fn test_png_without_exif_is_missing() {
        let png = testutil::png_bytes(&testutil::solid_rgb(4, 4, [0, 0, 0]));
        let meta = extract_bytes(&png);
        assert_eq!(meta.geotag, GeotagOutcome::Missing);
    }

    #[test]
    fn test_exif_without_gps_is_missing() {
        let bytes = testutil::with_exif(&plain_jpeg(), &[testutil::orientation_field(1)]);
        let meta = extract_bytes(&bytes);
        assert_eq!(meta.geotag, GeotagOutcome::Missing);
    }

    #[test]
    fn test_latitude_only_is_incomplete() {
        let bytes = testutil::with_exif(&plain_jpeg(), &testutil::latitude_fields(45.0));
        let meta = extract_bytes(&bytes);
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);
    }

    #[test]
    fn test_zero_denominator_is_incomplete() {
        let mut fields = testutil::latitude_fields(45.0);
        fields.extend(testutil::longitude_fields(7.0));
        fields[3] = Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![
                Rational { num: 0, denom: 0 },
                Rational { num: 0, denom: 0 },
                Rational { num: 0, denom: 0 },
            ]),
        };
        let meta = extract_bytes(&testutil::with_exif(&plain_jpeg(), &fields));
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);
    }

    #[test]
    fn test_out_of_range_latitude_is_incomplete() {
        let meta = extract_bytes(&testutil::geotagged_jpeg(95.0, 20.0));
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);

        let meta = extract_bytes(&testutil::geotagged_jpeg(10.0, 181.5));
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);
    }

    #[test]
    fn test_missing_ref_is_incomplete() {
        // Coordinates without their N/S and E/W refs have no defined sign
        let fields = vec![
            testutil::latitude_fields(10.0).remove(1),
            testutil::longitude_fields(20.0).remove(1),
        ];
        let meta = extract_bytes(&testutil::with_exif(&plain_jpeg(), &fields));
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);
    }

    #[test]
    fn test_unknown_ref_is_incomplete() {
        let mut fields = testutil::gps_fields(10.0, 20.0);
        fields[0] = Field {
            tag: Tag::GPSLatitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"X".to_vec()]),
        };
        let meta = extract_bytes(&testutil::with_exif(&plain_jpeg(), &fields));
        assert_eq!(meta.geotag, GeotagOutcome::Incomplete);
    }

    #[test]
    fn test_corrupt_container_is_unreadable() {
        // A JPEG whose APP1 claims to be Exif but holds no TIFF header
        let jpeg = plain_jpeg();
        let mut bytes = jpeg[..2].to_vec();
        bytes.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x0C]);
        bytes.extend_from_slice(b"Exif\0\0garb");
        bytes.extend_from_slice(&jpeg[2..]);

        let meta = extract_bytes(&bytes);
        assert!(matches!(meta.geotag, GeotagOutcome::Unreadable(_)));
    }

    #[test]
    fn test_capture_date() {
        let mut fields = testutil::gps_fields(1.0, 2.0);
        fields.push(testutil::date_field("2023:07:14 09:30:00"));
        let meta = extract_bytes(&testutil::with_exif(&plain_jpeg(), &fields));
        assert_eq!(meta.date.as_deref(), Some("2023-07-14"));
    }

    #[test]
    fn test_orientation_from_bytes() {
        let bytes = testutil::with_exif(&plain_jpeg(), &[testutil::orientation_field(6)]);
        assert_eq!(
            MetadataExtractor::orientation_from_bytes(&bytes),
            Orientation::Rotate90
        );
        assert_eq!(
            MetadataExtractor::orientation_from_bytes(&plain_jpeg()),
            Orientation::Normal
        );
    }

    #[test]
    fn test_extract_does_not_modify_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = testutil::geotagged_jpeg(10.0, 20.0);
        std::fs::write(&path, &bytes).unwrap();

        MetadataExtractor::extract(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
