//! EXIF tag extraction from encoded image bytes.

use exif::{In, Reader, Tag};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

const ORIENTATION: &str = "orientation";

/// EXIF tags of the primary image, keyed by lower-cased tag name.
///
/// The orientation tag is kept typed since the pipeline acts on it; every other
/// known tag is kept as its display rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifTags {
    pub orientation: Option<u32>,
    pub other: HashMap<String, String>,
}

impl ExifTags {
    /// Read EXIF from an encoded image. Images without EXIF, or with EXIF we
    /// can't parse, yield an empty set of tags.
    pub fn from_image_bytes(data: &[u8]) -> Self {
        let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("No EXIF metadata found: {}", e);
                return Self::default();
            }
        };

        let mut tags = Self::default();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            // Unknown tag numbers have no name to key them by.
            if field.tag.description().is_none() {
                continue;
            }

            if field.tag == Tag::Orientation {
                tags.orientation = field.value.get_uint(0);
                continue;
            }

            tags.other.insert(
                field.tag.to_string().to_lowercase(),
                field.display_value().to_string(),
            );
        }
        tags
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        if name == ORIENTATION {
            return self.orientation.map(|o| o.to_string());
        }
        self.other.get(&name).cloned()
    }

    pub fn len(&self) -> usize {
        self.other.len() + usize::from(self.orientation.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
