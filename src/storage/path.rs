//! Object path model.
//!
//! Every stored object lives at `{owner}/{segment}/{encoded_name}.{ext}`.
//! The segment, extension and content type all follow from the
//! [`Category`]; the name is percent-encoded with the same character set
//! as JavaScript's `encodeURIComponent`, so paths and download filenames
//! agree with what browsers produce.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::str::FromStr;

use crate::errors::StorageError;

/// Characters escaped in object names: everything except ASCII
/// alphanumerics and `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Kind of object being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// User profile picture.
    Picture,
    /// Rendered resume preview image.
    Preview,
    /// Exported resume PDF.
    Document,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Picture, Category::Preview, Category::Document];

    /// Path component used for this category.
    pub fn segment(&self) -> &'static str {
        match self {
            Category::Picture => "pictures",
            Category::Preview => "previews",
            Category::Document => "resumes",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Category::Document => "pdf",
            Category::Picture | Category::Preview => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Category::Document => "application/pdf",
            Category::Picture | Category::Preview => "image/jpeg",
        }
    }

    /// Whether uploads in this category are normalized as images.
    pub fn is_image(&self) -> bool {
        !matches!(self, Category::Document)
    }

    fn name(&self) -> &'static str {
        match self {
            Category::Picture => "picture",
            Category::Preview => "preview",
            Category::Document => "document",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = StorageError;

    /// Accepts the canonical name or the path segment, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "picture" | "pictures" => Ok(Category::Picture),
            "preview" | "previews" => Ok(Category::Preview),
            "document" | "documents" | "resume" | "resumes" => Ok(Category::Document),
            _ => Err(StorageError::invalid_argument(format!(
                "unknown category '{s}', expected one of picture, preview, document"
            ))),
        }
    }
}

/// Percent-encode an object name.
pub fn encode_name(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// Reverse [`encode_name`].
#[cfg(test)]
pub(crate) fn decode_name(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Fully qualified location of an object inside the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    owner: String,
    category: Category,
    encoded_name: String,
}

impl ObjectPath {
    /// Validate the inputs and build the path.
    ///
    /// The owner id becomes a single path component, so it must be
    /// non-empty and free of `/`.  The name must contain something other
    /// than whitespace.
    pub fn new(owner: &str, category: Category, name: &str) -> Result<Self, StorageError> {
        validate_owner(owner)?;
        if name.trim().is_empty() {
            return Err(StorageError::invalid_argument("object name must not be empty"));
        }
        Ok(Self {
            owner: owner.to_string(),
            category,
            encoded_name: encode_name(name),
        })
    }

    /// `{encoded_name}.{ext}`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.encoded_name, self.category.extension())
    }

    /// Object key in the bucket.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.owner, self.category.segment(), self.file_name())
    }

    /// Key as it must appear in a URL path.
    ///
    /// The store percent-decodes request paths once, so every segment is
    /// encoded again; `My%20Resume.pdf` becomes `My%2520Resume.pdf`.
    pub fn url_path(&self) -> String {
        self.key()
            .split('/')
            .map(encode_name)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// RFC 5987 download disposition carrying the original name.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename*=UTF-8''{}", self.file_name())
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Reject owner ids that would not form exactly one path component.
pub fn validate_owner(owner: &str) -> Result<(), StorageError> {
    if owner.is_empty() {
        return Err(StorageError::invalid_argument("owner id must not be empty"));
    }
    if owner.contains('/') {
        return Err(StorageError::invalid_argument(format!(
            "owner id '{owner}' must not contain '/'"
        )));
    }
    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_path() {
        let path = ObjectPath::new("u1", Category::Picture, "avatar").unwrap();
        assert_eq!(path.key(), "u1/pictures/avatar.jpg");
    }

    #[test]
    fn test_document_path_encodes_spaces() {
        let path = ObjectPath::new("u1", Category::Document, "My Resume").unwrap();
        assert_eq!(path.key(), "u1/resumes/My%20Resume.pdf");
        assert_eq!(
            path.content_disposition(),
            "attachment; filename*=UTF-8''My%20Resume.pdf"
        );
    }

    #[test]
    fn test_url_path_survives_one_decode() {
        let path = ObjectPath::new("u1", Category::Document, "My Resume").unwrap();
        assert_eq!(path.url_path(), "u1/resumes/My%2520Resume.pdf");
        assert_eq!(decode_name(&path.url_path()), path.key());

        let plain = ObjectPath::new("u1", Category::Picture, "avatar").unwrap();
        assert_eq!(plain.url_path(), plain.key());
    }

    #[test]
    fn test_preview_path() {
        let path = ObjectPath::new("u2", Category::Preview, "abc123").unwrap();
        assert_eq!(path.key(), "u2/previews/abc123.jpg");
    }

    #[test]
    fn test_path_is_deterministic() {
        for category in Category::ALL {
            let a = ObjectPath::new("owner", category, "Lebenslauf (final)").unwrap();
            let b = ObjectPath::new("owner", category, "Lebenslauf (final)").unwrap();
            assert_eq!(a, b);
            assert_eq!(a.key(), b.key());
        }
    }

    #[test]
    fn test_encode_matches_encode_uri_component() {
        assert_eq!(encode_name("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(encode_name("keep-_.!~*'()"), "keep-_.!~*'()");
        assert_eq!(encode_name("Résumé"), "R%C3%A9sum%C3%A9");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for name in [
            "My Resume",
            "100% done",
            "Résumé 2024",
            "履歴書",
            "slash/inside",
            "%20 literal",
        ] {
            assert_eq!(decode_name(&encode_name(name)), name);
        }
    }

    #[test]
    fn test_different_names_do_not_collide() {
        let a = ObjectPath::new("u1", Category::Picture, "a b").unwrap();
        let b = ObjectPath::new("u1", Category::Picture, "a%20b").unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_rejects_bad_owner_and_name() {
        assert!(ObjectPath::new("", Category::Picture, "x").is_err());
        assert!(ObjectPath::new("a/b", Category::Picture, "x").is_err());
        assert!(ObjectPath::new("u1", Category::Picture, "   ").is_err());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("picture".parse::<Category>().unwrap(), Category::Picture);
        assert_eq!("pictures".parse::<Category>().unwrap(), Category::Picture);
        assert_eq!("Previews".parse::<Category>().unwrap(), Category::Preview);
        assert_eq!("resumes".parse::<Category>().unwrap(), Category::Document);
        assert_eq!("document".parse::<Category>().unwrap(), Category::Document);
        assert!("videos".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_media() {
        assert_eq!(Category::Document.content_type(), "application/pdf");
        assert_eq!(Category::Picture.content_type(), "image/jpeg");
        assert!(Category::Preview.is_image());
        assert!(!Category::Document.is_image());
    }
}
