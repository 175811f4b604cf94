//! Identifier and object-name generation.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use aizome_core::UserId;

/// Image extensions accepted for uploads, with their content types.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// A fresh hyphenated lowercase UUID v4 string.
#[must_use]
pub fn new_client_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Human-facing order number: `AZ` + `yyyymmddHHMMSS` + 4 random digits.
#[must_use]
pub fn order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("AZ{}{suffix:04}", now.format("%Y%m%d%H%M%S"))
}

/// Lower-cased extension of `filename` if it is an allowed image type.
#[must_use]
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(allowed, _)| *allowed == ext)
        .then_some(ext)
}

/// Content type for an allowed extension.
#[must_use]
pub fn content_type_for(ext: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| allowed.eq_ignore_ascii_case(ext))
        .map(|(_, ct)| *ct)
}

/// Storage object name for an upload: `{user}/{folder}/{uuid}.{ext}`, or
/// `{user}/{uuid}.{ext}` without a folder.
///
/// Returns `None` if the original filename has no allowed extension.
#[must_use]
pub fn upload_object_name(user: UserId, folder: Option<&str>, original_filename: &str) -> Option<String> {
    let ext = image_extension(original_filename)?;
    let id = new_client_id();
    Some(match folder {
        Some(folder) => format!("{user}/{folder}/{id}.{ext}"),
        None => format!("{user}/{id}.{ext}"),
    })
}

/// Whether `name` may be used as an upload folder: 1..=32 characters of
/// `[A-Za-z0-9_-]`.
#[must_use]
pub fn is_folder_name(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_client_id_is_canonical() {
        let id = new_client_id();
        assert!(aizome_core::is_uuid(&id));
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap();
        let no = order_number(now);
        assert_eq!(no.len(), 2 + 14 + 4);
        assert!(no.starts_with("AZ20260309070501"));
        assert!(no[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_upload_object_name() {
        let user = UserId::generate();
        let name = upload_object_name(user, None, "Indigo Scarf.PNG").unwrap();
        let (prefix, file) = name.split_once('/').unwrap();
        assert_eq!(prefix, user.to_string());
        let (stem, ext) = file.rsplit_once('.').unwrap();
        assert!(aizome_core::is_uuid(stem));
        assert_eq!(ext, "png");

        assert!(upload_object_name(user, None, "script.sh").is_none());
        assert!(upload_object_name(user, None, "noext").is_none());

        let nested = upload_object_name(user, Some("works"), "a.webp").unwrap();
        assert!(nested.starts_with(&format!("{user}/works/")));
        assert!(nested.ends_with(".webp"));
    }

    #[test]
    fn test_is_folder_name() {
        assert!(is_folder_name("works"));
        assert!(is_folder_name("avatar-2026_01"));
        assert!(!is_folder_name(""));
        assert!(!is_folder_name("a/b"));
        assert!(!is_folder_name(".."));
        assert!(!is_folder_name(&"x".repeat(33)));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("webp"), Some("image/webp"));
        assert_eq!(content_type_for("svg"), None);
    }
}
