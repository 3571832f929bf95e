//! Shared bucket and key validation for storage backends.

use crate::StorageError;

/// Reject bucket names that could escape a backend's namespace.
pub fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    if bucket.is_empty()
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket == "."
        || bucket == ".."
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

/// Reject object keys with `.`/`..` segments, an absolute prefix or NUL.
///
/// Dots inside a segment (`photo..v2.png`) are ordinary characters.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\0')
        || key.split('/').any(|segment| segment == ".." || segment == ".")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
