//! Validation of command-line parameters and input paths.
//!
//! Every check returns a structured [`FgtrimError`] so commands can report the offending
//! parameter or file.

use crate::errors::{FgtrimError, Result};
use std::fmt::Display;
use std::path::Path;

/// Highest Phred quality representable in SAM/BAM.
pub const MAX_PHRED_QUALITY: u8 = 93;

/// Validate that a file exists.
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use fgtrim_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.bam", "Input BAM").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(FgtrimError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that a quality threshold is representable in SAM/BAM (0..=93).
///
/// # Errors
/// Returns an error if the quality is above 93
pub fn validate_quality_score(quality: u8, name: &str) -> Result<()> {
    if quality > MAX_PHRED_QUALITY {
        return Err(FgtrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Quality must be between 0 and {MAX_PHRED_QUALITY}, got: {quality}"),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0).
///
/// # Errors
/// Returns an error if the value is not positive
///
/// # Example
/// ```
/// use fgtrim_lib::validation::validate_positive;
///
/// validate_positive(4usize, "window").unwrap();
/// assert!(validate_positive(0usize, "window").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(FgtrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_file_exists() {
        let temp_file = NamedTempFile::new().unwrap();
        validate_file_exists(temp_file.path(), "Test file").unwrap();

        let err = validate_file_exists("/nonexistent/primers.bed", "Primer BED").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Primer BED"));
        assert!(msg.contains("does not exist"));
    }

    #[rstest]
    #[case(0, true)]
    #[case(20, true)]
    #[case(93, true)]
    #[case(94, false)]
    #[case(255, false)]
    fn test_validate_quality_score(#[case] quality: u8, #[case] ok: bool) {
        assert_eq!(validate_quality_score(quality, "min-quality").is_ok(), ok);
    }

    #[rstest]
    #[case(1, true)]
    #[case(0, false)]
    #[case(-3, false)]
    fn test_validate_positive(#[case] value: i64, #[case] ok: bool) {
        assert_eq!(validate_positive(value, "window").is_ok(), ok);
    }
}
