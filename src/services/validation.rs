//! Input validation ahead of any network I/O.

use garde::{Report, Validate};

use crate::models::outcome::TryOnError;
use crate::models::request::{OutfitSource, UploadRequest};

/// Run garde validation and flatten the report into one readable line.
pub fn validate_struct<T>(value: &T) -> Result<(), String>
where
    T: Validate,
    T::Context: Default,
{
    value.validate().map_err(|report| format_report(&report))
}

fn format_report(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check an upload before it is sent anywhere.
pub fn check_request(request: &UploadRequest) -> Result<(), TryOnError> {
    validate_struct(&request.person)
        .map_err(|e| TryOnError::InvalidRequest(format!("person image: {}", e)))?;

    match &request.outfit {
        OutfitSource::Image(outfit) => validate_struct(outfit)
            .map_err(|e| TryOnError::InvalidRequest(format!("outfit image: {}", e))),
        OutfitSource::Remote(reference) if reference.trim().is_empty() => Err(
            TryOnError::InvalidRequest("outfit image reference is empty".to_string()),
        ),
        OutfitSource::Remote(_) => Ok(()),
    }
}
