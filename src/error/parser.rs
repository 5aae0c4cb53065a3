//! Classification of raw HTTP failures into structured errors.

use crate::http::HttpFailure;

use super::{ApiError, ApiErrorCode, ApiErrorDetail};

const UNAUTHORIZED_MESSAGE: &str =
    "The user is unauthorized. Please provide valid authentication credentials.";

/// Wire shape of an API error response (internal).
mod wire {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct ErrorResponse {
        pub error: Error,
    }

    #[derive(Deserialize, Debug)]
    pub struct Error {
        pub code: Option<String>,
        pub message: Option<String>,
        pub details: Option<Vec<Detail>>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Detail {
        pub code: Option<String>,
        pub message: Option<String>,
        pub target: Option<String>,
    }
}

/// Classify one HTTP failure. Pure: no I/O, no side effects.
///
/// Responses with no body, 401 responses and bodies that do not match the
/// `{"error": {...}}` wrapper each take a dedicated path; everything else is
/// looked up in the closed code set.
pub fn parse(failure: &HttpFailure) -> ApiError {
    let Some(body) = failure.body.as_deref() else {
        return unknown_error(failure);
    };

    // 401 bodies are not consistently shaped, so they bypass body parsing.
    if failure.status == Some(401) {
        return ApiError {
            code: ApiErrorCode::Unauthorized,
            message: UNAUTHORIZED_MESSAGE.to_string(),
            details: None,
        };
    }

    let Ok(response) = serde_json::from_str::<wire::ErrorResponse>(body) else {
        return unrecognized_error(failure);
    };

    let code = response
        .error
        .code
        .as_deref()
        .map(ApiErrorCode::parse)
        .unwrap_or(ApiErrorCode::Unrecognized);
    if code == ApiErrorCode::Unrecognized {
        return unrecognized_error(failure);
    }

    let details: Option<Vec<ApiErrorDetail>> = response.error.details.map(|details| {
        details
            .into_iter()
            .map(|detail| ApiErrorDetail {
                code: detail
                    .code
                    .as_deref()
                    .map(ApiErrorCode::parse)
                    .unwrap_or(ApiErrorCode::Unrecognized),
                message: detail.message.unwrap_or_default(),
                target: detail.target,
            })
            .collect()
    });

    let base_message = response
        .error
        .message
        .unwrap_or_else(|| "No error message available.".to_string());
    let message = match details.as_deref() {
        Some(details) if !details.is_empty() => {
            format!("{}\n{}", base_message, format_details(details))
        }
        _ => base_message,
    };

    ApiError {
        code,
        message,
        details,
    }
}

/// Numbered human-readable rendering of a detail list.
fn format_details(details: &[ApiErrorDetail]) -> String {
    let mut rendered = String::from("Details:\n");
    for (index, detail) in details.iter().enumerate() {
        rendered.push_str(&format!("{}. {}: {}", index + 1, detail.code, detail.message));
        if let Some(target) = &detail.target {
            rendered.push_str(&format!(" Target: {}", target));
        }
        rendered.push_str(".\n");
    }
    rendered
}

fn unknown_error(failure: &HttpFailure) -> ApiError {
    ApiError {
        code: ApiErrorCode::Unknown,
        message: format!(
            "Unknown error occurred. Status code: {}, original error message: {}.",
            status_text(failure),
            message_text(failure)
        ),
        details: None,
    }
}

fn unrecognized_error(failure: &HttpFailure) -> ApiError {
    ApiError {
        code: ApiErrorCode::Unrecognized,
        message: format!(
            "Unrecognized error occurred. Status code: {}, original error message: {}, response body: {}.",
            status_text(failure),
            message_text(failure),
            failure.body.as_deref().unwrap_or("<none>")
        ),
        details: None,
    }
}

fn status_text(failure: &HttpFailure) -> String {
    match failure.status {
        Some(status) => status.to_string(),
        None => "<none>".to_string(),
    }
}

fn message_text(failure: &HttpFailure) -> &str {
    failure.message.as_deref().unwrap_or("<none>")
}
