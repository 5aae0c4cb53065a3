//! Structured API errors.
//!
//! Every API-domain failure surfaces as an [`ApiError`] carrying a stable
//! [`ApiErrorCode`] callers can branch on, wrapped in `anyhow::Error`.
//! Retrieve it with `error.downcast_ref::<ApiError>()`.

mod parser;

use std::fmt;

pub use parser::parse;

/// Closed set of error codes the API is known to return.
///
/// Server codes outside this set normalize to [`ApiErrorCode::Unrecognized`];
/// an error is never surfaced with a free-form code string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    Unrecognized,
    Unknown,
    Unauthorized,
    InsufficientPermissions,
    RateLimited,
    TooManyRequests,
    RequestTooLarge,
    ResourceQuotaExceeded,
    DataConflict,
    ConflictWithAnotherUser,
    InvalidIModelsRequest,
    InvalidValue,
    InvalidHeaderValue,
    MissingRequiredProperty,
    MissingRequiredParameter,
    MissingRequiredHeader,
    MutuallyExclusivePropertiesProvided,
    IModelExists,
    NamedVersionExists,
    ChangesetExists,
    NamedVersionOnChangesetExists,
    IModelNotFound,
    ITwinNotFound,
    BriefcaseNotFound,
    ChangesetNotFound,
    NamedVersionNotFound,
    UserNotFound,
}

impl ApiErrorCode {
    /// Map a server-provided code string to the closed set.
    ///
    /// The API spells entity-name prefixes in lowercase ("iModelNotFound");
    /// the prefix is capitalized before lookup. Unmatched codes become
    /// [`ApiErrorCode::Unrecognized`].
    pub fn parse(code: &str) -> Self {
        match Self::normalize(code).as_str() {
            "Unknown" => Self::Unknown,
            "Unauthorized" => Self::Unauthorized,
            "InsufficientPermissions" => Self::InsufficientPermissions,
            "RateLimited" => Self::RateLimited,
            "TooManyRequests" => Self::TooManyRequests,
            "RequestTooLarge" => Self::RequestTooLarge,
            "ResourceQuotaExceeded" => Self::ResourceQuotaExceeded,
            "DataConflict" => Self::DataConflict,
            "ConflictWithAnotherUser" => Self::ConflictWithAnotherUser,
            "InvalidiModelsRequest" | "InvalidIModelsRequest" => Self::InvalidIModelsRequest,
            "InvalidValue" => Self::InvalidValue,
            "InvalidHeaderValue" => Self::InvalidHeaderValue,
            "MissingRequiredProperty" => Self::MissingRequiredProperty,
            "MissingRequiredParameter" => Self::MissingRequiredParameter,
            "MissingRequiredHeader" => Self::MissingRequiredHeader,
            "MutuallyExclusivePropertiesProvided" => Self::MutuallyExclusivePropertiesProvided,
            "IModelExists" => Self::IModelExists,
            "NamedVersionExists" => Self::NamedVersionExists,
            "ChangesetExists" => Self::ChangesetExists,
            "NamedVersionOnChangesetExists" => Self::NamedVersionOnChangesetExists,
            "IModelNotFound" => Self::IModelNotFound,
            "ITwinNotFound" => Self::ITwinNotFound,
            "BriefcaseNotFound" => Self::BriefcaseNotFound,
            "ChangesetNotFound" => Self::ChangesetNotFound,
            "NamedVersionNotFound" => Self::NamedVersionNotFound,
            "UserNotFound" => Self::UserNotFound,
            _ => Self::Unrecognized,
        }
    }

    /// Capitalize the lowercase entity-name prefix the API uses.
    fn normalize(code: &str) -> String {
        for prefix in ["iModel", "iTwin"] {
            if let Some(rest) = code.strip_prefix(prefix) {
                return format!("I{}{}", &prefix[1..], rest);
            }
        }
        code.to_string()
    }

    /// Stable string form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrecognized => "Unrecognized",
            Self::Unknown => "Unknown",
            Self::Unauthorized => "Unauthorized",
            Self::InsufficientPermissions => "InsufficientPermissions",
            Self::RateLimited => "RateLimited",
            Self::TooManyRequests => "TooManyRequests",
            Self::RequestTooLarge => "RequestTooLarge",
            Self::ResourceQuotaExceeded => "ResourceQuotaExceeded",
            Self::DataConflict => "DataConflict",
            Self::ConflictWithAnotherUser => "ConflictWithAnotherUser",
            Self::InvalidIModelsRequest => "InvalidIModelsRequest",
            Self::InvalidValue => "InvalidValue",
            Self::InvalidHeaderValue => "InvalidHeaderValue",
            Self::MissingRequiredProperty => "MissingRequiredProperty",
            Self::MissingRequiredParameter => "MissingRequiredParameter",
            Self::MissingRequiredHeader => "MissingRequiredHeader",
            Self::MutuallyExclusivePropertiesProvided => "MutuallyExclusivePropertiesProvided",
            Self::IModelExists => "IModelExists",
            Self::NamedVersionExists => "NamedVersionExists",
            Self::ChangesetExists => "ChangesetExists",
            Self::NamedVersionOnChangesetExists => "NamedVersionOnChangesetExists",
            Self::IModelNotFound => "IModelNotFound",
            Self::ITwinNotFound => "ITwinNotFound",
            Self::BriefcaseNotFound => "BriefcaseNotFound",
            Self::ChangesetNotFound => "ChangesetNotFound",
            Self::NamedVersionNotFound => "NamedVersionNotFound",
            Self::UserNotFound => "UserNotFound",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an error's detail list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetail {
    pub code: ApiErrorCode,
    pub message: String,
    /// Property or parameter the detail refers to.
    pub target: Option<String>,
}

/// Structured error returned for every failed API operation.
///
/// `message` already includes the numbered rendering of `details` when any
/// are present.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Option<Vec<ApiErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}
