// SPDX-License-Identifier: MPL-2.0
//! HTTP status code categorization.
//!
//! Pure functions over the numeric code; no state. The categories follow the
//! IANA registry's class ranges.

/// The class an HTTP status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// 100-199
    Informational,
    /// 200-299
    Success,
    /// 300-399
    Redirection,
    /// 400-499
    ClientError,
    /// 500-599
    ServerError,
    /// Anything outside 100-599.
    Unknown,
}

/// Maps a status code to its category by range membership.
#[must_use]
pub fn categorize(code: u16) -> StatusCategory {
    match code {
        100..=199 => StatusCategory::Informational,
        200..=299 => StatusCategory::Success,
        300..=399 => StatusCategory::Redirection,
        400..=499 => StatusCategory::ClientError,
        500..=599 => StatusCategory::ServerError,
        _ => StatusCategory::Unknown,
    }
}

#[must_use]
pub fn is_informational(code: u16) -> bool {
    categorize(code) == StatusCategory::Informational
}

#[must_use]
pub fn is_success(code: u16) -> bool {
    categorize(code) == StatusCategory::Success
}

#[must_use]
pub fn is_redirection(code: u16) -> bool {
    categorize(code) == StatusCategory::Redirection
}

#[must_use]
pub fn is_client_error(code: u16) -> bool {
    categorize(code) == StatusCategory::ClientError
}

#[must_use]
pub fn is_server_error(code: u16) -> bool {
    categorize(code) == StatusCategory::ServerError
}

/// Registry reason phrase for the codes seen in practice.
///
/// Returns `None` for codes outside the common set; callers fall back to the
/// category name.
#[must_use]
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        421 => "Misdirected Request",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}
