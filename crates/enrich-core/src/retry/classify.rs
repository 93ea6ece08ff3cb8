//! Classify lookup errors (HTTP status, curl errors, service replies) into error kinds.

use crate::lookup::LookupError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a lookup error into an ErrorKind.
pub fn classify(e: &LookupError) -> ErrorKind {
    match e {
        LookupError::Timeout => ErrorKind::Timeout,
        LookupError::Connection(_) => ErrorKind::Connection,
        LookupError::Throttled(_) => ErrorKind::Throttled,
        LookupError::Http(code) => classify_http_status(*code),
        LookupError::Curl(ce) => classify_curl_error(ce),
        LookupError::Malformed(_) | LookupError::Service(_) => ErrorKind::Other,
    }
}
