//! Wire-level constants shared by the pipeline and the normalizer

/// Envelope keys
pub const STATUS: &str = "status";
pub const SUCCESS: &str = "success";
pub const RESPONSE: &str = "response";
pub const DATA: &str = "data";
pub const MESSAGE: &str = "message";
pub const ERROR: &str = "error";
pub const TYPE: &str = "type";
pub const CODE: &str = "code";

/// `status` values that satisfy the success predicate
pub const API_SUCCESS_STATUS: &str = "success";
pub const API_SUCCESS_STATUS_NUMERIC: &str = "1";
pub const API_FAIL_STATUS: &str = "fail";

/// Error codes
pub const UNKNOWN_ERROR_CODE: &str = "1000";
pub const NO_INTERNET_CONNECTION_CODE: &str = "1009";
pub const API_BLOCKED_CODE: &str = "1010";
pub const JSON_EXCEPTION_ERROR_CODE: &str = "9001";
pub const TIMEOUT_ERROR_CODE: &str = "9002";

/// Synthetic statuses for responses produced without touching the network
pub const NO_INTERNET_CONNECTION_STATUS: u16 = 1009;
pub const API_BLOCKED_STATUS: u16 = 1010;

/// Messages
pub const UNKNOWN_ERROR_MESSAGE: &str = "Something went wrong";
pub const INTERNET_UNAVAILABLE: &str = "Internet Unavailable";
pub const REQUEST_BLOCKED: &str = "Request blocked";

/// Headers
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CACHE_DATA: &str = "cache_data";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content types
pub const JSON_BODY: &str = "application/json; charset=UTF-8";
pub const FORM_BODY: &str = "application/x-www-form-urlencoded";
