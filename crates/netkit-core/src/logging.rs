//! Result logging

use tracing::debug;

use crate::result::ApiResult;

/// Log the terminal result of a call at debug level
pub fn log_api_result<T>(called_from: &str, result: &ApiResult<T>) {
    match result {
        ApiResult::Success { message, .. } => {
            debug!(url = called_from, message = %message, "API call succeeded");
        }
        ApiResult::Error(error) => {
            debug!(
                url = called_from,
                code = %error.code,
                message = %error.message,
                kind = %error.kind,
                "API call failed"
            );
        }
    }
}
