use thiserror::Error;
use thy_api::ApiError;

/// Invalid cache settings.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The `cache.strategy` tag is not one of the known strategies.
    #[error("Unsupported cache strategy '{0}'")]
    UnknownStrategy(String),
}

/// Why a secret could not be read from the server or the cache.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The server request failed and no cached copy could stand in.
    #[error("{}{}", .source, verbose_hint(.source))]
    Server {
        /// The request failure.
        #[from]
        source: ApiError,
    },
}

fn verbose_hint(error: &ApiError) -> &'static str {
    if error.lacks_detail() {
        " (re-run with --verbose for more details)"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use thy_api::StatusCode;

    use super::*;

    #[test]
    fn test_hint_only_without_server_detail() {
        let empty = ReadError::from(ApiError::EmptyResponse {
            status: StatusCode::BAD_GATEWAY,
        });
        assert!(empty
            .to_string()
            .ends_with("(re-run with --verbose for more details)"));

        let detailed = ReadError::from(ApiError::ResponseContent {
            status: StatusCode::NOT_FOUND,
            message: "secret not found".to_string(),
        });
        assert_eq!(
            detailed.to_string(),
            "Received error message from server: [404 Not Found] secret not found"
        );
    }
}
