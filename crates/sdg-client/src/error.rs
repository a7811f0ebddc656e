//! Client error types

/// Remote call failures
///
/// Each failed operation surfaces exactly one of these; the `Display`
/// form is the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection-level failure (DNS, refused, timeout)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the backend
    ///
    /// `detail` carries the backend's own error string verbatim when the
    /// body provided one, else a status-derived message.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    /// Response body did not match the documented shape
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Non-success response helper
    #[inline]
    #[must_use]
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_detail_is_the_display_form() {
        let err = ApiError::status(404, "Challenge not found");
        assert_eq!(err.to_string(), "Challenge not found");
    }
}
