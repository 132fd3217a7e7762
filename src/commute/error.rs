use thiserror::Error;

/// Failures talking to the geocoding or travel-time services
#[derive(Debug, Error)]
pub enum CommuteError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("No coordinates found for address: {0}")]
    NoResult(String),
}

impl CommuteError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| CommuteError::Http { service, source }
    }

    /// Turn a non-success response into `Status`, keeping the body for the log
    pub(crate) async fn check(
        service: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(CommuteError::Status {
            service,
            status,
            body,
        })
    }
}
