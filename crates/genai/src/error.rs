/// Errors from the generation collaborators.
///
/// Messages are surfaced to the user verbatim by the workflow layer, so
/// they are written as complete sentences.
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A 2xx response did not have the expected shape.
    #[error("Unexpected response from the generation API: {0}")]
    Decode(String),

    /// The service completed but produced nothing usable.
    #[error("{0}")]
    Empty(String),

    /// A required credential or configuration value is missing.
    #[error("Missing configuration: {0}")]
    Config(String),
}
