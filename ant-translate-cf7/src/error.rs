/// Error types for the CF7 translation add-on
///
/// Payload translation itself never surfaces these to the host: every entry
/// point of [`crate::pipeline::RequestPipeline`] degrades to returning its input.
/// They are used by configuration, dictionary loading and the collaborator traits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cf7Error {
    /// Invalid or unreadable configuration
    Config(String),
    /// Dictionary file could not be read or parsed
    Dictionary(String),
    /// A translation collaborator failed
    Translation(String),
    /// Form markup could not be parsed
    Markup(String),
    /// A host payload did not have the expected shape
    Payload(String),
    /// General error with context
    Other(String),
}

impl std::fmt::Display for Cf7Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cf7Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Cf7Error::Dictionary(msg) => write!(f, "Dictionary error: {}", msg),
            Cf7Error::Translation(msg) => write!(f, "Translation error: {}", msg),
            Cf7Error::Markup(msg) => write!(f, "Markup error: {}", msg),
            Cf7Error::Payload(msg) => write!(f, "Payload error: {}", msg),
            Cf7Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Cf7Error {}

impl From<serde_json::Error> for Cf7Error {
    fn from(err: serde_json::Error) -> Self {
        Cf7Error::Payload(err.to_string())
    }
}

/// Result type for add-on operations
pub type Cf7Result<T> = Result<T, Cf7Error>;
