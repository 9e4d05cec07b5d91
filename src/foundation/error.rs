pub type PhotostripResult<T> = Result<T, PhotostripError>;

#[derive(thiserror::Error, Debug)]
pub enum PhotostripError {
    #[error("decode error: {context}")]
    Decode {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Only produced while loading caption fonts, where it is logged and recovered.
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhotostripError {
    pub fn decode(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn layout_mismatch(msg: impl Into<String>) -> Self {
        Self::LayoutMismatch(msg.into())
    }

    pub fn asset_unavailable(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
