#[derive(Debug)]
pub enum DecodeError {
    InvalidBase64(base64::DecodeError),
    InvalidCursor(bincode::Error),
    EmptyPath,
    /// A path element carried both a numeric id and a name
    AmbiguousIdentifier { kind: String },
    /// A non-terminal path element had no identifier
    IncompleteAncestor { kind: String },
    MissingKey,
    /// A key that must carry an id or name did not
    IncompleteKey(String),
    InvalidTimestamp(i64),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidBase64(e) => write!(f, "Invalid Base64: {}", e),
            DecodeError::InvalidCursor(e) => write!(f, "Invalid Cursor: {}", e),
            DecodeError::EmptyPath => write!(f, "Empty key path"),
            DecodeError::AmbiguousIdentifier { kind } => write!(f, "Path element {} has both an id and a name", kind),
            DecodeError::IncompleteAncestor { kind } => write!(f, "Ancestor {} has no id or name", kind),
            DecodeError::MissingKey => write!(f, "Entity has no key"),
            DecodeError::IncompleteKey(key) => write!(f, "Key {} is incomplete", key),
            DecodeError::InvalidTimestamp(micros) => write!(f, "Timestamp out of range: {}", micros),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidBase64(e) => Some(e),
            DecodeError::InvalidCursor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for DecodeError {
    fn from(e: base64::DecodeError) -> Self { DecodeError::InvalidBase64(e) }
}

impl From<bincode::Error> for DecodeError {
    fn from(e: bincode::Error) -> Self { DecodeError::InvalidCursor(e) }
}
