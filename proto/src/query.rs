use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// An opaque position in a query's result stream.
///
/// Only the transport that produced a cursor knows how to interpret its bytes; callers hand it
/// back unchanged to resume a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self { Self(bytes.into()) }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Encode a serializable position as a cursor
    pub fn encode<T: Serialize>(position: &T) -> Result<Self, bincode::Error> { Ok(Self(bincode::serialize(position)?)) }

    /// Decode a position previously stored with [`Cursor::encode`]
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, DecodeError> { Ok(bincode::deserialize(&self.0)?) }

    pub fn from_base64<T: AsRef<[u8]>>(input: T) -> Result<Self, DecodeError> {
        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(input).map_err(DecodeError::InvalidBase64)?;
        Ok(Self(decoded))
    }

    pub fn to_base64(&self) -> String { general_purpose::URL_SAFE_NO_PAD.encode(&self.0) }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.to_base64()) }
}

impl TryFrom<&str> for Cursor {
    type Error = DecodeError;
    fn try_from(value: &str) -> Result<Self, Self::Error> { Self::from_base64(value) }
}

/// Whether a query batch exhausted its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoreResults {
    /// More results may exist; continue from the end cursor
    NotFinished,
    /// The batch stopped because the query limit was reached
    MoreResultsAfterLimit,
    NoMoreResults,
}
