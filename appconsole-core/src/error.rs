use std::fmt;

/// Errors produced by the transport, catalog, and session layers.
///
/// Parser diagnostics live in [`crate::parser::ParseError`]: they are
/// rendered to the user who simply types another line, and never end a
/// session. Everything in this enum is either fatal to the connection
/// (transport errors) or fatal to a single message (document errors).
#[derive(Debug)]
pub enum ConsoleError {
    /// A frame carried an out-of-range length field. The connection is torn
    /// down; no bytes past the offending length field are consumed.
    CorruptMessage,

    /// The peer did not present the expected version string during the
    /// two-phase handshake.
    HandshakeFailed(Option<String>),

    /// The connection is gone or was never established.
    NoConnection,

    /// An I/O error on the underlying stream.
    Io(std::io::Error),

    /// A structured document failed to encode or decode.
    Encoding(serde_json::Error),

    /// A catalog or invocation document advertised an unsupported version.
    IncorrectCommandSpecificationVersion { found: u32 },

    /// Any other error.
    Unknown(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::CorruptMessage => write!(f, "corrupt message: frame length out of range"),
            ConsoleError::HandshakeFailed(Some(reason)) => {
                write!(f, "handshake failed: {reason}")
            }
            ConsoleError::HandshakeFailed(None) => write!(f, "handshake failed"),
            ConsoleError::NoConnection => write!(f, "no connection"),
            ConsoleError::Io(err) => write!(f, "I/O error: {err}"),
            ConsoleError::Encoding(err) => write!(f, "encoding error: {err}"),
            ConsoleError::IncorrectCommandSpecificationVersion { found } => {
                write!(f, "incorrect command specification version: {found}")
            }
            ConsoleError::Unknown(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Io(err) => Some(err),
            ConsoleError::Encoding(err) => Some(err),
            ConsoleError::Unknown(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::Io(err)
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Encoding(err)
    }
}

/// Convenience type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        let err = ConsoleError::CorruptMessage;
        assert_eq!(err.to_string(), "corrupt message: frame length out of range");

        let err = ConsoleError::HandshakeFailed(Some("bad greeting".into()));
        assert_eq!(err.to_string(), "handshake failed: bad greeting");

        let err = ConsoleError::IncorrectCommandSpecificationVersion { found: 7 };
        assert_eq!(err.to_string(), "incorrect command specification version: 7");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: ConsoleError = io_err.into();
        assert!(matches!(err, ConsoleError::Io(_)));
    }

    #[test]
    fn io_error_exposes_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "broken");
        let err: ConsoleError = io_err.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
