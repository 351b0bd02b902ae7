use std::{fmt, io};

/// Errors that may occur while decoding or encoding a DNS message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// The end of the message was reached while more data was expected.
    Truncated,
    /// A domain name was encoded incorrectly: a reserved length octet, a compression pointer
    /// that does not target an earlier part of the message, an invalid label, or a name
    /// exceeding 255 encoded bytes.
    MalformedName,
    /// A resource record's declared RDATA length does not match the data of its type.
    MalformedRecord,
    /// A value does not fit its 16-bit wire field: a section with more than 65535 entries, or
    /// RDATA longer than 65535 bytes.
    OutOfRange,
}

impl Error {
    fn description(&self) -> &str {
        match self {
            Error::Truncated => "unexpected end of message",
            Error::MalformedName => "malformed domain name",
            Error::MalformedRecord => "record data does not match its declared length",
            Error::OutOfRange => "value does not fit in a 16-bit field",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Truncated => io::ErrorKind::UnexpectedEof.into(),
            Error::MalformedName => io::Error::new(
                io::ErrorKind::InvalidData,
                "malformed domain name; this may indicate a malicious message",
            ),
            Error::MalformedRecord => io::Error::new(
                io::ErrorKind::InvalidData,
                "resource record data does not match its declared length",
            ),
            Error::OutOfRange => io::Error::new(
                io::ErrorKind::InvalidInput,
                "value does not fit in a 16-bit message field",
            ),
        }
    }
}
