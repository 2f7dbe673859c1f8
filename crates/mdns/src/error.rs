use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("Datagram smaller than the {0}-byte header")]
    HeaderTooSmall(usize),

    #[error("Datagram carries no questions")]
    NoQuestions,

    #[error("Datagram of {0} bytes exceeds the 512-byte limit")]
    PayloadTooLarge(usize),

    #[error("Datagram truncated: needed {needed} more byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Name pointer references unknown offset {0}")]
    BadNameOffset(u16),

    #[error("Unknown name notation {0:#04b}")]
    BadNameNotation(u8),

    #[error("Label '{0}' exceeds 63 bytes")]
    LabelTooLong(String),
}

pub type Result<T> = std::result::Result<T, DnsError>;
