//! # Veles mDNS
//!
//! Wire parsing for the multicast DNS queries used by service discovery.
//! Standard RFC 1035 framing as constrained by RFC 6762: a 12-byte header,
//! a question section and three resource-record sections, with label/
//! pointer name compression and a 512-byte datagram limit (EDNS is not
//! supported).
//!
//! Parsing never panics across the API boundary; malformed datagrams
//! produce a typed [`DnsError`].
//!
//! ## Example
//!
//! ```
//! use veles_mdns::{parser, writer, Flags, Header, Query, Question, RecordClass, RecordType};
//!
//! let query = Query {
//!     header: Header {
//!         id: 0x1234,
//!         flags: Flags::default(),
//!         questions: 1,
//!         answers: 0,
//!         authority_rrs: 0,
//!         additional_rrs: 0,
//!     },
//!     questions: vec![Question {
//!         name: "_veles._tcp.local".to_owned(),
//!         rtype: RecordType::Ptr,
//!         rclass: RecordClass::Internet,
//!     }],
//!     answers: vec![],
//!     authorities: vec![],
//!     additional: vec![],
//! };
//!
//! let wire = writer::write(&query).unwrap();
//! let parsed = parser::read(&wire).unwrap();
//! assert_eq!(parsed, query);
//! ```

pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

pub use error::{DnsError, Result};
pub use types::{
    Flags, Header, Opcode, Query, Question, RData, RecordClass, RecordType, ReplyCode,
    ResourceRecord, DNS_HEADER_SIZE, MAX_DATAGRAM_LEN,
};
