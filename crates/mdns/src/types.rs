//! DNS wire types

use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Fixed header size in bytes
pub const DNS_HEADER_SIZE: usize = 12;

/// Maximum datagram size without EDNS (not supported here)
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Query/operation kind, bits 11-14 of the flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opcode {
    #[default]
    Query,
    IQuery,
    Status,
    Reserved(u8),
}

impl Opcode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            other => Opcode::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Reserved(other) => other,
        }
    }
}

/// Response code, bits 0-3 of the flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyCode {
    #[default]
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(u8),
}

impl ReplyCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ReplyCode::NoError,
            1 => ReplyCode::FormatError,
            2 => ReplyCode::ServerFailure,
            3 => ReplyCode::NameError,
            4 => ReplyCode::NotImplemented,
            5 => ReplyCode::Refused,
            other => ReplyCode::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ReplyCode::NoError => 0,
            ReplyCode::FormatError => 1,
            ReplyCode::ServerFailure => 2,
            ReplyCode::NameError => 3,
            ReplyCode::NotImplemented => 4,
            ReplyCode::Refused => 5,
            ReplyCode::Reserved(other) => other,
        }
    }
}

/// Resource record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Txt,
    Aaaa,
    Srv,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::Ns,
            5 => RecordType::Cname,
            6 => RecordType::Soa,
            12 => RecordType::Ptr,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            33 => RecordType::Srv,
            other => RecordType::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Ptr => 12,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Srv => 33,
            RecordType::Other(other) => other,
        }
    }
}

/// Resource record class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordClass {
    #[default]
    Internet,
    Chaos,
    Hesiod,
    Other(u16),
}

impl RecordClass {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordClass::Internet,
            3 => RecordClass::Chaos,
            4 => RecordClass::Hesiod,
            other => RecordClass::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            RecordClass::Internet => 1,
            RecordClass::Chaos => 3,
            RecordClass::Hesiod => 4,
            RecordClass::Other(other) => other,
        }
    }
}

/// Decoded header flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: ReplyCode,
}

const QR_OFFSET: u16 = 15;
const OPCODE_OFFSET: u16 = 11;
const AA_OFFSET: u16 = 10;
const TC_OFFSET: u16 = 9;
const RD_OFFSET: u16 = 8;
const RA_OFFSET: u16 = 7;
const Z_OFFSET: u16 = 6;
const AD_OFFSET: u16 = 5;
const CD_OFFSET: u16 = 4;

impl Flags {
    /// Decodes the 16-bit flags word
    pub fn decode(flags: u16) -> Self {
        Self {
            qr: flags >> QR_OFFSET & 1 != 0,
            opcode: Opcode::from_u8((flags >> OPCODE_OFFSET & 0xF) as u8),
            aa: flags >> AA_OFFSET & 1 != 0,
            tc: flags >> TC_OFFSET & 1 != 0,
            rd: flags >> RD_OFFSET & 1 != 0,
            ra: flags >> RA_OFFSET & 1 != 0,
            z: flags >> Z_OFFSET & 1 != 0,
            ad: flags >> AD_OFFSET & 1 != 0,
            cd: flags >> CD_OFFSET & 1 != 0,
            rcode: ReplyCode::from_u8((flags & 0xF) as u8),
        }
    }

    /// Encodes back into the 16-bit flags word
    pub fn encode(&self) -> u16 {
        let mut encoded = 0u16;
        encoded |= u16::from(self.qr) << QR_OFFSET;
        encoded |= u16::from(self.opcode.as_u8() & 0xF) << OPCODE_OFFSET;
        encoded |= u16::from(self.aa) << AA_OFFSET;
        encoded |= u16::from(self.tc) << TC_OFFSET;
        encoded |= u16::from(self.rd) << RD_OFFSET;
        encoded |= u16::from(self.ra) << RA_OFFSET;
        encoded |= u16::from(self.z) << Z_OFFSET;
        encoded |= u16::from(self.ad) << AD_OFFSET;
        encoded |= u16::from(self.cd) << CD_OFFSET;
        encoded |= u16::from(self.rcode.as_u8() & 0xF);
        encoded
    }
}

/// Fixed 12-byte header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub questions: u16,
    pub answers: u16,
    pub authority_rrs: u16,
    pub additional_rrs: u16,
}

/// One entry of the question section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub rtype: RecordType,
    pub rclass: RecordClass,
}

/// Decoded record data
///
/// A and AAAA are the types the writer knows how to serialise; everything
/// else round-trips as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Raw(Bytes),
}

/// One resource record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub rdata: RData,
}

/// A full datagram: header plus the four sections
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}
