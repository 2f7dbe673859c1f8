//! Datagram parsing
//!
//! Names are encoded either as a run of length-prefixed labels (leading
//! bits `00`, 6-bit length) or as a 14-bit pointer to an earlier name
//! (leading bits `11`). Decoding keeps a map from absolute byte offset to
//! decoded string; that is the only correct way to resolve pointers while
//! still allowing later pointers to reference any earlier name.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::Bytes;

use crate::error::{DnsError, Result};
use crate::types::{
    Flags, Header, Query, Question, RData, RecordClass, RecordType, ResourceRecord,
    DNS_HEADER_SIZE, MAX_DATAGRAM_LEN,
};

type Names = HashMap<usize, String>;

/// Validates the datagram envelope before any field parsing
pub fn validate(buffer: &[u8]) -> Result<()> {
    if buffer.len() < DNS_HEADER_SIZE {
        return Err(DnsError::HeaderTooSmall(DNS_HEADER_SIZE));
    }

    // question count sits at bytes 4-5
    let questions = u16::from_be_bytes([buffer[4], buffer[5]]);

    if questions == 0 {
        return Err(DnsError::NoQuestions);
    }

    if buffer.len() > MAX_DATAGRAM_LEN {
        return Err(DnsError::PayloadTooLarge(buffer.len()));
    }

    Ok(())
}

/// Parses a full datagram
pub fn read(buffer: &[u8]) -> Result<Query> {
    validate(buffer)?;

    let mut reader = Reader::new(buffer);
    let mut names = Names::new();
    let mut query = Query::default();

    parse_header(&mut query, &mut reader)?;
    parse_questions(&mut query, &mut names, &mut reader)?;
    parse_resource_records(&mut query, &mut names, &mut reader)?;

    Ok(query)
}

/// Byte reader that tracks its absolute offset for the name table
struct Reader<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.buffer.len() - self.pos < len {
            return Err(DnsError::Truncated {
                offset: self.pos,
                needed: len - (self.buffer.len() - self.pos),
            });
        }

        let slice = &self.buffer[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn peek_u8(&self) -> Result<u8> {
        self.buffer.get(self.pos).copied().ok_or(DnsError::Truncated {
            offset: self.pos,
            needed: 1,
        })
    }

    fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn get_u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn get_u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

fn parse_header(query: &mut Query, reader: &mut Reader<'_>) -> Result<()> {
    query.header = Header {
        id: reader.get_u16()?,
        flags: Flags::decode(reader.get_u16()?),
        questions: reader.get_u16()?,
        answers: reader.get_u16()?,
        authority_rrs: reader.get_u16()?,
        additional_rrs: reader.get_u16()?,
    };

    Ok(())
}

fn parse_questions(query: &mut Query, names: &mut Names, reader: &mut Reader<'_>) -> Result<()> {
    for _ in 0..query.header.questions {
        let name = parse_name(names, reader)?;
        let rtype = RecordType::from_u16(reader.get_u16()?);
        let rclass = RecordClass::from_u16(reader.get_u16()?);

        query.questions.push(Question {
            name,
            rtype,
            rclass,
        });
    }

    Ok(())
}

fn parse_label_notation(reader: &mut Reader<'_>) -> Result<String> {
    let mut name = String::new();
    let mut length = reader.get_u8()?;

    while length != 0 {
        let segment = reader.take(length as usize)?;
        name.push_str(&String::from_utf8_lossy(segment));
        length = reader.get_u8()?;

        if length != 0 {
            name.push('.');
        }
    }

    Ok(name)
}

fn parse_name(names: &mut Names, reader: &mut Reader<'_>) -> Result<String> {
    let notation = reader.peek_u8()? >> 6;

    if notation == 0 {
        // string/label notation
        let name_offset = reader.offset();
        let name = parse_label_notation(reader)?;
        names.insert(name_offset, name.clone());
        Ok(name)
    } else if notation == 3 {
        // pointer notation
        let name_offset = reader.get_u16()? ^ (3 << 14);

        names
            .get(&(name_offset as usize))
            .cloned()
            .ok_or(DnsError::BadNameOffset(name_offset))
    } else {
        Err(DnsError::BadNameNotation(notation))
    }
}

fn parse_rdata(rtype: RecordType, raw: &[u8]) -> RData {
    match rtype {
        RecordType::A if raw.len() == 4 => {
            RData::A(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))
        }
        RecordType::Aaaa if raw.len() == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(raw);
            RData::Aaaa(Ipv6Addr::from(octets))
        }
        _ => RData::Raw(Bytes::copy_from_slice(raw)),
    }
}

fn parse_resource_record(names: &mut Names, reader: &mut Reader<'_>) -> Result<ResourceRecord> {
    let name = parse_name(names, reader)?;
    let rtype = RecordType::from_u16(reader.get_u16()?);
    let rclass = RecordClass::from_u16(reader.get_u16()?);
    let ttl = reader.get_u32()?;
    let rdata_len = reader.get_u16()?;
    let rdata = parse_rdata(rtype, reader.take(rdata_len as usize)?);

    Ok(ResourceRecord {
        name,
        rtype,
        rclass,
        ttl,
        rdata,
    })
}

fn parse_resource_records(
    query: &mut Query,
    names: &mut Names,
    reader: &mut Reader<'_>,
) -> Result<()> {
    for _ in 0..query.header.answers {
        query.answers.push(parse_resource_record(names, reader)?);
    }

    for _ in 0..query.header.authority_rrs {
        query
            .authorities
            .push(parse_resource_record(names, reader)?);
    }

    for _ in 0..query.header.additional_rrs {
        query.additional.push(parse_resource_record(names, reader)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn minimal_query() -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u16(0x1234); // id
        buf.put_u16(0x0100); // flags: RD
        buf.put_u16(1); // questions
        buf.put_u16(0); // answers
        buf.put_u16(0); // authority
        buf.put_u16(0); // additional

        // _veles._tcp.local PTR IN
        for label in ["_veles", "_tcp", "local"] {
            buf.put_u8(label.len() as u8);
            buf.put_slice(label.as_bytes());
        }
        buf.put_u8(0);
        buf.put_u16(12); // PTR
        buf.put_u16(1); // IN
        buf
    }

    #[test]
    fn test_parse_minimal_query() {
        let wire = minimal_query();
        let query = read(&wire).unwrap();

        assert_eq!(query.header.id, 0x1234);
        assert!(query.header.flags.rd);
        assert_eq!(query.questions.len(), 1);
        assert_eq!(query.questions[0].name, "_veles._tcp.local");
        assert_eq!(query.questions[0].rtype, RecordType::Ptr);
        assert_eq!(query.questions[0].rclass, RecordClass::Internet);
    }

    #[test]
    fn test_validate_short_header() {
        assert_eq!(
            validate(&[0u8; 11]),
            Err(DnsError::HeaderTooSmall(DNS_HEADER_SIZE))
        );
    }

    #[test]
    fn test_validate_no_questions() {
        let mut wire = minimal_query();
        wire[4] = 0;
        wire[5] = 0;
        assert_eq!(validate(&wire), Err(DnsError::NoQuestions));
    }

    #[test]
    fn test_validate_oversize_datagram() {
        let mut wire = minimal_query();
        wire.resize(513, 0);
        assert_eq!(validate(&wire), Err(DnsError::PayloadTooLarge(513)));
    }

    #[test]
    fn test_parse_answer_with_pointer_name() {
        let mut wire = minimal_query();
        wire[6] = 0;
        wire[7] = 1; // answers = 1

        // name as pointer to offset 12 (the question name)
        wire.put_u16(0xC000 | 12);
        wire.put_u16(1); // A
        wire.put_u16(1); // IN
        wire.put_u32(120); // ttl
        wire.put_u16(4); // rdata_len
        wire.put_slice(&[192, 168, 0, 7]);

        let query = read(&wire).unwrap();
        assert_eq!(query.answers.len(), 1);
        assert_eq!(query.answers[0].name, "_veles._tcp.local");
        assert_eq!(query.answers[0].rdata, RData::A(Ipv4Addr::new(192, 168, 0, 7)));
    }

    #[test]
    fn test_bad_pointer_offset() {
        let mut wire = minimal_query();
        wire[6] = 0;
        wire[7] = 1;

        wire.put_u16(0xC000 | 400); // nothing was decoded there
        wire.put_u16(1);
        wire.put_u16(1);
        wire.put_u32(120);
        wire.put_u16(0);

        assert_eq!(read(&wire), Err(DnsError::BadNameOffset(400)));
    }

    #[test]
    fn test_bad_notation() {
        let mut wire = minimal_query();
        wire[6] = 0;
        wire[7] = 1;

        wire.put_u8(0b0100_0000); // 01 prefix is unassigned

        assert_eq!(read(&wire), Err(DnsError::BadNameNotation(1)));
    }

    #[test]
    fn test_truncated_question() {
        let wire = minimal_query();
        let cut = &wire[..wire.len() - 3];

        assert!(matches!(read(cut), Err(DnsError::Truncated { .. })));
    }

    #[test]
    fn test_unknown_rdata_kept_raw() {
        let mut wire = minimal_query();
        wire[6] = 0;
        wire[7] = 1;

        wire.put_u16(0xC000 | 12);
        wire.put_u16(16); // TXT
        wire.put_u16(1);
        wire.put_u32(60);
        wire.put_u16(5);
        wire.put_slice(b"hello");

        let query = read(&wire).unwrap();
        assert_eq!(
            query.answers[0].rdata,
            RData::Raw(Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn test_aaaa_rdata_decoded() {
        let mut wire = minimal_query();
        wire[6] = 0;
        wire[7] = 1;

        wire.put_u16(0xC000 | 12);
        wire.put_u16(28); // AAAA
        wire.put_u16(1);
        wire.put_u32(60);
        wire.put_u16(16);
        wire.put_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

        let query = read(&wire).unwrap();
        assert_eq!(query.answers[0].rdata, RData::Aaaa(Ipv6Addr::LOCALHOST));
    }
}
