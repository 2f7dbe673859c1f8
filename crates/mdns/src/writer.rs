//! Datagram serialisation
//!
//! Names in resource records are encoded either as strings or as pointers
//! to existing strings in the buffer, for compression. The first two bits
//! pick the encoding: `00` string (remaining 6 bits = segment length),
//! `11` pointer (remaining 14 bits = absolute offset of the name).
//!
//! Question names are always written in label notation and their offsets
//! recorded; record names that match an already-written name become
//! pointers.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DnsError, Result};
use crate::types::{Query, RData, ResourceRecord};

type NamePointers = HashMap<String, u16>;

/// Serialises a full datagram
pub fn write(query: &Query) -> Result<Bytes> {
    let mut buf = BytesMut::new();

    write_header(query, &mut buf);
    let pointers = write_questions(query, &mut buf)?;
    write_resource_records(query, &mut buf, &pointers)?;

    Ok(buf.freeze())
}

fn write_header(query: &Query, buf: &mut BytesMut) {
    buf.put_u16(query.header.id);
    buf.put_u16(query.header.flags.encode());
    buf.put_u16(query.questions.len() as u16);
    buf.put_u16(query.answers.len() as u16);
    buf.put_u16(query.authorities.len() as u16);
    buf.put_u16(query.additional.len() as u16);
}

fn write_questions(query: &Query, buf: &mut BytesMut) -> Result<NamePointers> {
    let mut pointers = NamePointers::new();

    for question in &query.questions {
        pointers
            .entry(question.name.clone())
            .or_insert(buf.len() as u16);
        write_label_notation(&question.name, buf)?;
        buf.put_u16(question.rtype.as_u16());
        buf.put_u16(question.rclass.as_u16());
    }

    Ok(pointers)
}

fn write_label_notation(name: &str, buf: &mut BytesMut) -> Result<()> {
    for segment in name.split('.') {
        // 6 bits of length encoding
        if segment.len() > 63 {
            return Err(DnsError::LabelTooLong(segment.to_owned()));
        }

        buf.put_u8(segment.len() as u8);
        buf.put_slice(segment.as_bytes());
    }

    buf.put_u8(0);
    Ok(())
}

fn write_rdata(rdata: &RData, buf: &mut BytesMut) {
    match rdata {
        RData::A(ip) => buf.put_slice(&ip.octets()),
        RData::Aaaa(ip) => buf.put_slice(&ip.octets()),
        RData::Raw(bytes) => buf.put_slice(bytes),
    }
}

fn rdata_len(rdata: &RData) -> u16 {
    match rdata {
        RData::A(_) => 4,
        RData::Aaaa(_) => 16,
        RData::Raw(bytes) => bytes.len() as u16,
    }
}

fn write_resource_record(
    record: &ResourceRecord,
    buf: &mut BytesMut,
    pointers: &NamePointers,
) -> Result<()> {
    match pointers.get(&record.name) {
        Some(&offset) => {
            // two MSBs signal pointer encoding
            buf.put_u16(offset ^ (3 << 14));
        }
        None => {
            write_label_notation(&record.name, buf)?;
        }
    }

    buf.put_u16(record.rtype.as_u16());
    buf.put_u16(record.rclass.as_u16());
    buf.put_u32(record.ttl);
    buf.put_u16(rdata_len(&record.rdata));
    write_rdata(&record.rdata, buf);
    Ok(())
}

fn write_resource_records(
    query: &Query,
    buf: &mut BytesMut,
    pointers: &NamePointers,
) -> Result<()> {
    for record in &query.answers {
        write_resource_record(record, buf, pointers)?;
    }

    for record in &query.authorities {
        write_resource_record(record, buf, pointers)?;
    }

    for record in &query.additional {
        write_resource_record(record, buf, pointers)?;
    }

    Ok(())
}
