//! DNS message encoding.

use std::collections::HashMap;

use bytemuck::NoUninit;

use super::{
    message::{Message, Question, ResourceRecord},
    name::DomainName,
    Error, CLASS_MASK, CLASS_TOP_BIT,
};

/// Marks the two most significant bits of a length octet as a compression pointer.
const POINTER_TAG: u16 = 0xC000;

/// First offset a 14-bit compression pointer can no longer address.
const POINTER_LIMIT: usize = 0x4000;

/// Accumulates the wire encoding of one message.
///
/// The name table maps every name suffix written so far to its absolute offset in the buffer, so
/// later occurrences can be replaced by 2-byte pointers. It spans all four sections of the
/// message and is discarded with the writer.
pub(crate) struct Writer {
    buf: Vec<u8>,
    names: HashMap<DomainName, u16>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn write_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub(crate) fn write_obj<T: NoUninit>(&mut self, obj: T) {
        self.write_slice(bytemuck::bytes_of(&obj));
    }

    pub(crate) fn write_u8(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub(crate) fn write_u16(&mut self, v: u16) {
        self.write_slice(&v.to_be_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_slice(&v.to_be_bytes());
    }

    pub(crate) fn write_character_string(&mut self, string: &[u8]) {
        assert!(string.len() <= 255);
        self.write_u8(string.len() as u8);
        self.write_slice(string);
    }

    /// Writes a `<domain-name>`, compressing against the names written earlier in the message.
    ///
    /// The longest suffix of `name` already in the name table is replaced by a pointer to its
    /// first occurrence; the labels in front of it are written out, recording each new suffix.
    /// Offsets past the 14-bit pointer range can never be referenced, so those suffixes are not
    /// recorded and later names degrade to their uncompressed form. That costs bytes, but it
    /// cannot fail.
    pub(crate) fn write_domain_name(&mut self, name: &DomainName) {
        let labels = name.labels();
        for i in 0..labels.len() {
            let suffix: DomainName = labels[i..].iter().collect();
            if let Some(&offset) = self.names.get(&suffix) {
                self.write_u16(POINTER_TAG | offset);
                return;
            }

            let here = self.buf.len();
            if here < POINTER_LIMIT {
                self.names.insert(suffix, here as u16);
            } else {
                log::trace!("name table exhausted, writing {} uncompressed", suffix);
            }

            let label = labels[i].as_bytes();
            self.write_u8(label.len() as u8);
            self.write_slice(label);
        }

        // Implicit root label at the end.
        self.write_u8(0);
    }

    fn write_question(&mut self, question: &Question) {
        self.write_domain_name(&question.qname);
        self.write_u16(question.qtype.0);
        let mut class = question.qclass.0 & CLASS_MASK;
        if question.unicast_response {
            class |= CLASS_TOP_BIT;
        }
        self.write_u16(class);
    }

    fn write_record(&mut self, rr: &ResourceRecord) -> Result<(), Error> {
        self.write_domain_name(&rr.name);
        self.write_u16(rr.rdata.record_type().0);
        let mut class = rr.class.0 & CLASS_MASK;
        if rr.cache_flush {
            class |= CLASS_TOP_BIT;
        }
        self.write_u16(class);
        self.write_u32(rr.ttl);

        // The RDATA length is only known once the data is written, so leave a gap and patch it
        // afterwards.
        let len_at = self.buf.len();
        self.write_u16(0);
        let rdata_at = self.buf.len();
        rr.rdata.encode(self);
        let rdata_len =
            u16::try_from(self.buf.len() - rdata_at).map_err(|_| Error::OutOfRange)?;
        self.buf[len_at..len_at + 2].copy_from_slice(&rdata_len.to_be_bytes());
        Ok(())
    }
}

/// Serializes a whole message.
///
/// The section counts in the emitted header are derived from the actual section lengths; any
/// failure aborts the encode, so a partial packet is never returned.
pub(crate) fn encode_message(msg: &Message) -> Result<Vec<u8>, Error> {
    let mut header = msg.header;
    header.set_qdcount(section_count(msg.questions.len())?);
    header.set_ancount(section_count(msg.answers.len())?);
    header.set_nscount(section_count(msg.authority.len())?);
    header.set_arcount(section_count(msg.additional.len())?);

    let mut w = Writer::new();
    w.write_obj(header);
    for question in &msg.questions {
        w.write_question(question);
    }
    for rr in &msg.answers {
        w.write_record(rr)?;
    }
    for rr in &msg.authority {
        w.write_record(rr)?;
    }
    for rr in &msg.additional {
        w.write_record(rr)?;
    }
    Ok(w.into_bytes())
}

fn section_count(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::super::decoder::Reader;
    use super::*;

    fn domain(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    #[test]
    fn compress_repeated_name() {
        let name = domain("one.example.local");
        let mut w = Writer::new();
        w.write_domain_name(&name);
        let first_len = w.buf.len();
        assert_eq!(first_len, name.encoded_len());

        // The second occurrence is a single pointer.
        w.write_domain_name(&name);
        assert_eq!(w.buf.len(), first_len + 2);

        let buf = w.into_bytes();
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_domain_name().unwrap(), name);
        assert_eq!(r.read_domain_name().unwrap(), name);
        assert!(r.buf().is_empty());
    }

    #[test]
    fn compress_shared_suffix() {
        let mut w = Writer::new();
        w.write_domain_name(&domain("alpha.local"));
        let first_len = w.buf.len();

        // "beta" plus a pointer to the "local" suffix.
        w.write_domain_name(&domain("beta.local"));
        assert_eq!(w.buf.len(), first_len + 1 + 4 + 2);

        let buf = w.into_bytes();
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_domain_name().unwrap(), domain("alpha.local"));
        assert_eq!(r.read_domain_name().unwrap(), domain("beta.local"));
    }

    #[test]
    fn root_name() {
        let mut w = Writer::new();
        w.write_domain_name(&DomainName::ROOT);
        assert_eq!(w.buf, [0]);
    }
}
