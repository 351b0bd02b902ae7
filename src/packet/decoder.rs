//! DNS message decoding.

use std::mem::size_of;

use bytemuck::AnyBitPattern;

use super::{
    message::{Message, Question, ResourceRecord},
    name::{DomainName, Label},
    records::RData,
    Class, Error, Header, QClass, QType, Type, CLASS_MASK, CLASS_TOP_BIT,
};

/// A cursor over the message buffer.
///
/// Compression pointers may target any earlier byte of the message, so the reader always keeps
/// the whole buffer around, even when it is limited to a single record's RDATA.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    /// The buffer containing the whole DNS message (possibly cut off at an RDATA boundary).
    full_buf: &'a [u8],
    /// The current reader position in the buffer.
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            full_buf: buf,
            pos: 0,
        }
    }

    pub(crate) fn buf(&self) -> &'a [u8] {
        &self.full_buf[self.pos..]
    }

    pub(crate) fn read_obj<T: AnyBitPattern>(&mut self) -> Result<T, Error> {
        let bytes = self.buf().get(..size_of::<T>()).ok_or(Error::Truncated)?;
        self.pos += size_of::<T>();
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    fn peek_u8(&self) -> Result<u8, Error> {
        self.full_buf.get(self.pos).copied().ok_or(Error::Truncated)
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        match self.full_buf.get(self.pos..self.pos + len) {
            Some(slice) => {
                self.pos += len;
                Ok(slice)
            }
            None => Err(Error::Truncated),
        }
    }

    pub(crate) fn read_array<const LEN: usize>(&mut self) -> Result<&'a [u8; LEN], Error> {
        let slice = self.read_slice(LEN)?;
        Ok(slice.try_into().unwrap())
    }

    /// Splits off another `Reader` at the current position, with a backing store truncated to
    /// `len` more bytes.
    ///
    /// The new reader can still follow compression pointers back into earlier data.
    fn split_off(&mut self, len: usize) -> Result<Reader<'a>, Error> {
        if self.buf().len() >= len {
            let mut copy = self.clone();
            copy.full_buf = &copy.full_buf[..self.pos + len];
            self.pos += len;
            Ok(copy)
        } else {
            Err(Error::Truncated)
        }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(*self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(*self.read_array()?))
    }

    /// Reads a `<character-string>` value.
    pub(crate) fn read_character_string(&mut self) -> Result<&'a [u8], Error> {
        let length = self.read_u8()?;
        self.read_slice(length.into())
    }

    /// Reads a `<domain-name>` value, following compression pointers.
    ///
    /// Pointers are followed on a cloned cursor; the outer cursor only ever advances past the
    /// bytes the name occupies in place, including a terminating 2-byte pointer.
    pub(crate) fn read_domain_name(&mut self) -> Result<DomainName, Error> {
        let mut domain_name = DomainName::ROOT;
        // The terminating root label counts towards the 255-byte limit.
        let mut encoded_len = 1;
        let mut jumped = false;
        let mut min_pos = self.pos;
        let mut copy = self.clone();
        loop {
            let length = copy.peek_u8()?;
            match length & 0b1100_0000 {
                0b1100_0000 => {
                    // 16-bit pointer to somewhere else in the message.
                    let ptr = usize::from(copy.read_u16()? & 0b0011_1111_1111_1111);
                    if ptr >= min_pos {
                        // We require pointers to point to an earlier part of the message. That
                        // rules out loops while keeping the check O(1), and crafted messages
                        // are the only ones that violate it.
                        return Err(Error::MalformedName);
                    }
                    if !jumped {
                        // The name occupies the bytes up to and including the first pointer;
                        // whatever the jump target holds never advances the outer cursor.
                        self.pos = copy.pos;
                        jumped = true;
                    }
                    min_pos = ptr;
                    copy.pos = ptr;
                }
                0b0000_0000 => {
                    copy.pos += 1;

                    // Length byte followed by a label of that many bytes.
                    let length = usize::from(length);
                    if length == 0 {
                        break;
                    }
                    encoded_len += 1 + length;
                    if encoded_len > DomainName::MAX_ENCODED_LEN {
                        return Err(Error::MalformedName);
                    }
                    let label = copy.read_slice(length)?;
                    domain_name.push_label(Label::try_new(label)?);
                }
                // Anything but 00 and 11 in the two MSbs is reserved.
                _ => return Err(Error::MalformedName),
            }
        }

        if !jumped {
            self.pos = copy.pos;
        }
        Ok(domain_name)
    }

    fn read_question(&mut self) -> Result<Question, Error> {
        let qname = self.read_domain_name()?;
        let qtype = QType(self.read_u16()?);
        let class = self.read_u16()?;
        Ok(Question {
            qname,
            qtype,
            qclass: QClass(class & CLASS_MASK),
            unicast_response: class & CLASS_TOP_BIT != 0,
        })
    }

    fn read_resource_record(&mut self) -> Result<ResourceRecord, Error> {
        let name = self.read_domain_name()?;
        let ty = Type(self.read_u16()?);
        let class = self.read_u16()?;
        let ttl = self.read_u32()?;
        let rdlength = self.read_u16()?;
        let rdata = self.split_off(usize::from(rdlength))?;
        Ok(ResourceRecord {
            name,
            class: Class(class & CLASS_MASK),
            cache_flush: class & CLASS_TOP_BIT != 0,
            ttl,
            rdata: RData::decode(ty, rdata)?,
        })
    }
}

/// Parses a whole message.
///
/// Any failure aborts the decode; a partially parsed message is never returned.
pub(crate) fn decode_message(packet: &[u8]) -> Result<Message, Error> {
    let mut r = Reader::new(packet);
    let header = r.read_obj::<Header>()?;

    // The counts are attacker-controlled, so the sections grow only as entries actually parse.
    let mut msg = Message {
        header,
        questions: Vec::new(),
        answers: Vec::new(),
        authority: Vec::new(),
        additional: Vec::new(),
    };
    for _ in 0..header.question_count() {
        msg.questions.push(r.read_question()?);
    }
    for _ in 0..header.answer_count() {
        msg.answers.push(r.read_resource_record()?);
    }
    for _ in 0..header.authoritative_count() {
        msg.authority.push(r.read_resource_record()?);
    }
    for _ in 0..header.additional_count() {
        msg.additional.push(r.read_resource_record()?);
    }

    // Trailing bytes after the declared sections are ignored.
    Ok(msg)
}
