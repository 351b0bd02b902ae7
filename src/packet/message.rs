//! The decoded message model.

use core::fmt;

use super::{
    decoder, encoder,
    name::DomainName,
    records::RData,
    Class, Error, Header, QClass, QType, Type,
};

/// A complete (m)DNS message.
///
/// A message owns its four sections by value. The count fields in the [`Header`] describe the
/// section lengths on the wire: [`Message::decode`] leaves them exactly as parsed (they are
/// consistent with the sections by construction), and [`Message::encode`] fills them in from
/// the actual section lengths, so they can never go out of sync.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Creates an empty query message with a zero ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw DNS packet.
    ///
    /// All four sections are parsed eagerly. Any malformed or missing data fails the whole
    /// decode, so a partially filled message is never returned. Bytes trailing the declared
    /// sections are ignored.
    pub fn decode(packet: &[u8]) -> Result<Self, Error> {
        decoder::decode_message(packet)
    }

    /// Produces the wire encoding of this message.
    ///
    /// Names are compressed using one table shared across all four sections, so a name reused
    /// anywhere later in the message costs 2 bytes. Fails with [`Error::OutOfRange`] if a
    /// section holds more than 65535 entries or a record's RDATA encodes to more than 65535
    /// bytes.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        encoder::encode_message(self)
    }
}

/// An entry of the *Question* section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: DomainName,
    pub qtype: QType,
    pub qclass: QClass,
    /// The mDNS QU bit, carried in the top bit of the wire class: asks responders to reply via
    /// unicast instead of multicast.
    pub unicast_response: bool,
}

impl Question {
    /// Creates a question asking for records of type `qtype` pertaining to `qname`, in the
    /// Internet class ([`QClass::IN`]).
    pub fn new(qname: DomainName, qtype: QType) -> Self {
        Self {
            qname,
            qtype,
            qclass: QClass::IN,
            unicast_response: false,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

/// A record of the *Answer*, *Authority*, or *Additional Records* section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub class: Class,
    /// The mDNS cache-flush bit, carried in the top bit of the wire class: tells receivers to
    /// replace, rather than extend, their cached records for this name and type.
    pub cache_flush: bool,
    /// Time To Live, in seconds.
    pub ttl: u32,
    pub rdata: RData,
}

impl ResourceRecord {
    /// Creates an Internet-class record with a TTL of 0 and the cache-flush bit unset.
    pub fn new(name: DomainName, rdata: RData) -> Self {
        Self {
            name,
            class: Class::IN,
            cache_flush: false,
            ttl: 0,
            rdata,
        }
    }

    #[inline]
    pub fn class(self, class: Class) -> Self {
        Self { class, ..self }
    }

    /// Sets the Time To Live, in seconds.
    #[inline]
    pub fn ttl(self, ttl: u32) -> Self {
        Self { ttl, ..self }
    }

    /// Sets the mDNS cache-flush bit.
    #[inline]
    pub fn cache_flush(self, cache_flush: bool) -> Self {
        Self { cache_flush, ..self }
    }

    /// Returns the record type of the contained RDATA.
    #[inline]
    pub fn record_type(&self) -> Type {
        self.rdata.record_type()
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.record_type(),
            self.rdata,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use expect_test::expect;

    use crate::hex;
    use crate::packet::records::{UnknownRData, A, PTR, SRV, TXT};

    use super::*;

    fn domain(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    #[test]
    fn encode_service_discovery_query() {
        let mut msg = Message::new();
        msg.questions
            .push(Question::new(domain("_http._tcp.local"), QType::PTR));

        let buf = msg.encode().unwrap();
        expect![["000000000001000000000000055f68747470045f746370056c6f63616c00000c0001"]]
            .assert_eq(&hex::Hex(&buf).to_string());

        let back = Message::decode(&buf).unwrap();
        assert_eq!(back.header.id(), 0);
        assert!(back.header.is_query());
        assert_eq!(back.header.question_count(), 1);
        assert_eq!(back.header.answer_count(), 0);
        assert_eq!(back.header.authoritative_count(), 0);
        assert_eq!(back.header.additional_count(), 0);
        assert_eq!(back.questions, msg.questions);
        assert!(back.answers.is_empty());
        assert!(back.authority.is_empty());
        assert!(back.additional.is_empty());
    }

    /// A typical service discovery response: PTR answer, SRV/TXT/A details, plus a record of a
    /// type the codec does not interpret.
    fn service_response() -> Message {
        let mut msg = Message::new();
        msg.header.set_response(true);
        msg.header.set_authority(true);

        let service = domain("garage._http._tcp.local");
        msg.questions
            .push(Question::new(domain("_http._tcp.local"), QType::PTR));
        msg.answers.push(
            ResourceRecord::new(
                domain("_http._tcp.local"),
                RData::PTR(PTR::new(service.clone())),
            )
            .ttl(4500),
        );
        msg.additional.push(
            ResourceRecord::new(
                service.clone(),
                RData::SRV(SRV::new(0, 0, 8080, domain("garage.local"))),
            )
            .ttl(120)
            .cache_flush(true),
        );
        msg.additional.push(
            ResourceRecord::new(service, RData::TXT(TXT::new([&b"path=/"[..]]))).ttl(4500),
        );
        msg.additional.push(
            ResourceRecord::new(
                domain("garage.local"),
                RData::A(A::new(Ipv4Addr::new(192, 168, 0, 17))),
            )
            .ttl(120)
            .cache_flush(true),
        );
        msg.additional.push(ResourceRecord::new(
            domain("garage.local"),
            RData::Unknown(UnknownRData::new(Type::from(0xff02), [0xde, 0xad])),
        ));
        msg
    }

    #[test]
    fn roundtrip_service_response() {
        let msg = service_response();
        let buf = msg.encode().unwrap();

        let back = Message::decode(&buf).unwrap();
        assert!(back.header.is_response());
        assert!(back.header.is_authority());
        assert_eq!(back.header.question_count(), 1);
        assert_eq!(back.header.answer_count(), 1);
        assert_eq!(back.header.additional_count(), 4);
        assert_eq!(back.questions, msg.questions);
        assert_eq!(back.answers, msg.answers);
        assert_eq!(back.authority, msg.authority);
        assert_eq!(back.additional, msg.additional);
    }

    #[test]
    fn compression_spans_sections() {
        let buf = service_response().encode().unwrap();

        // Every name in the message is a suffix of a name written before it, so each label is
        // spelled out at most once per name it introduces: "garage" appears for the instance
        // name and the host name, the service type and "local" only in the question. With
        // every name written in full the message would be well over twice this size.
        assert!(buf.len() < 150, "message unexpectedly large: {}", buf.len());
        let count = |needle: &[u8]| {
            buf.windows(needle.len())
                .filter(|window| *window == needle)
                .count()
        };
        assert_eq!(count(b"garage"), 2);
        assert_eq!(count(b"_http"), 1);
        assert_eq!(count(b"local"), 1);
    }

    #[test]
    fn truncation_always_fails_cleanly() {
        let buf = service_response().encode().unwrap();
        for len in 0..buf.len() {
            match Message::decode(&buf[..len]) {
                Err(Error::Truncated) => {}
                Err(e) => panic!("prefix of {} bytes: expected Truncated, got {:?}", len, e),
                Ok(_) => panic!("prefix of {} bytes decoded successfully", len),
            }
        }
    }

    #[test]
    fn pointer_loop_rejected() {
        // A question whose name is a pointer to itself.
        let buf = hex::parse("0000 0000 0001 0000 0000 0000 c00c 000c 0001");
        assert_eq!(Message::decode(&buf).unwrap_err(), Error::MalformedName);

        // Two pointers forming a cycle through a record name and its RDATA.
        let buf = hex::parse(
            "0000 8400 0000 0001 0000 0000 c018 000c 0001 00000000 0002 c00c",
        );
        assert_eq!(Message::decode(&buf).unwrap_err(), Error::MalformedName);
    }

    #[test]
    fn compression_degrades_past_pointer_range() {
        let mut msg = Message::new();
        msg.header.set_response(true);
        msg.answers.push(ResourceRecord::new(
            domain("pad.local"),
            RData::Unknown(UnknownRData::new(Type::from(0xfff0), vec![0; 0x4100])),
        ));
        let instance = domain("printer._ipp._tcp.local");
        for _ in 0..2 {
            msg.answers.push(
                ResourceRecord::new(
                    domain("_ipp._tcp.local"),
                    RData::PTR(PTR::new(instance.clone())),
                )
                .ttl(4500),
            );
        }

        // Names written past offset 0x4000 cannot be pointer targets, so the instance name is
        // spelled out both times instead of being compressed.
        let buf = msg.encode().unwrap();
        let count = buf
            .windows(b"printer".len())
            .filter(|window| *window == b"printer")
            .count();
        assert_eq!(count, 2);

        let back = Message::decode(&buf).unwrap();
        assert_eq!(back.answers, msg.answers);
    }

    #[test]
    fn section_count_limits() {
        let mut msg = Message::new();
        let name = domain("a");
        for _ in 0..65536 {
            msg.questions.push(Question::new(name.clone(), QType::ALL));
        }
        assert_eq!(msg.encode().unwrap_err(), Error::OutOfRange);

        msg.questions.truncate(65535);
        let buf = msg.encode().unwrap();
        let back = Message::decode(&buf).unwrap();
        assert_eq!(back.header.question_count(), 65535);
        assert_eq!(back.questions.len(), 65535);
        assert_eq!(back.questions[65534], msg.questions[65534]);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut buf = service_response().encode().unwrap();
        buf.extend_from_slice(&[0xab; 7]);
        let msg = Message::decode(&buf).unwrap();
        assert_eq!(msg.header.question_count(), 1);
    }

    #[test]
    fn unicast_response_bit() {
        let mut msg = Message::new();
        let mut question = Question::new(domain("garage.local"), QType::A);
        question.unicast_response = true;
        msg.questions.push(question);

        let buf = msg.encode().unwrap();
        // The QU bit rides on top of the wire class.
        assert_eq!(&buf[buf.len() - 2..], &[0x80, 0x01]);

        let back = Message::decode(&buf).unwrap();
        assert!(back.questions[0].unicast_response);
        assert_eq!(back.questions[0].qclass, QClass::IN);
    }
}
