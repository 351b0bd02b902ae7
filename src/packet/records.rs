//! Resource record data.
//!
//! Each record type the codec interprets gets its own struct; the `record_data!` macro stamps
//! out the [`RData`] sum type dispatching between them. Records of any other type are carried
//! verbatim as [`UnknownRData`], so they survive a decode/encode round trip untouched.

use std::{
    fmt::{self, Write},
    net::{Ipv4Addr, Ipv6Addr},
};

use crate::hex::Hex;

use super::{decoder::Reader, encoder::Writer, name::DomainName, Error, Type};

/// Wire (de)serialization of one record type's RDATA.
pub(crate) trait RecordData: Sized {
    /// The associated resource record type.
    const TYPE: Type;

    /// Appends the RDATA of this record to the message being built.
    fn encode(&self, w: &mut Writer);

    /// Decodes an instance of this record's data from a reader limited to the record's declared
    /// RDATA length.
    fn decode(r: &mut Reader<'_>) -> Result<Self, Error>;
}

macro_rules! record_data {
    (
        $( $record:ident ),+ $(,)?
    ) => {
        /// Type-tagged record data.
        ///
        /// Variants exist for the record types local service discovery relies on. Everything
        /// else is preserved as [`RData::Unknown`].
        #[non_exhaustive]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum RData {
            $( $record($record), )+
            Unknown(UnknownRData),
        }

        impl RData {
            /// Decodes the RDATA of a record of type `ty` from `r`, which is limited to the
            /// record's declared RDATA length.
            ///
            /// Interpreted types must consume that length exactly; any shortfall or excess
            /// fails with [`Error::MalformedRecord`].
            pub(crate) fn decode(ty: Type, mut r: Reader<'_>) -> Result<Self, Error> {
                let data = match ty {
                    $(
                        Type::$record => $record::decode(&mut r).map(Self::$record),
                    )+
                    _ => {
                        return Ok(Self::Unknown(UnknownRData {
                            ty,
                            data: r.buf().to_vec(),
                        }))
                    }
                };
                match data {
                    Ok(data) => {
                        if !r.buf().is_empty() {
                            return Err(Error::MalformedRecord);
                        }
                        Ok(data)
                    }
                    // The reader is backed by the declared number of bytes, so running out of
                    // data here means the length field was wrong, not that the message was cut
                    // short.
                    Err(Error::Truncated) => Err(Error::MalformedRecord),
                    Err(e) => Err(e),
                }
            }

            pub(crate) fn encode(&self, w: &mut Writer) {
                match self {
                    $( Self::$record(data) => data.encode(w), )+
                    Self::Unknown(data) => w.write_slice(&data.data),
                }
            }

            /// Returns the resource record type this data belongs to.
            pub fn record_type(&self) -> Type {
                match self {
                    $( Self::$record(_) => <$record as RecordData>::TYPE, )+
                    Self::Unknown(data) => data.ty,
                }
            }
        }

        impl fmt::Display for RData {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$record(data) => data.fmt(f), )+
                    Self::Unknown(data) => data.fmt(f),
                }
            }
        }
    };
}

record_data!(A, AAAA, CNAME, PTR, TXT, SRV);

/// An IPv4 host address.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct A {
    addr: Ipv4Addr,
}

impl RecordData for A {
    const TYPE: Type = Type::A;

    fn encode(&self, w: &mut Writer) {
        w.write_slice(&self.addr.octets());
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            addr: Ipv4Addr::from(*r.read_array()?),
        })
    }
}

impl A {
    #[inline]
    pub fn new(addr: Ipv4Addr) -> Self {
        Self { addr }
    }

    #[inline]
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

/// An IPv6 host address.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AAAA {
    addr: Ipv6Addr,
}

impl RecordData for AAAA {
    const TYPE: Type = Type::AAAA;

    fn encode(&self, w: &mut Writer) {
        w.write_slice(&self.addr.octets());
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            addr: Ipv6Addr::from(*r.read_array()?),
        })
    }
}

impl AAAA {
    #[inline]
    pub fn new(addr: Ipv6Addr) -> Self {
        Self { addr }
    }

    #[inline]
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

/// The canonical name of an alias.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CNAME {
    cname: DomainName,
}

impl RecordData for CNAME {
    const TYPE: Type = Type::CNAME;

    fn encode(&self, w: &mut Writer) {
        w.write_domain_name(&self.cname);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            cname: r.read_domain_name()?,
        })
    }
}

impl CNAME {
    pub fn new(cname: DomainName) -> Self {
        Self { cname }
    }

    #[inline]
    pub fn cname(&self) -> &DomainName {
        &self.cname
    }
}

impl fmt::Display for CNAME {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cname.fmt(f)
    }
}

/// A domain name pointer.
///
/// Service discovery uses these to map a service type like `_http._tcp.local` to the instances
/// providing it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PTR {
    ptrdname: DomainName,
}

impl RecordData for PTR {
    const TYPE: Type = Type::PTR;

    fn encode(&self, w: &mut Writer) {
        w.write_domain_name(&self.ptrdname);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            ptrdname: r.read_domain_name()?,
        })
    }
}

impl PTR {
    pub fn new(ptrdname: DomainName) -> Self {
        Self { ptrdname }
    }

    #[inline]
    pub fn ptrdname(&self) -> &DomainName {
        &self.ptrdname
    }
}

impl fmt::Display for PTR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ptrdname.fmt(f)
    }
}

/// Freeform key-value data attached to a service instance.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TXT {
    entries: Vec<Vec<u8>>,
}

impl RecordData for TXT {
    const TYPE: Type = Type::TXT;

    fn encode(&self, w: &mut Writer) {
        for entry in self.entries() {
            w.write_character_string(entry);
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        let mut entries = Vec::new();

        // Technically at least one is required, but we accept 0 too.
        while !r.buf().is_empty() {
            entries.push(r.read_character_string()?.to_vec());
        }

        Ok(Self { entries })
    }
}

impl TXT {
    /// Creates a new [`TXT`] resource record containing one or more `entries`.
    ///
    /// # Panics
    ///
    /// This method will panic if `entries` is empty, or if any entry exceeds the 255 bytes a
    /// *character string* can hold.
    pub fn new<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        let this = Self {
            entries: entries.into_iter().map(Into::into).collect(),
        };
        assert!(!this.entries.is_empty());
        assert!(this.entries.iter().all(|entry| entry.len() <= 255));
        this
    }

    /// Returns an iterator over all *character string* values in this record.
    ///
    /// Each *character string* is an arbitrary sequence of bytes (empty sequences are allowed).
    /// Their interpretation is up to higher-level specifications.
    pub fn entries(&self) -> impl Iterator<Item = &'_ [u8]> {
        self.entries.iter().map(|entry| &**entry)
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries().enumerate() {
            if i != 0 {
                f.write_char('\t')?;
            }

            for &byte in entry {
                if byte.is_ascii_graphic() {
                    f.write_char(byte as char)?;
                } else {
                    f.write_char('�')?;
                }
            }
        }
        Ok(())
    }
}

/// The network location of a service instance.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SRV {
    priority: u16,
    weight: u16,
    port: u16,
    target: DomainName,
}

impl RecordData for SRV {
    const TYPE: Type = Type::SRV;

    fn encode(&self, w: &mut Writer) {
        w.write_u16(self.priority);
        w.write_u16(self.weight);
        w.write_u16(self.port);
        w.write_domain_name(&self.target);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            priority: r.read_u16()?,
            weight: r.read_u16()?,
            port: r.read_u16()?,
            target: r.read_domain_name()?,
        })
    }
}

impl SRV {
    pub fn new(priority: u16, weight: u16, port: u16, target: DomainName) -> Self {
        Self {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority value of this service (lower values mean that the service should be
    /// preferred).
    #[inline]
    pub fn priority(&self) -> u16 {
        self.priority
    }

    #[inline]
    pub fn weight(&self) -> u16 {
        self.weight
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn target(&self) -> &DomainName {
        &self.target
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.priority, self.weight, self.port, self.target,
        )
    }
}

/// RDATA of a record type this crate does not interpret, carried verbatim.
///
/// Compression pointers inside such RDATA (if any) are *not* rewritten; re-encoding a message
/// relocates records, so unknown RDATA is only byte-for-byte faithful within the message it was
/// decoded from. The types that commonly embed names are all interpreted, so this does not come
/// up with well-formed service discovery traffic.
#[derive(PartialEq, Eq, Clone)]
pub struct UnknownRData {
    ty: Type,
    data: Vec<u8>,
}

impl UnknownRData {
    /// Creates record data of an arbitrary type from raw bytes.
    pub fn new(ty: Type, data: impl Into<Vec<u8>>) -> Self {
        Self {
            ty,
            data: data.into(),
        }
    }

    #[inline]
    pub fn record_type(&self) -> Type {
        self.ty
    }

    /// Returns the raw RDATA bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for UnknownRData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnknownRData")
            .field("ty", &self.ty)
            .field("data", &format_args!("{}", Hex(&self.data)))
            .finish()
    }
}

impl fmt::Display for UnknownRData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Hex(&self.data).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::hex;

    use super::*;

    fn decode(ty: Type, rdata: &[u8]) -> Result<RData, Error> {
        RData::decode(ty, Reader::new(rdata))
    }

    #[test]
    fn decode_a() {
        assert_eq!(
            decode(Type::A, &[192, 168, 0, 17]),
            Ok(RData::A(A::new(Ipv4Addr::new(192, 168, 0, 17)))),
        );
    }

    #[test]
    fn decode_srv() {
        let rdata = hex::parse("0000 0000 1f90 06676172616765056c6f63616c00");
        let srv = match decode(Type::SRV, &rdata) {
            Ok(RData::SRV(srv)) => srv,
            other => panic!("expected SRV, got {:?}", other),
        };
        assert_eq!(srv.priority(), 0);
        assert_eq!(srv.weight(), 0);
        assert_eq!(srv.port(), 8080);
        assert_eq!(srv.target().to_string(), "garage.local.");
    }

    #[test]
    fn decode_txt() {
        let rdata = hex::parse("06 706174683d2f 00 04 74657374");
        let txt = match decode(Type::TXT, &rdata) {
            Ok(RData::TXT(txt)) => txt,
            other => panic!("expected TXT, got {:?}", other),
        };
        let entries: Vec<&[u8]> = txt.entries().collect();
        assert_eq!(entries, [&b"path=/"[..], &[], &b"test"[..]]);
    }

    #[test]
    fn rdata_length_mismatch() {
        // Interpreted types must consume the declared length exactly.
        assert_eq!(decode(Type::A, &[192, 168, 0]), Err(Error::MalformedRecord));
        assert_eq!(
            decode(Type::A, &[192, 168, 0, 17, 99]),
            Err(Error::MalformedRecord),
        );
        // SRV cut off in the middle of its fixed fields.
        assert_eq!(
            decode(Type::SRV, &hex::parse("0000 0000 1f")),
            Err(Error::MalformedRecord),
        );
    }

    #[test]
    fn unknown_rdata_passthrough() {
        let rdata = match decode(Type::from(0xff02), &[0xde, 0xad, 0xbe, 0xef]).unwrap() {
            RData::Unknown(rdata) => rdata,
            other => panic!("expected Unknown, got {:?}", other),
        };
        assert_eq!(rdata.record_type(), Type::from(0xff02));
        assert_eq!(rdata.data(), &[0xde, 0xad, 0xbe, 0xef]);
    }
}
