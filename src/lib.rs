//! mDNS wire-format message codec.
//!
//! This crate translates raw UDP payloads into structured DNS messages and back, covering the
//! RFC 1035 message layout plus the multicast-DNS conventions from RFC 6762: name compression,
//! the cache-flush and unicast-response class bits, and the record types local service discovery
//! relies on. It performs no I/O of its own; socket setup, multicast membership, and timeouts
//! belong to the layer above, which hands received buffers to [`packet::message::Message::decode`]
//! and transmits the buffers produced by [`packet::message::Message::encode`].
//!
//! ```
//! use mdns_wire::packet::{message::{Message, Question}, QType};
//!
//! let mut msg = Message::new();
//! msg.questions.push(Question::new(
//!     "_http._tcp.local".parse().unwrap(),
//!     QType::PTR,
//! ));
//!
//! let buf = msg.encode().unwrap();
//! let back = Message::decode(&buf).unwrap();
//! assert_eq!(back.questions, msg.questions);
//! ```

pub mod packet;

mod hex;
mod num;

pub use packet::Error;

/// Size of unicast DNS message buffers.
///
/// Unicast DNS messages are limited to 512 Bytes.
pub const DNS_BUFFER_SIZE: usize = 512;

/// Size of multicast DNS message buffers.
///
/// DNS messages are limited to 512 Bytes, but mDNS works entirely within a local network, so it
/// can use larger messages. 1500 Bytes covers a full Ethernet frame, which is more than any
/// well-behaved sender puts in a single message.
pub const MDNS_BUFFER_SIZE: usize = 1500;
