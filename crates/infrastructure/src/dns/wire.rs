//! Thin helpers around `hickory-proto` message encoding.

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, Record, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder, NameEncoding};
use waypoint_dns_domain::DomainError;

/// Parses a presentation-format name, falling back to the root on garbage.
pub fn name(raw: &str) -> Name {
    Name::from_ascii(raw).unwrap_or_else(|_| Name::root())
}

/// Lower-cased, fully qualified text form of a name.
pub fn canonical_text(name: &Name) -> String {
    let mut text = name.to_lowercase().to_ascii();
    if !text.ends_with('.') {
        text.push('.');
    }
    text
}

/// Starts a response that mirrors the request's id, opcode, RD flag and
/// question section.
pub fn reply_to(request: &Message) -> Message {
    let mut response = Message::new(request.id(), MessageType::Response, request.op_code());
    response.set_recursion_desired(request.recursion_desired());
    response.add_queries(request.queries().iter().cloned());
    response
}

/// Builds a one-question query message.
pub fn question(name: Name, record_type: HickoryRecordType) -> Message {
    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

/// Serializes a message. Name compression is skipped when `compress` is false.
pub fn encode(message: &Message, compress: bool) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    {
        let mut encoder = BinEncoder::new(&mut buf);
        if !compress {
            encoder.set_name_encoding(NameEncoding::Uncompressed);
        }
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to serialize message: {}", e))
        })?;
    }
    Ok(buf)
}

/// Encoded length of a message; an unencodable message counts as unbounded.
pub fn encoded_len(message: &Message, compress: bool) -> usize {
    encode(message, compress)
        .map(|bytes| bytes.len())
        .unwrap_or(usize::MAX)
}

pub fn decode(bytes: &[u8]) -> Result<Message, DomainError> {
    Message::from_vec(bytes)
        .map_err(|e| DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e)))
}

/// Replaces every record section of `message` in one go.
pub fn set_sections(
    message: &mut Message,
    answers: Vec<Record>,
    name_servers: Vec<Record>,
    additionals: Vec<Record>,
) {
    message.take_answers();
    message.take_name_servers();
    message.take_additionals();
    message.insert_answers(answers);
    message.insert_name_servers(name_servers);
    message.insert_additionals(additionals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::RData;
    use std::net::Ipv4Addr;

    fn with_records(count: usize) -> Message {
        let mut message = question(name("web.service.consul."), HickoryRecordType::A);
        for i in 0..count {
            message.add_answer(Record::from_rdata(
                name("web.service.consul."),
                30,
                RData::A(A(Ipv4Addr::new(10, 0, 0, i as u8))),
            ));
        }
        message
    }

    #[test]
    fn compression_shrinks_repeated_names() {
        let message = with_records(4);
        assert!(encoded_len(&message, true) < encoded_len(&message, false));
    }

    #[test]
    fn uncompressed_encoding_round_trips() {
        let message = with_records(4);
        let bytes = encode(&message, false).unwrap();
        assert_eq!(bytes.len(), encoded_len(&message, false));
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.answers().len(), 4);
        assert_eq!(decoded.answers()[3].name().to_ascii(), "web.service.consul.");
    }

    #[test]
    fn canonical_text_lowercases_and_qualifies() {
        assert_eq!(canonical_text(&name("Web.Service.Consul")), "web.service.consul.");
    }

    #[test]
    fn reply_copies_question_and_id() {
        let request = with_records(0);
        let reply = reply_to(&request);
        assert_eq!(reply.id(), request.id());
        assert_eq!(reply.message_type(), MessageType::Response);
        assert_eq!(reply.queries().len(), 1);
    }

    #[test]
    fn set_sections_replaces_previous_records() {
        let mut message = with_records(3);
        set_sections(&mut message, Vec::new(), Vec::new(), Vec::new());
        assert!(message.answers().is_empty());
        assert_eq!(decode(&encode(&message, true).unwrap()).unwrap().answers().len(), 0);
    }
}
