//! DNS over UDP port 53.
//!
//! Both queries and responses are claimed. A query reports the first
//! question; a response additionally lists the rendered answers.
//!
//! Version française (résumé):
//! Décodage DNS sur le port 53 : en-tête, questions et réponses, avec
//! suivi borné des pointeurs de compression.

pub mod layout;
pub mod parser;

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;

pub use parser::{DnsMessage, DnsQuestion, DnsRecord, parse_message};

pub const DNS_PORT: u16 = 53;

/// Claims DNS messages exchanged on port 53.
pub struct DnsDecoder;

impl ProtocolDecoder for DnsDecoder {
    fn name(&self) -> &'static str {
        "dns"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        if !segment.involves_port(DNS_PORT) {
            return Ok(None);
        }
        let message = parse_message(segment.payload)?;
        let Some(question) = message.questions.first() else {
            return Ok(None);
        };

        let qtype = parser::type_name(question.qtype);
        let answers = rendered_answers(&message);
        let src = segment.src_ip.to_string();
        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        )
        .with_data("Hostname", question.name.as_str())
        .with_data("Type", qtype.as_str())
        .with_data("Response", message.response);
        let event = if message.opcode == layout::OPCODE_QUERY {
            event
        } else {
            event.with_data("Opcode", parser::opcode_name(message.opcode))
        };
        let event = if question.qclass == layout::CLASS_IN {
            event
        } else {
            event.with_data("Class", parser::class_name(question.qclass))
        };

        let event = if message.response {
            let rcode = parser::rcode_name(message.rcode);
            let outcome = if answers.is_empty() {
                rcode.to_string()
            } else {
                answers.join(", ")
            };
            let event = match parser::min_ttl(&message) {
                Some(ttl) => event.with_data("Ttl", ttl),
                None => event,
            };
            event
                .with_data("Rcode", rcode)
                .with_data("Answers", answers)
                .with_message(
                    "{} {} : {} is {}",
                    [self.name(), src.as_str(), question.name.as_str(), outcome.as_str()],
                )
        } else {
            event.with_message(
                "{} {} asks for {} ({})",
                [self.name(), src.as_str(), question.name.as_str(), qtype.as_str()],
            )
        };
        Ok(Some(event))
    }
}

/// Answer values, skipping record types without a rendering.
pub(crate) fn rendered_answers(message: &DnsMessage) -> Vec<String> {
    message
        .answers
        .iter()
        .filter_map(|answer| answer.value.clone())
        .collect()
}
