//! Multicast DNS on UDP port 5353.
//!
//! mDNS shares the DNS wire format, so the DNS parser is reused. Queries and
//! announcements are both claimed as long as they carry a question or an
//! answer.

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;
use crate::protocols::dns::parser::parse_message;

pub const MDNS_PORT: u16 = 5353;

/// Claims mDNS queries and announcements.
pub struct MdnsDecoder;

impl ProtocolDecoder for MdnsDecoder {
    fn name(&self) -> &'static str {
        "mdns"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        if !segment.involves_port(MDNS_PORT) {
            return Ok(None);
        }
        let message = parse_message(segment.payload)?;
        if message.questions.is_empty() && message.answers.is_empty() {
            return Ok(None);
        }

        let questions: Vec<String> = message
            .questions
            .iter()
            .map(|question| question.name.clone())
            .collect();
        let answers: Vec<String> = message
            .answers
            .iter()
            .filter_map(|answer| {
                let value = answer.value.as_deref()?;
                Some(format!("{} is {}", answer.name, value))
            })
            .collect();

        let src = segment.src_ip.to_string();
        let summary = if answers.is_empty() {
            format!("asks for {}", questions.join(", "))
        } else {
            answers.join(", ")
        };
        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        )
        .with_data("Questions", questions)
        .with_data("Answers", answers)
        .with_message("{} {} : {}", [self.name(), src.as_str(), summary.as_str()]);
        Ok(Some(event))
    }
}
