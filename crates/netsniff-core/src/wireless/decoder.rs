use super::dot11::{self, BEACON_FIXED_LEN, CAPABILITY_PRIVACY, MacAddr, subtype};
use super::{WirelessDecoder, WirelessFrameView};
use crate::event::{EventSink, SniffEvent};

const HIDDEN_SSID: &str = "<hidden>";
const WILDCARD_SSID: &str = "<any>";

/// Management-frame decoder for beacons, probes and deauthentication.
///
/// Beacons are only reported in verbose mode.
///
/// # Examples
/// ```text
/// wifi.probe 66:77:88:99:aa:bb is probing for HomeNet
/// wifi.deauth 00:11:22:33:44:55 > 66:77:88:99:aa:bb deauthentication reason 7
/// ```
#[derive(Debug, Default)]
pub struct Dot11Decoder;

impl Dot11Decoder {
    pub fn decode(&self, view: &WirelessFrameView<'_>, verbose: bool) -> Option<SniffEvent> {
        let frame = &view.frame;
        let transmitter = frame.addr2?;
        match frame.subtype {
            _ if frame.frame_type != dot11::FrameType::Management => None,
            subtype::BEACON if verbose => Some(self.beacon(view, transmitter)),
            subtype::PROBE_REQUEST => Some(self.probe(view, transmitter)),
            subtype::PROBE_RESPONSE => Some(self.probe_response(view, transmitter)),
            subtype::DEAUTHENTICATION | subtype::DISASSOCIATION => {
                self.deauth(view, transmitter)
            }
            _ => None,
        }
    }

    fn event(&self, view: &WirelessFrameView<'_>, label: &str, source: MacAddr) -> SniffEvent {
        let event = SniffEvent::new(
            view.timestamp,
            label,
            source.to_string(),
            view.frame.addr1.to_string(),
        );
        match view.signal() {
            Some(signal) => event.with_data("Signal", signal),
            None => event,
        }
    }

    fn beacon(&self, view: &WirelessFrameView<'_>, transmitter: MacAddr) -> SniffEvent {
        let frame = &view.frame;
        let bssid = frame.addr3.unwrap_or(transmitter).to_string();
        let ssid = dot11::ssid(frame.elements(BEACON_FIXED_LEN)).unwrap_or_default();
        let channel = dot11::ds_channel(frame.elements(BEACON_FIXED_LEN)).or(view.radio_channel());
        let capability = frame
            .body
            .get(10..12)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .unwrap_or_default();
        let shown = if ssid.is_empty() { HIDDEN_SSID } else { ssid.as_str() };
        let channel_text = channel.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string());

        let mut event = self
            .event(view, "wifi.beacon", transmitter)
            .with_data("Ssid", ssid.as_str())
            .with_data("Bssid", bssid.as_str())
            .with_data("Encrypted", capability & CAPABILITY_PRIVACY != 0);
        if let Some(channel) = channel {
            event = event.with_data("Channel", channel);
        }
        event.with_message(
            "{} {} {} ch {}",
            ["wifi.beacon", bssid.as_str(), shown, channel_text.as_str()],
        )
    }

    fn probe(&self, view: &WirelessFrameView<'_>, station: MacAddr) -> SniffEvent {
        let ssid = dot11::ssid(view.frame.elements(0)).unwrap_or_default();
        let shown = if ssid.is_empty() { WILDCARD_SSID } else { ssid.as_str() };
        let station_text = station.to_string();
        self.event(view, "wifi.probe", station)
            .with_data("Station", station_text.as_str())
            .with_data("Ssid", ssid.as_str())
            .with_message(
                "{} {} is probing for {}",
                ["wifi.probe", station_text.as_str(), shown],
            )
    }

    fn probe_response(&self, view: &WirelessFrameView<'_>, access_point: MacAddr) -> SniffEvent {
        let frame = &view.frame;
        let ssid = dot11::ssid(frame.elements(BEACON_FIXED_LEN)).unwrap_or_default();
        let bssid = frame.addr3.unwrap_or(access_point).to_string();
        let station = frame.addr1.to_string();
        let mut event = self
            .event(view, "wifi.probe.response", access_point)
            .with_data("Ssid", ssid.as_str())
            .with_data("Bssid", bssid.as_str())
            .with_data("Station", station.as_str());
        if let Some(channel) = dot11::ds_channel(frame.elements(BEACON_FIXED_LEN)) {
            event = event.with_data("Channel", channel);
        }
        let shown = if ssid.is_empty() { HIDDEN_SSID } else { ssid.as_str() };
        event.with_message(
            "{} {} > {} {}",
            ["wifi.probe.response", bssid.as_str(), station.as_str(), shown],
        )
    }

    fn deauth(&self, view: &WirelessFrameView<'_>, transmitter: MacAddr) -> Option<SniffEvent> {
        let frame = &view.frame;
        let kind = if frame.subtype == subtype::DEAUTHENTICATION {
            "deauthentication"
        } else {
            "disassociation"
        };
        let bssid = frame.addr3.unwrap_or(transmitter).to_string();
        let source = transmitter.to_string();
        let destination = frame.addr1.to_string();
        let event = self
            .event(view, "wifi.deauth", transmitter)
            .with_data("Kind", kind)
            .with_data("Bssid", bssid.as_str())
            .with_data("Protected", frame.is_protected());

        // Management frame protection encrypts the reason code.
        if frame.is_protected() {
            return Some(event.with_message(
                "{} {} > {} {} (protected)",
                ["wifi.deauth", source.as_str(), destination.as_str(), kind],
            ));
        }
        let reason = frame.body.get(..2).map(|b| u16::from_le_bytes([b[0], b[1]]))?;
        let reason_text = reason.to_string();
        Some(event.with_data("Reason", reason).with_message(
            "{} {} > {} {} reason {}",
            [
                "wifi.deauth",
                source.as_str(),
                destination.as_str(),
                kind,
                reason_text.as_str(),
            ],
        ))
    }
}

impl WirelessDecoder for Dot11Decoder {
    fn try_handle(
        &self,
        view: &WirelessFrameView<'_>,
        verbose: bool,
        sink: &dyn EventSink,
    ) -> bool {
        match self.decode(view, verbose) {
            Some(event) => {
                sink.push(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemorySink;
    use crate::wireless::dot11::Dot11Frame;
    use crate::wireless::dot11::tests::{AP, STATION, beacon_body, management};

    fn view(data: &[u8]) -> WirelessFrameView<'_> {
        WirelessFrameView {
            timestamp: Some(5.0),
            radiotap: None,
            frame: Dot11Frame::parse(data).unwrap(),
        }
    }

    #[test]
    fn beacons_need_verbose() {
        let data = management(subtype::BEACON, [0xff; 6], AP, &beacon_body("HomeNet", 6, true));
        assert!(Dot11Decoder.decode(&view(&data), false).is_none());

        let event = Dot11Decoder.decode(&view(&data), true).unwrap();
        assert_eq!(event.protocol, "wifi.beacon");
        assert_eq!(event.data["Ssid"], "HomeNet");
        assert_eq!(event.data["Channel"], 6);
        assert_eq!(event.data["Encrypted"], true);
        assert_eq!(
            event.render_message(),
            "wifi.beacon 00:11:22:33:44:55 HomeNet ch 6"
        );
    }

    #[test]
    fn probe_request_reports_station_and_ssid() {
        let body = [0, 7, b'H', b'o', b'm', b'e', b'N', b'e', b't'];
        let data = management(subtype::PROBE_REQUEST, [0xff; 6], STATION, &body);
        let event = Dot11Decoder.decode(&view(&data), false).unwrap();
        assert_eq!(event.source, "66:77:88:99:aa:bb");
        assert_eq!(
            event.render_message(),
            "wifi.probe 66:77:88:99:aa:bb is probing for HomeNet"
        );
    }

    #[test]
    fn wildcard_probe_is_labelled() {
        let data = management(subtype::PROBE_REQUEST, [0xff; 6], STATION, &[0, 0]);
        let event = Dot11Decoder.decode(&view(&data), false).unwrap();
        assert!(event.render_message().ends_with("probing for <any>"));
    }

    #[test]
    fn deauth_reports_reason() {
        let data = management(subtype::DEAUTHENTICATION, STATION, AP, &7u16.to_le_bytes());
        let sink = MemorySink::new();
        assert!(Dot11Decoder.try_handle(&view(&data), false, &sink));
        let events = sink.events();
        let event = &events[0];
        assert_eq!(event.data["Reason"], 7);
        assert_eq!(event.data["Protected"], false);
        assert_eq!(
            event.render_message(),
            "wifi.deauth 00:11:22:33:44:55 > 66:77:88:99:aa:bb deauthentication reason 7"
        );
    }

    #[test]
    fn protected_deauth_hides_reason() {
        let mut data = management(subtype::DEAUTHENTICATION, STATION, AP, &[0; 16]);
        data[1] |= 0x40;
        let event = Dot11Decoder.decode(&view(&data), false).unwrap();
        assert_eq!(event.data["Protected"], true);
        assert!(!event.data.contains_key("Reason"));
        assert_eq!(
            event.render_message(),
            "wifi.deauth 00:11:22:33:44:55 > 66:77:88:99:aa:bb deauthentication (protected)"
        );
    }

    #[test]
    fn other_frames_are_silent() {
        let data = management(subtype::AUTHENTICATION, STATION, AP, &[0; 6]);
        let sink = MemorySink::new();
        assert!(!Dot11Decoder.try_handle(&view(&data), true, &sink));
        assert!(sink.is_empty());
    }
}
