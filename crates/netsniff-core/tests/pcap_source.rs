use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use etherparse::PacketBuilder;
use netsniff_core::{
    MemorySink, PacketSource, PcapFileSource, SniffOptions, SourceError, sniff_pcap_file,
};
use pcap_parser::Linktype;

fn temp_path(label: &str, extension: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("netsniff_{label}_{unique}.{extension}"))
}

fn udp_packet(dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .udp(40000, dst_port);
    let mut packet = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, payload).unwrap();
    packet
}

fn legacy_pcap(magic: [u8; 4], packets: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (sec, frac, data) in packets {
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&frac.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let padded = body.len().div_ceil(4) * 4;
    let total = (12 + padded) as u32;
    let mut out = block_type.to_le_bytes().to_vec();
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(body);
    out.resize(8 + padded, 0);
    out.extend_from_slice(&total.to_le_bytes());
    out
}

fn pcapng(interfaces: usize, packets: &[(u32, u64, Vec<u8>)]) -> Vec<u8> {
    pcapng_with_tsresol(interfaces, None, packets)
}

/// `tsresol` is the raw `if_tsresol` option byte declared on every interface.
fn pcapng_with_tsresol(
    interfaces: usize,
    tsresol: Option<u8>,
    packets: &[(u32, u64, Vec<u8>)],
) -> Vec<u8> {
    let mut shb = 0x1a2b_3c4du32.to_le_bytes().to_vec();
    shb.extend_from_slice(&1u16.to_le_bytes());
    shb.extend_from_slice(&0u16.to_le_bytes());
    shb.extend_from_slice(&(-1i64).to_le_bytes());
    let mut out = pcapng_block(0x0a0d_0d0a, &shb);

    for _ in 0..interfaces {
        let mut idb = 1u16.to_le_bytes().to_vec();
        idb.extend_from_slice(&0u16.to_le_bytes());
        idb.extend_from_slice(&65535u32.to_le_bytes());
        if let Some(tsresol) = tsresol {
            idb.extend_from_slice(&9u16.to_le_bytes());
            idb.extend_from_slice(&1u16.to_le_bytes());
            idb.extend_from_slice(&[tsresol, 0, 0, 0]);
            idb.extend_from_slice(&[0, 0, 0, 0]);
        }
        out.extend_from_slice(&pcapng_block(1, &idb));
    }

    for (if_id, ticks, data) in packets {
        let mut epb = if_id.to_le_bytes().to_vec();
        epb.extend_from_slice(&((ticks >> 32) as u32).to_le_bytes());
        epb.extend_from_slice(&(*ticks as u32).to_le_bytes());
        epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
        epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
        epb.extend_from_slice(data);
        out.extend_from_slice(&pcapng_block(6, &epb));
    }
    out
}

fn read_all(source: &mut PcapFileSource) -> Vec<netsniff_core::CapturedFrame> {
    let mut frames = Vec::new();
    while let Some(frame) = source.next_frame().unwrap() {
        frames.push(frame);
    }
    frames
}

#[test]
fn legacy_pcap_frames_carry_timestamps_and_linktype() {
    let path = temp_path("legacy", "pcap");
    let bytes = legacy_pcap(
        [0xd4, 0xc3, 0xb2, 0xa1],
        &[
            (1, 500_000, udp_packet(4000, b"one")),
            (2, 0, udp_packet(4000, b"two")),
        ],
    );
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let name = source.name().to_string();
    let frames = read_all(&mut source);
    let _ = fs::remove_file(&path);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].timestamp, Some(1.5));
    assert_eq!(frames[1].timestamp, Some(2.0));
    assert_eq!(frames[0].linktype, Linktype::ETHERNET);
    assert_eq!(frames[0].interface, name);
    assert!(name.starts_with("netsniff_legacy_"));
}

#[test]
fn nanosecond_pcap_scales_fractions() {
    let path = temp_path("nanos", "pcap");
    let bytes = legacy_pcap(
        [0x4d, 0x3c, 0xb2, 0xa1],
        &[(3, 250_000_000, udp_packet(4000, b"ns"))],
    );
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let frames = read_all(&mut source);
    let _ = fs::remove_file(&path);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].timestamp, Some(3.25));
}

#[test]
fn pcapng_enhanced_packets_are_read() {
    let path = temp_path("single", "pcapng");
    let bytes = pcapng(1, &[(0, 1_500_000, udp_packet(4000, b"hello"))]);
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let name = source.name().to_string();
    let frames = read_all(&mut source);
    let _ = fs::remove_file(&path);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].timestamp, Some(1.5));
    assert_eq!(frames[0].linktype, Linktype::ETHERNET);
    assert_eq!(frames[0].interface, name);
}

#[test]
fn pcapng_honours_interface_timestamp_resolution() {
    let path = temp_path("tsresol", "pcapng");
    let bytes = pcapng_with_tsresol(
        1,
        Some(9),
        &[(0, 3_250_000_000, udp_packet(4000, b"ns"))],
    );
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let frames = read_all(&mut source);
    let _ = fs::remove_file(&path);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].timestamp, Some(3.25));
}

#[test]
fn pcapng_with_several_interfaces_labels_frames() {
    let path = temp_path("multi", "pcapng");
    let bytes = pcapng(
        2,
        &[
            (0, 1_000_000, udp_packet(4000, b"a")),
            (1, 2_000_000, udp_packet(4000, b"b")),
        ],
    );
    fs::write(&path, bytes).unwrap();

    let mut source = PcapFileSource::open(&path).unwrap();
    let name = source.name().to_string();
    let frames = read_all(&mut source);
    let _ = fs::remove_file(&path);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].interface, format!("{name}#0"));
    assert_eq!(frames[1].interface, format!("{name}#1"));
}

#[test]
fn sniffing_a_capture_file_emits_events() {
    let path = temp_path("sniff", "pcapng");
    let bytes = pcapng(
        1,
        &[
            (0, 1_000_000, udp_packet(4000, b"noise")),
            (0, 2_000_000, udp_packet(4001, b"more noise")),
        ],
    );
    fs::write(&path, bytes).unwrap();

    let quiet = MemorySink::new();
    let summary = sniff_pcap_file(&path, &quiet, &SniffOptions::default()).unwrap();
    let verbose = MemorySink::new();
    let options = SniffOptions {
        verbose: true,
        ..SniffOptions::default()
    };
    let verbose_summary = sniff_pcap_file(&path, &verbose, &options).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(summary.frames_total, 2);
    assert_eq!(summary.frames_matched, 2);
    assert_eq!(summary.time_start.as_deref(), Some("1970-01-01T00:00:01Z"));
    assert_eq!(summary.time_end.as_deref(), Some("1970-01-01T00:00:02Z"));
    assert!(quiet.is_empty());

    assert_eq!(verbose_summary, summary);
    let events = verbose.take();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].protocol, "udp");
    assert_eq!(events[1].data["Size"], 10);
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let path = temp_path("truncated", "pcapng");
    fs::write(&path, [0x0a, 0x0d, 0x0d]).unwrap();
    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    let _ = fs::remove_file(&path);

    assert!(matches!(err, SourceError::Io(_)));
}
