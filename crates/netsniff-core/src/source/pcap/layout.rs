/// Buffer handed to the pcap-parser readers.
pub const PCAP_READER_BUFFER_SIZE: usize = 65_536;
/// Section header block type, which opens every pcapng file.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
