pub(crate) mod headers;
pub(crate) mod reader;

pub(crate) use headers::HeaderBlock;
pub(crate) use reader::ByteReader;
