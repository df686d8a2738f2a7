//! The fixed-size DEX file header.
//!
//! This is the only piece of DEX parsing the debugger core needs: the native agent hands back
//! the 112 header bytes of an in-memory DEX, and everything interesting about it (table counts
//! and offsets) lives right there.

use thiserror::Error;

/// Size of the on-disk/in-memory header, in bytes
pub const DEX_HEADER_LEN: usize = 112;

/// The header did not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DexHeaderError {
    /// Fewer than [DEX_HEADER_LEN] bytes were provided
    #[error("dex header needs {DEX_HEADER_LEN} bytes, got {0}")]
    TooShort(usize),
    /// The magic is not `dex\n...\0`
    #[error("dex magic mismatch: {0:#018x}")]
    BadMagic(u64),
}

/// A parsed DEX header. All fields are little-endian on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexHeader {
    pub magic: u64,
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link_size: u32,
    pub link_off: u32,
    pub map_off: u32,
    pub string_ids_size: u32,
    pub string_ids_off: u32,
    pub type_ids_size: u32,
    pub type_ids_off: u32,
    pub proto_ids_size: u32,
    pub proto_ids_off: u32,
    pub field_ids_size: u32,
    pub field_ids_off: u32,
    pub method_ids_size: u32,
    pub method_ids_off: u32,
    pub class_defs_size: u32,
    pub class_defs_off: u32,
    pub data_size: u32,
    pub data_off: u32,
}

/// `dex\n` in the low bytes of the magic
const DEX_MAGIC_PREFIX: u32 = u32::from_le_bytes(*b"dex\n");

struct Reader<'a> {
    data: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn u32(&mut self) -> u32 {
        let value = u32::from_le_bytes(self.data[self.at..self.at + 4].try_into().unwrap());
        self.at += 4;
        value
    }

    fn u64(&mut self) -> u64 {
        let value = u64::from_le_bytes(self.data[self.at..self.at + 8].try_into().unwrap());
        self.at += 8;
        value
    }
}

impl DexHeader {
    /// Parses the leading [DEX_HEADER_LEN] bytes of a DEX file or in-memory DEX image
    pub fn parse(data: &[u8]) -> Result<DexHeader, DexHeaderError> {
        if data.len() < DEX_HEADER_LEN {
            return Err(DexHeaderError::TooShort(data.len()));
        }
        let mut reader = Reader { data, at: 0 };
        let magic = reader.u64();
        if magic as u32 != DEX_MAGIC_PREFIX {
            return Err(DexHeaderError::BadMagic(magic));
        }
        let checksum = reader.u32();
        let mut signature = [0u8; 20];
        signature.copy_from_slice(&data[reader.at..reader.at + 20]);
        reader.at += 20;
        Ok(DexHeader {
            magic,
            checksum,
            signature,
            file_size: reader.u32(),
            header_size: reader.u32(),
            endian_tag: reader.u32(),
            link_size: reader.u32(),
            link_off: reader.u32(),
            map_off: reader.u32(),
            string_ids_size: reader.u32(),
            string_ids_off: reader.u32(),
            type_ids_size: reader.u32(),
            type_ids_off: reader.u32(),
            proto_ids_size: reader.u32(),
            proto_ids_off: reader.u32(),
            field_ids_size: reader.u32(),
            field_ids_off: reader.u32(),
            method_ids_size: reader.u32(),
            method_ids_off: reader.u32(),
            class_defs_size: reader.u32(),
            class_defs_off: reader.u32(),
            data_size: reader.u32(),
            data_off: reader.u32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Vec<u8> {
        let mut data = Vec::with_capacity(DEX_HEADER_LEN);
        data.extend_from_slice(b"dex\n039\0");
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&[7u8; 20]);
        for word in [
            0x1000u32, // file_size
            0x70,      // header_size
            0x12345678, // endian_tag
            0, 0,      // link
            0x900,     // map_off
            10, 0x70,  // string ids
            5, 0xa0,   // type ids
            4, 0xc0,   // proto ids
            3, 0xe0,   // field ids
            2, 0x100,  // method ids
            1, 0x120,  // class defs
            0x800, 0x200, // data
        ] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_sample() {
        let header = DexHeader::parse(&sample_header()).unwrap();
        assert_eq!(header.checksum, 0xDEADBEEF);
        assert_eq!(header.header_size, 0x70);
        assert_eq!(header.string_ids_size, 10);
        assert_eq!(header.method_ids_off, 0x100);
        assert_eq!(header.data_off, 0x200);
        assert_eq!(header.signature, [7u8; 20]);
    }

    #[test]
    fn test_short_and_bad_magic() {
        assert_eq!(
            DexHeader::parse(&[0; 10]),
            Err(DexHeaderError::TooShort(10))
        );
        let mut data = sample_header();
        data[0] = b'x';
        assert!(matches!(
            DexHeader::parse(&data),
            Err(DexHeaderError::BadMagic(_))
        ));
    }
}
