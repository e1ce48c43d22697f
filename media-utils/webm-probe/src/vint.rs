// Copyright 2017-2022 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! EBML variable-length integers.
//!
//! Element IDs and element sizes share one encoding: the count of leading
//! zero bits gives the total length, and the remaining `7 * len` bits hold
//! the value. IDs keep their marker bit, sizes drop it.

use std::io::Read;

use bitstream_io::BitRead;

use crate::error::{Error, Result};

type BitReader<R> = bitstream_io::BitReader<R, bitstream_io::BigEndian>;

/// Size field of an element header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    Known(u64),
    /// All value bits set. Written by muxers which cannot seek back to
    /// patch the size, e.g. live recorders.
    Unknown,
}

fn map_io(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::Eof
    } else {
        Error::Io(err)
    }
}

/// Read a raw vint, returning `(value, encoded length)`.
pub(crate) fn read_vint<R: BitRead>(r: &mut R) -> Result<(u64, u64)> {
    let leading_zeros = r.read_unary1().map_err(map_io)?;
    if leading_zeros > 7 {
        return Err(Error::InvalidSize);
    }
    let len = u64::from(leading_zeros) + 1;
    let value: u64 = r.read(7 * (leading_zeros + 1)).map_err(map_io)?;
    Ok((value, len))
}

pub(crate) fn read_element_id<R: BitRead>(r: &mut R) -> Result<(u32, u64)> {
    let (value, len) = match read_vint(r) {
        Ok(v) => v,
        Err(Error::InvalidSize) => return Err(Error::InvalidId),
        Err(e) => return Err(e),
    };
    if len > 4 {
        return Err(Error::InvalidId);
    }
    let marker = 1u64 << (7 * len);
    // `len <= 4` so this fits in 32 bits.
    Ok(((marker | value) as u32, len))
}

pub(crate) fn read_element_size<R: BitRead>(r: &mut R) -> Result<(ElementSize, u64)> {
    let (value, len) = read_vint(r)?;
    let all_ones = (1u64 << (7 * len)) - 1;
    let size = if value == all_ones {
        ElementSize::Unknown
    } else {
        ElementSize::Known(value)
    };
    Ok((size, len))
}

/// Read an element header: `(id, size, header length)`.
pub(crate) fn read_element_id_size<R: Read>(reader: &mut R) -> Result<(u32, ElementSize, u64)> {
    let mut r = BitReader::new(reader);
    let (id, id_len) = read_element_id(&mut r)?;
    let (size, size_len) = read_element_size(&mut r)?;
    Ok((id, size, id_len + size_len))
}

/// Read a vint with its marker removed, as used for block track numbers.
pub(crate) fn read_track_number<R: Read>(reader: &mut R) -> Result<(u64, u64)> {
    let mut r = BitReader::new(reader);
    read_vint(&mut r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(buf: &[u8]) -> Result<(u32, ElementSize, u64)> {
        let mut cursor = std::io::Cursor::new(buf);
        read_element_id_size(&mut cursor)
    }

    #[test]
    fn one_byte_id_and_size() {
        let (id, size, len) = header(&[0xA3, 0x85]).unwrap();
        assert_eq!(id, 0xA3);
        assert_eq!(size, ElementSize::Known(5));
        assert_eq!(len, 2);
    }

    #[test]
    fn four_byte_id_and_eight_byte_size() {
        let (id, size, len) = header(&[
            0x18, 0x53, 0x80, 0x67, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
        ])
        .unwrap();
        assert_eq!(id, 0x1853_8067);
        assert_eq!(size, ElementSize::Known(256));
        assert_eq!(len, 12);
    }

    #[test]
    fn unknown_sizes() {
        let (_, size, _) = header(&[0x1F, 0x43, 0xB6, 0x75, 0xFF]).unwrap();
        assert_eq!(size, ElementSize::Unknown);
        let (_, size, _) = header(&[
            0x18, 0x53, 0x80, 0x67, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ])
        .unwrap();
        assert_eq!(size, ElementSize::Unknown);
    }

    #[test]
    fn zero_byte_is_invalid_id() {
        assert!(matches!(header(&[0x00, 0x81]), Err(Error::InvalidId)));
    }

    #[test]
    fn five_byte_id_is_rejected() {
        assert!(matches!(
            header(&[0x08, 0x00, 0x00, 0x00, 0x00, 0x81]),
            Err(Error::InvalidId)
        ));
    }

    #[test]
    fn short_input_is_eof() {
        assert!(matches!(header(&[0x1A, 0x45]), Err(Error::Eof)));
        assert!(matches!(header(&[]), Err(Error::Eof)));
    }
}
