use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};
use crate::tags::Tag;
use crate::vint::{self, ElementSize};

/// Header of one EBML element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub(crate) tag: Tag,
    /// position of the first byte of the ID
    pub(crate) position: u64,
    pub(crate) header_size: u64,
    pub(crate) size: ElementSize,
}

impl Header {
    pub(crate) fn data_start(&self) -> u64 {
        self.position + self.header_size
    }

    /// End of the element, if its size is known.
    pub(crate) fn end(&self) -> Option<u64> {
        match self.size {
            ElementSize::Known(size) => Some(self.data_start() + size),
            ElementSize::Unknown => None,
        }
    }
}

/// Header of a SimpleBlock or Block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockHeader {
    pub(crate) track_number: u64,
    pub(crate) relative_timestamp: i16,
    pub(crate) flags: u8,
}

impl BlockHeader {
    pub(crate) fn is_laced(&self) -> bool {
        self.flags & 0b0000_0110 != 0
    }
}

/// Reads element headers and leaf values, tracking the current position.
pub(crate) struct ElementReader<R> {
    rdr: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> ElementReader<R> {
    pub(crate) fn new(mut rdr: R) -> Result<Self> {
        let len = rdr.seek(SeekFrom::End(0))?;
        rdr.seek(SeekFrom::Start(0))?;
        Ok(Self {
            rdr,
            position: 0,
            len,
        })
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the input.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn seek_to(&mut self, position: u64) -> Result<()> {
        self.rdr.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    /// Read the next header. `Ok(None)` at the exact end of the input.
    pub(crate) fn next_header(&mut self) -> Result<Option<Header>> {
        if self.position >= self.len {
            return Ok(None);
        }
        let position = self.position;
        let (id, size, header_size) = vint::read_element_id_size(&mut self.rdr)?;
        self.position += header_size;
        Ok(Some(Header {
            tag: Tag::from(id),
            position,
            header_size,
            size,
        }))
    }

    /// End of `header`, checked against the input length.
    fn checked_end(&self, header: &Header) -> Result<u64> {
        let end = header.end().ok_or(Error::UnknownSize {
            tag: header.tag,
            position: header.position,
        })?;
        if end > self.len {
            return Err(Error::Truncated {
                tag: header.tag,
                position: header.position,
            });
        }
        Ok(end)
    }

    /// Skip the data of `header`. The reader must be at its data start.
    pub(crate) fn skip(&mut self, header: &Header) -> Result<()> {
        let end = self.checked_end(header)?;
        self.seek_to(end)
    }

    fn read_data(&mut self, header: &Header, max_size: u64) -> Result<Vec<u8>> {
        let end = self.checked_end(header)?;
        let size = end - header.data_start();
        if size > max_size {
            return Err(Error::DataSize {
                tag: header.tag,
                position: header.position,
                size,
            });
        }
        // `size <= max_size`, which callers keep small.
        let mut buf = vec![0u8; size as usize];
        self.rdr.read_exact(&mut buf)?;
        self.position = end;
        Ok(buf)
    }

    pub(crate) fn read_uint(&mut self, header: &Header) -> Result<u64> {
        let buf = self.read_data(header, 8)?;
        Ok(buf.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub(crate) fn read_float(&mut self, header: &Header) -> Result<f64> {
        let buf = self.read_data(header, 8)?;
        match buf.len() {
            0 => Ok(0.0),
            4 => {
                let mut b = [0u8; 4];
                b.copy_from_slice(&buf);
                Ok(f32::from_be_bytes(b).into())
            }
            8 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&buf);
                Ok(f64::from_be_bytes(b))
            }
            size => Err(Error::DataSize {
                tag: header.tag,
                position: header.position,
                size: size as u64,
            }),
        }
    }

    /// Read an ASCII or UTF-8 string. Trailing NUL padding is removed.
    pub(crate) fn read_string(&mut self, header: &Header) -> Result<String> {
        const MAX_STRING_SIZE: u64 = 64 * 1024;
        let buf = self.read_data(header, MAX_STRING_SIZE)?;
        let text = String::from_utf8_lossy(&buf);
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// Read the header of a (Simple)Block and skip the frame data.
    pub(crate) fn read_block_header(&mut self, header: &Header) -> Result<BlockHeader> {
        let end = self.checked_end(header)?;
        let (track_number, track_len) = vint::read_track_number(&mut self.rdr)?;
        let min_size = track_len + 3;
        if end - header.data_start() < min_size {
            return Err(Error::DataSize {
                tag: header.tag,
                position: header.position,
                size: end - header.data_start(),
            });
        }
        let mut buf = [0u8; 3];
        self.rdr.read_exact(&mut buf)?;
        self.seek_to(end)?;
        Ok(BlockHeader {
            track_number,
            relative_timestamp: i16::from_be_bytes([buf[0], buf[1]]),
            flags: buf[2],
        })
    }
}
