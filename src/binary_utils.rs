use crate::error::ExtractError;

/// Little-endian field reader over a borrowed byte buffer.
///
/// Every accessor names the structure being read, so running out of bytes
/// surfaces as `TruncatedInput` carrying that label instead of a bare I/O
/// error the caller has to translate.
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        StreamReader { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn u16_le(&mut self, reading: &'static str) -> Result<u16, ExtractError> {
        let bytes = self.take(2, reading)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32_le(&mut self, reading: &'static str) -> Result<u32, ExtractError> {
        let bytes = self.take(4, reading)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Borrow the next `length` bytes and advance past them.
    pub fn take(&mut self, length: usize, reading: &'static str) -> Result<&'a [u8], ExtractError> {
        if length > self.remaining() {
            return Err(ExtractError::TruncatedInput(reading));
        }
        let slice = &self.data[self.pos..self.pos + length];
        self.pos += length;
        Ok(slice)
    }

    /// Jump to an absolute offset, as archive metadata tables require.
    pub fn seek(&mut self, position: usize, reading: &'static str) -> Result<(), ExtractError> {
        if position > self.data.len() {
            return Err(ExtractError::TruncatedInput(reading));
        }
        self.pos = position;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_sequence() {
        let data = [0x01, 0x02, 0x10, 0x20, 0x30, 0x40, 0xaa];
        let mut reader = StreamReader::new(&data);

        assert_eq!(reader.u16_le("header").unwrap(), 0x0201);
        assert_eq!(reader.u32_le("header").unwrap(), 0x40302010);
        assert_eq!(reader.take(1, "payload").unwrap(), &[0xaa]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncation_reports_what_was_being_read() {
        let mut reader = StreamReader::new(&[0x01]);

        assert!(matches!(
            reader.u32_le("object header"),
            Err(ExtractError::TruncatedInput("object header"))
        ));
    }

    #[test]
    fn seek_past_the_end_is_truncated_input() {
        let data = [0u8; 4];
        let mut reader = StreamReader::new(&data);

        assert!(reader.seek(4, "table").is_ok());
        assert!(matches!(
            reader.seek(5, "table"),
            Err(ExtractError::TruncatedInput("table"))
        ));
    }
}
