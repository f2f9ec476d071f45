// WSC scenario scripts ship obfuscated with a per-byte 2-bit circular
// rotation. Rotating right recovers the plain script; rotating left puts it
// back the way the engine expects.

pub fn decode(data: &[u8]) -> Vec<u8> {
    data.iter().map(|byte| byte.rotate_right(2)).collect()
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    data.iter().map(|byte| byte.rotate_left(2)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rotates_right_two_bits() {
        assert_eq!(decode(&[0b0000_0001]), vec![0b0100_0000]);
        assert_eq!(decode(&[0b0000_0110]), vec![0b1000_0001]);
    }

    #[test]
    fn encode_inverts_decode_for_all_bytes() {
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(encode(&decode(&all)), all);
        assert_eq!(decode(&encode(&all)), all);
    }
}
