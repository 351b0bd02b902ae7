use std::fmt;

/// Displays a byte slice as lowercase hex.
pub(crate) struct Hex<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Hex<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Builds a byte buffer from a hex string. Whitespace between bytes is allowed.
#[cfg(test)]
pub(crate) fn parse(s: &str) -> Vec<u8> {
    let digits: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(digits.len() % 2 == 0, "odd number of hex digits");

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16).unwrap()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(parse("00abff"), &[0x00, 0xab, 0xff]);
        assert_eq!(parse("00 ab ff"), &[0x00, 0xab, 0xff]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Hex(&[0x00, 0xab, 0xff]).to_string(), "00abff");
    }
}
