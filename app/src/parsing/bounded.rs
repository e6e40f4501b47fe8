//! Capacity-checked field types.
//!
//! A value of these types never exceeds its bound; the check runs once, at
//! construction.

use core::fmt;
use core::ops::Deref;

use icp_common::ParserError;

/// Byte string of at most `N` bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BoundedBytes<const N: usize>(Vec<u8>);

impl<const N: usize> BoundedBytes<N> {
    pub const CAPACITY: usize = N;

    pub fn new(bytes: &[u8]) -> Result<Self, ParserError> {
        if bytes.len() > N {
            return Err(ParserError::ValueTooLong);
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Takes ownership of `bytes` if it fits.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, ParserError> {
        if bytes.len() > N {
            return Err(ParserError::ValueTooLong);
        }
        Ok(Self(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Deref for BoundedBytes<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for BoundedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Printable ASCII string of at most `N` characters.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BoundedString<const N: usize>(String);

impl<const N: usize> BoundedString<N> {
    pub const CAPACITY: usize = N;

    pub fn new(s: &str) -> Result<Self, ParserError> {
        if s.len() > N {
            return Err(ParserError::ValueTooLong);
        }
        if !s.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ParserError::InvalidCharacters);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Deref for BoundedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_bytes() {
        assert_eq!(BoundedBytes::<4>::new(&[1, 2, 3, 4]).unwrap().len(), 4);
        assert_eq!(BoundedBytes::<4>::new(&[0; 5]), Err(ParserError::ValueTooLong));
        assert!(BoundedBytes::<4>::from_vec(Vec::new()).unwrap().is_empty());
        assert_eq!(format!("{:?}", BoundedBytes::<4>::new(&[0xAB]).unwrap()), "0xab");
    }

    #[test]
    fn test_bounded_string() {
        assert_eq!(BoundedString::<7>::new("send_pb").unwrap().as_str(), "send_pb");
        assert_eq!(BoundedString::<6>::new("send_pb"), Err(ParserError::ValueTooLong));
        assert_eq!(BoundedString::<8>::new("send\npb"), Err(ParserError::InvalidCharacters));
        assert_eq!(BoundedString::<8>::new("sénd"), Err(ParserError::InvalidCharacters));
    }
}
