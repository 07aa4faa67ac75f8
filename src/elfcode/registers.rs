// elfcode/registers.rs
use std::fmt;
use std::ops::{Index, IndexMut};

pub const REGISTER_COUNT: usize = 6;

pub type Word = i64;

/// The six general purpose registers. Plain value type: copy it freely.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterFile(pub [Word; REGISTER_COUNT]);

impl RegisterFile {
    #[inline] pub fn read(&self, r: usize) -> Word { self.0[r] }
    #[inline] pub fn write(&mut self, r: usize, v: Word) { self.0[r] = v; }

    /// `true` when `r` names one of the six registers.
    #[inline] pub fn is_valid(r: Word) -> bool { (0..REGISTER_COUNT as Word).contains(&r) }

    /// Accepts 1 to 6 values; missing trailing registers start at zero.
    pub fn from_slice(values: &[Word]) -> Option<Self> {
        if values.len() > REGISTER_COUNT {
            return None;
        }
        let mut regs = [0; REGISTER_COUNT];
        regs[..values.len()].copy_from_slice(values);
        Some(Self(regs))
    }
}

impl Index<usize> for RegisterFile {
    type Output = Word;
    fn index(&self, r: usize) -> &Word { &self.0[r] }
}

impl IndexMut<usize> for RegisterFile {
    fn index_mut(&mut self, r: usize) -> &mut Word { &mut self.0[r] }
}

// same shape as a debug-printed list: [0, 5, 0, 0, 0, 0]
impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_pads_with_zero() {
        let regs = RegisterFile::from_slice(&[3, 2, 1, 1]).unwrap();
        assert_eq!(regs, RegisterFile([3, 2, 1, 1, 0, 0]));
        assert!(RegisterFile::from_slice(&[0; 7]).is_none());
    }

    #[test]
    fn display_matches_list_format() {
        let regs = RegisterFile([1, 5, 0, 0, 0, 0]);
        assert_eq!(regs.to_string(), "[1, 5, 0, 0, 0, 0]");
    }
}
