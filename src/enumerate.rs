//! Lazy enumeration of every fixed-length string over a charset.
//!
//! For each length from `min` to `max` the candidates are produced in
//! mixed-radix order: position 0 is the most significant digit, and each
//! digit walks the charset in its given order. Only the current digit
//! indices and one string buffer are held, so memory is O(L) no matter how
//! many candidates the range contains.

use crate::config::{Charset, LengthRange};

/// Producer of candidate sequences for a charset and length range.
///
/// The enumerator itself holds no position; every call to [`produce`]
/// starts a fresh sequence from the first candidate of the minimum length.
///
/// [`produce`]: Enumerator::produce
#[derive(Debug, Clone)]
pub struct Enumerator {
    charset: Vec<char>,
    lengths: LengthRange,
}

impl Enumerator {
    pub fn new(charset: &Charset, lengths: LengthRange) -> Self {
        Self {
            charset: charset.chars().to_vec(),
            lengths,
        }
    }

    /// Start a new sequence from the beginning.
    pub fn produce(&self) -> Candidates {
        Candidates::new(self.charset.clone(), self.lengths)
    }
}

/// Cursor over one enumeration. Owned by the caller.
#[derive(Debug)]
pub struct Candidates {
    charset: Vec<char>,
    max_len: usize,
    /// Length currently being enumerated.
    length: usize,
    /// One charset index per position, most significant first.
    digits: Vec<usize>,
    buf: String,
    /// The candidate for `digits` has not been handed out yet.
    pending: bool,
    done: bool,
}

impl Candidates {
    fn new(charset: Vec<char>, lengths: LengthRange) -> Self {
        let max_bytes = charset.iter().map(|c| c.len_utf8()).max().unwrap_or(0);
        let mut cands = Self {
            charset,
            max_len: lengths.max(),
            length: lengths.min(),
            digits: Vec::with_capacity(lengths.max()),
            buf: String::with_capacity(lengths.max() * max_bytes),
            pending: false,
            done: false,
        };
        cands.start_length(lengths.min());
        cands
    }

    /// Length of the candidate most recently returned (or about to be).
    #[inline]
    pub fn current_length(&self) -> usize {
        self.length
    }

    /// Reset the odometer to the first candidate of `len`, skipping lengths
    /// that have no candidates (any length >= 1 over an empty charset).
    fn start_length(&mut self, len: usize) {
        self.length = len;
        if len > 0 && self.charset.is_empty() {
            self.done = true;
            self.pending = false;
            return;
        }
        self.digits.clear();
        self.digits.resize(len, 0);
        self.pending = true;
    }

    /// Advance the odometer by one. Returns false when the current length
    /// is exhausted.
    fn increment(&mut self) -> bool {
        let radix = self.charset.len();
        for pos in (0..self.digits.len()).rev() {
            self.digits[pos] += 1;
            if self.digits[pos] < radix {
                return true;
            }
            self.digits[pos] = 0;
        }
        false
    }

    fn render(&mut self) {
        self.buf.clear();
        for &d in &self.digits {
            self.buf.push(self.charset[d]);
        }
    }

    /// Next candidate, borrowed from the cursor's internal buffer.
    ///
    /// The returned slice is valid until the next call. No allocation takes
    /// place after construction.
    pub fn next_candidate(&mut self) -> Option<&str> {
        if self.done {
            return None;
        }
        if !self.pending && !self.increment() {
            if self.length >= self.max_len {
                self.done = true;
                return None;
            }
            self.start_length(self.length + 1);
            if self.done {
                return None;
            }
        }
        self.pending = false;
        self.render();
        Some(self.buf.as_str())
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_candidate().map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(charset: &str, min: usize, max: usize) -> Vec<String> {
        let cs = Charset::new(charset).unwrap();
        Enumerator::new(&cs, LengthRange::new(min, max).unwrap())
            .produce()
            .collect()
    }

    #[test]
    fn test_binary_length_three_order() {
        assert_eq!(
            collect("01", 3, 3),
            vec!["000", "001", "010", "011", "100", "101", "110", "111"]
        );
    }

    #[test]
    fn test_order_follows_charset_not_codepoints() {
        assert_eq!(collect("ba", 2, 2), vec!["bb", "ba", "ab", "aa"]);
    }

    #[test]
    fn test_zero_length_yields_empty_string_once() {
        assert_eq!(collect("x", 0, 0), vec![""]);
        assert_eq!(collect("ab", 0, 1), vec!["", "a", "b"]);
    }

    #[test]
    fn test_lengths_ascend() {
        let out = collect("ab", 1, 3);
        assert_eq!(out.len(), 2 + 4 + 8);
        assert_eq!(&out[..6], &["a", "b", "aa", "ab", "ba", "bb"]);
        assert_eq!(out.last().unwrap(), "bbb");
        assert!(out.windows(2).all(|w| w[0].len() <= w[1].len()));
    }

    #[test]
    fn test_single_char_charset() {
        assert_eq!(collect("z", 1, 4), vec!["z", "zz", "zzz", "zzzz"]);
    }

    #[test]
    fn test_duplicates_are_distinct_digits() {
        assert_eq!(collect("aa", 2, 2), vec!["aa", "aa", "aa", "aa"]);
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(collect("é€", 2, 2), vec!["éé", "é€", "€é", "€€"]);
    }

    #[test]
    fn test_empty_charset() {
        let cs = Charset::from_chars(Vec::new());
        let none: Vec<String> = Enumerator::new(&cs, LengthRange::new(1, 3).unwrap())
            .produce()
            .collect();
        assert!(none.is_empty());

        let only_empty: Vec<String> = Enumerator::new(&cs, LengthRange::new(0, 3).unwrap())
            .produce()
            .collect();
        assert_eq!(only_empty, vec![""]);
    }

    #[test]
    fn test_produce_restarts_from_beginning() {
        let cs = Charset::new("abc").unwrap();
        let en = Enumerator::new(&cs, LengthRange::new(1, 2).unwrap());
        let mut first = en.produce();
        first.next();
        first.next();
        let fresh: Vec<String> = en.produce().take(2).collect();
        assert_eq!(fresh, vec!["a", "b"]);
    }

    #[test]
    fn test_current_length_tracks_position() {
        let cs = Charset::new("ab").unwrap();
        let mut c = Enumerator::new(&cs, LengthRange::new(1, 2).unwrap()).produce();
        assert_eq!(c.next_candidate(), Some("a"));
        assert_eq!(c.current_length(), 1);
        c.next_candidate();
        assert_eq!(c.next_candidate(), Some("aa"));
        assert_eq!(c.current_length(), 2);
    }

    #[test]
    fn test_exhausted_stays_exhausted() {
        let cs = Charset::new("a").unwrap();
        let mut c = Enumerator::new(&cs, LengthRange::new(1, 1).unwrap()).produce();
        assert_eq!(c.next_candidate(), Some("a"));
        assert_eq!(c.next_candidate(), None);
        assert_eq!(c.next_candidate(), None);
    }

    #[test]
    fn test_large_space_is_lazy() {
        // 62^10 candidates; only the first few are ever computed.
        let cs = Charset::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz")
            .unwrap();
        let mut c = Enumerator::new(&cs, LengthRange::new(10, 10).unwrap()).produce();
        assert_eq!(c.next_candidate(), Some("0000000000"));
        assert_eq!(c.next_candidate(), Some("0000000001"));
    }
}
