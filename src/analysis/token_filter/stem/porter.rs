//! Porter stemming algorithm implementation.
//!
//! The classic algorithm from M.F. Porter, "An algorithm for suffix
//! stripping" (1980), applied as five rewrite steps:
//!
//! 1. Plurals and -ed/-ing suffixes, terminal y → i
//! 2. -ational → -ate, -tional → -tion, etc.
//! 3. -icate → -ic, -ative → "", etc.
//! 4. Remove -al, -ance, -ence, etc.
//! 5. Remove final -e and reduce -ll
//!
//! # Examples
//!
//! ```
//! use classbench::analysis::token_filter::stem::Stemmer;
//! use classbench::analysis::token_filter::stem::porter::PorterStemmer;
//!
//! let stemmer = PorterStemmer::new();
//!
//! assert_eq!(stemmer.stem("running"), "run");
//! assert_eq!(stemmer.stem("flies"), "fli");
//! assert_eq!(stemmer.stem("traditional"), "tradit");
//! ```

use crate::analysis::token_filter::stem::Stemmer;

const STEP2_A: &[(&str, &str)] = &[("ational", "ate"), ("tional", "tion")];
const STEP2_C: &[(&str, &str)] = &[("enci", "ence"), ("anci", "ance")];
const STEP2_E: &[(&str, &str)] = &[("izer", "ize")];
const STEP2_L: &[(&str, &str)] = &[
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
];
const STEP2_O: &[(&str, &str)] = &[("ization", "ize"), ("ation", "ate"), ("ator", "ate")];
const STEP2_S: &[(&str, &str)] = &[
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
];
const STEP2_T: &[(&str, &str)] = &[("aliti", "al"), ("iviti", "ive"), ("biliti", "ble")];
const STEP2_G: &[(&str, &str)] = &[("logi", "log")];

const STEP3_E: &[(&str, &str)] = &[("icate", "ic"), ("ative", ""), ("alize", "al")];
const STEP3_I: &[(&str, &str)] = &[("iciti", "ic")];
const STEP3_L: &[(&str, &str)] = &[("ical", "ic"), ("ful", "")];
const STEP3_S: &[(&str, &str)] = &[("ness", "")];

/// The Porter stemmer.
///
/// Words shorter than three characters and words containing anything other
/// than lowercase ASCII letters are returned unchanged.
///
/// Output follows Porter's reference implementation, not the extended mode
/// NLTK's `PorterStemmer` uses by default. NLTK maps some short words through
/// a special-case table and only turns a terminal y into i after a consonant
/// that is not the first letter, so stems differ for words such as:
///
/// | word    | here  | NLTK  |
/// |---------|-------|-------|
/// | dying   | dy    | die   |
/// | lying   | ly    | lie   |
/// | cry     | cry   | cri   |
///
/// Vocabularies built with one stemmer do not line up with the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    pub fn new() -> Self {
        PorterStemmer
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.bytes().all(|c| c.is_ascii_lowercase()) {
            return word.to_string();
        }

        let mut state = StemState::new(word);
        state.step1ab();
        if state.k > 0 {
            state.step1c();
            state.step2();
            state.step3();
            state.step4();
            state.step5();
        }
        state.into_stem()
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

/// Working buffer for a single word.
///
/// `k` is the index of the last byte of the current stem and `j` marks the
/// end of the stem left after a suffix match. Both may dip below zero for
/// very short words, hence the signed indices.
struct StemState {
    b: Vec<u8>,
    k: isize,
    j: isize,
}

impl StemState {
    fn new(word: &str) -> Self {
        let b = word.as_bytes().to_vec();
        let k = b.len() as isize - 1;
        StemState { b, k, j: 0 }
    }

    fn at(&self, i: isize) -> u8 {
        self.b[i as usize]
    }

    fn into_stem(self) -> String {
        self.b[..=(self.k as usize)]
            .iter()
            .map(|&c| c as char)
            .collect()
    }

    fn cons(&self, i: isize) -> bool {
        match self.at(i) {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.cons(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in `b[0..=j]`.
    fn m(&self) -> usize {
        let mut n = 0;
        let mut i = 0;
        loop {
            if i > self.j {
                return n;
            }
            if !self.cons(i) {
                break;
            }
            i += 1;
        }
        i += 1;
        loop {
            loop {
                if i > self.j {
                    return n;
                }
                if self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
            n += 1;
            loop {
                if i > self.j {
                    return n;
                }
                if !self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..=self.j).any(|i| !self.cons(i))
    }

    fn double_c(&self, j: isize) -> bool {
        j >= 1 && self.at(j) == self.at(j - 1) && self.cons(j)
    }

    /// consonant-vowel-consonant ending at `i`, where the final consonant
    /// is not w, x or y.
    fn cvc(&self, i: isize) -> bool {
        if i < 2 || !self.cons(i) || self.cons(i - 1) || !self.cons(i - 2) {
            return false;
        }
        !matches!(self.at(i), b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        let s = suffix.as_bytes();
        let len = s.len() as isize;
        if len > self.k + 1 {
            return false;
        }
        let start = (self.k - len + 1) as usize;
        if &self.b[start..=(self.k as usize)] != s {
            return false;
        }
        self.j = self.k - len;
        true
    }

    fn set_to(&mut self, replacement: &str) {
        let start = (self.j + 1) as usize;
        self.b.truncate(start);
        self.b.extend_from_slice(replacement.as_bytes());
        self.k = self.j + replacement.len() as isize;
    }

    fn replace_if_measure(&mut self, replacement: &str) {
        if self.m() > 0 {
            self.set_to(replacement);
        }
    }

    fn apply_first(&mut self, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if self.ends(suffix) {
                self.replace_if_measure(replacement);
                return;
            }
        }
    }

    fn step1ab(&mut self) {
        if self.at(self.k) == b's' {
            if self.ends("sses") {
                self.k -= 2;
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.at(self.k - 1) != b's' {
                self.k -= 1;
            }
        }

        if self.ends("eed") {
            if self.m() > 0 {
                self.k -= 1;
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.k = self.j;
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_c(self.k) {
                self.k -= 1;
                if matches!(self.at(self.k), b'l' | b's' | b'z') {
                    self.k += 1;
                }
            } else if self.m() == 1 && self.cvc(self.k) {
                self.set_to("e");
            }
        }
    }

    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let k = self.k as usize;
            self.b[k] = b'i';
        }
    }

    fn step2(&mut self) {
        let rules = match self.at(self.k - 1) {
            b'a' => STEP2_A,
            b'c' => STEP2_C,
            b'e' => STEP2_E,
            b'l' => STEP2_L,
            b'o' => STEP2_O,
            b's' => STEP2_S,
            b't' => STEP2_T,
            b'g' => STEP2_G,
            _ => return,
        };
        self.apply_first(rules);
    }

    fn step3(&mut self) {
        let rules = match self.at(self.k) {
            b'e' => STEP3_E,
            b'i' => STEP3_I,
            b'l' => STEP3_L,
            b's' => STEP3_S,
            _ => return,
        };
        self.apply_first(rules);
    }

    fn step4(&mut self) {
        let matched = match self.at(self.k - 1) {
            b'a' => self.ends("al"),
            b'c' => self.ends("ance") || self.ends("ence"),
            b'e' => self.ends("er"),
            b'i' => self.ends("ic"),
            b'l' => self.ends("able") || self.ends("ible"),
            b'n' => {
                self.ends("ant") || self.ends("ement") || self.ends("ment") || self.ends("ent")
            }
            b'o' => {
                (self.ends("ion") && self.j >= 0 && matches!(self.at(self.j), b's' | b't'))
                    || self.ends("ou")
            }
            b's' => self.ends("ism"),
            b't' => self.ends("ate") || self.ends("iti"),
            b'u' => self.ends("ous"),
            b'v' => self.ends("ive"),
            b'z' => self.ends("ize"),
            _ => false,
        };
        if matched && self.m() > 1 {
            self.k = self.j;
        }
    }

    fn step5(&mut self) {
        self.j = self.k;
        if self.at(self.k) == b'e' {
            let a = self.m();
            if a > 1 || (a == 1 && !self.cvc(self.k - 1)) {
                self.k -= 1;
            }
        }
        if self.at(self.k) == b'l' && self.double_c(self.k) && self.m() > 1 {
            self.k -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pairs: &[(&str, &str)]) {
        let stemmer = PorterStemmer::new();
        for (word, expected) in pairs {
            assert_eq!(stemmer.stem(word), *expected, "stem({word})");
        }
    }

    #[test]
    fn test_step1_plurals_and_participles() {
        check(&[
            ("caresses", "caress"),
            ("ponies", "poni"),
            ("ties", "ti"),
            ("caress", "caress"),
            ("cats", "cat"),
            ("feed", "feed"),
            ("agreed", "agre"),
            ("plastered", "plaster"),
            ("bled", "bled"),
            ("motoring", "motor"),
            ("sing", "sing"),
            ("conflated", "conflat"),
            ("troubled", "troubl"),
            ("sized", "size"),
            ("hopping", "hop"),
            ("tanned", "tan"),
            ("falling", "fall"),
            ("hissing", "hiss"),
            ("fizzed", "fizz"),
            ("failing", "fail"),
            ("filing", "file"),
        ]);
    }

    #[test]
    fn test_terminal_y() {
        check(&[("happy", "happi"), ("sky", "sky")]);
    }

    #[test]
    fn test_no_nltk_special_cases() {
        check(&[("dying", "dy"), ("lying", "ly"), ("cry", "cry"), ("dies", "di")]);
    }

    #[test]
    fn test_derivational_suffixes() {
        check(&[
            ("relational", "relat"),
            ("conditional", "condit"),
            ("rational", "ration"),
            ("generalization", "gener"),
            ("hopeful", "hope"),
            ("goodness", "good"),
            ("adjustable", "adjust"),
        ]);
    }

    #[test]
    fn test_short_and_foreign_words_unchanged() {
        check(&[("is", "is"), ("a", "a"), ("", ""), ("Running", "Running")]);
    }

    #[test]
    fn test_stemmer_name() {
        assert_eq!(PorterStemmer::new().name(), "porter");
    }
}
