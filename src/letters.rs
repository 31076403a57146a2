use rand::Rng;

/// Letters a round can prompt with. Q, X, Y and Z are left out since almost
/// no common term starts with them.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPRSTUVW";

/// Draw the prompt letter for a round, uniformly over [`ALPHABET`].
pub fn draw_letter() -> char {
    let idx = rand::thread_rng().gen_range(0..ALPHABET.len());
    ALPHABET.as_bytes()[idx] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_inside_alphabet() {
        for _ in 0..200 {
            let c = draw_letter();
            assert!(ALPHABET.contains(c), "unexpected letter {c}");
        }
    }

    #[test]
    fn alphabet_is_uppercase_ascii() {
        assert!(ALPHABET.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn hard_letters_are_excluded() {
        for c in ['Q', 'X', 'Y', 'Z'] {
            assert!(!ALPHABET.contains(c));
        }
    }
}
