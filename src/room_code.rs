use rand::Rng;

/// Room codes are 4 letters drawn from A-Z minus the two letters most easily
/// misread as digits (I and O), so codes survive being read aloud or copied
/// from a screenshot.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Fixed code length. Codes are the human-shareable invitation token.
pub const CODE_LEN: usize = 4;

/// Draw a random code. Uniqueness is the caller's job: probe the store and
/// regenerate on collision.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercase the input and strip everything outside the code alphabet, the
/// same filter applied to the join form's text field.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| CODE_ALPHABET.contains(&(*c as u8)))
        .collect()
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn generated_codes_are_valid() {
        let mut rng = thread_rng();
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert!(is_valid_code(&code), "invalid code: {}", code);
        }
    }

    #[test]
    fn alphabet_excludes_confusable_letters() {
        assert_eq!(CODE_ALPHABET.len(), 24);
        assert!(!CODE_ALPHABET.contains(&b'I'));
        assert!(!CODE_ALPHABET.contains(&b'O'));
    }

    #[test]
    fn normalize_uppercases_and_strips() {
        assert_eq!(normalize("abcd"), "ABCD");
        assert_eq!(normalize(" a-b c7d "), "ABCD");
        assert_eq!(normalize("io10"), "");
    }

    #[test]
    fn validity_checks_length_and_alphabet() {
        assert!(is_valid_code("ABCD"));
        assert!(!is_valid_code("ABC"));
        assert!(!is_valid_code("ABCDE"));
        assert!(!is_valid_code("ABIO"));
        assert!(!is_valid_code("abcd"));
    }
}
