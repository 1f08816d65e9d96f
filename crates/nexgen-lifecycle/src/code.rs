//! Company code generation.

use rand::RngCore;

/// Prefix shared by every company code.
pub const CODE_PREFIX: &str = "NG-";

/// Random bytes behind each code (rendered as two hex digits apiece).
const CODE_BYTES: usize = 4;

/// Generate a candidate company code: `NG-` followed by eight uppercase
/// hex digits. Uniqueness is checked by the caller against both stores.
pub fn generate_company_code() -> String {
    let mut buf = [0u8; CODE_BYTES];
    rand::rng().fill_bytes(&mut buf);

    let mut code = String::with_capacity(CODE_PREFIX.len() + CODE_BYTES * 2);
    code.push_str(CODE_PREFIX);
    for byte in buf {
        code.push_str(&format!("{byte:02X}"));
    }
    code
}

/// Whether `code` has the shape produced by [`generate_company_code`].
pub fn is_company_code(code: &str) -> bool {
    code.strip_prefix(CODE_PREFIX).is_some_and(|rest| {
        rest.len() == CODE_BYTES * 2
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_expected_shape() {
        for _ in 0..100 {
            let code = generate_company_code();
            assert!(is_company_code(&code), "bad code: {code}");
            assert!(code[3..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn codes_are_not_repeated() {
        let a = generate_company_code();
        let b = generate_company_code();
        assert_ne!(a, b);
    }

    #[test]
    fn shape_check_rejects_malformed_codes() {
        assert!(is_company_code("NG-0A1B2C3D"));
        assert!(!is_company_code("NG-0a1b2c3d"));
        assert!(!is_company_code("XX-0A1B2C3D"));
        assert!(!is_company_code("NG-0A1B2C3"));
        assert!(!is_company_code("NG-0A1B2C3D4"));
    }
}
