use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Length of every compatibility and invite code
pub const CODE_LENGTH: usize = 8;

const TIME_PART: usize = 3;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a fresh code: 3 base-36 digits of the issuance second, then 5 random characters
///
/// The time part cycles every 36^3 seconds (about 13 hours); uniqueness comes
/// from the 36^5 random tail plus the store's duplicate-key check.
pub fn generate_code(issued_at: DateTime<Utc>) -> String {
    let mut code = String::with_capacity(CODE_LENGTH);

    let mut seconds = issued_at.timestamp().unsigned_abs();
    let mut time_part = [b'0'; TIME_PART];
    for slot in time_part.iter_mut().rev() {
        *slot = ALPHABET[(seconds % 36) as usize];
        seconds /= 36;
    }
    code.extend(time_part.iter().map(|b| *b as char));

    let random = Uuid::new_v4().as_u128();
    let mut bits = random;
    for _ in TIME_PART..CODE_LENGTH {
        code.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }

    code
}

/// Normalise user input: trim and uppercase
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// True when a normalised code has the fixed length and only alphanumerics
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
