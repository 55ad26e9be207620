//! Procedural generation of plausible Field Day caller identities.
//!
//! A caller identity is a US amateur callsign, a Field Day class, and an
//! ARRL section. The section is not free: it must be consistent with
//! the callsign's call-area digit, so section generation takes the
//! callsign as input and looks the digit up in a fixed ten-entry table.
//!
//! All generators are generic over [`Rng`] so tests can drive them with
//! a seeded [`StdRng`](rand::rngs::StdRng).

use pileup_types::Identity;
use rand::Rng;
use rand::seq::IndexedRandom;

/// Errors that can occur while generating or deriving identity parts.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The callsign carries no call-area digit in either of the two
    /// positions where US callsigns place it, so no section can be
    /// derived. Generator-produced callsigns never trigger this; it
    /// guards against externally supplied callsigns.
    #[error("cannot derive section: no call-area digit in {callsign:?}")]
    NoCallArea {
        /// The offending callsign.
        callsign: String,
    },
}

/// First letters legal for US callsign prefixes.
const PREFIX_LETTERS: [char; 4] = ['A', 'K', 'N', 'W'];

/// Field Day entry categories.
const CATEGORIES: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// The full uppercase alphabet, for suffix and second-prefix letters.
const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Group-A ("A"-prefix) callsigns only use the first half of the
/// alphabet (A--L) for their mandatory second prefix letter.
const GROUP_A_SECOND_LETTERS: usize = 12;

/// ARRL sections by call-area digit, 0 through 9.
const CALL_AREAS: [&str; 10] = [
    "CO MO IA ND KS NE MN SD",
    "CT RI EMA VT ME WMA NH",
    "ENY NNY NLI SNJ NNJ WNY",
    "DE MDC EPA WPA",
    "QL SC GA SFL KY TN NC VA NFL VI PR WCF",
    "AR NTX LA OK MS STX NM WTX",
    "EBA SCV LAX SDG ORG SF PAC SJV SB SV",
    "AK NV AZ OR EWA UT ID WWA MT WY",
    "MI WV OH",
    "IL WI IN",
];

/// Generate a plausible US amateur callsign.
///
/// Grammar: a prefix letter from {A, K, N, W}; if the letter is "A" a
/// second prefix letter from A--L is mandatory, otherwise a second
/// prefix letter is added with probability 1/3; then a single call-area
/// digit; then a suffix of 1--3 letters (1--2 for "A" prefixes) skewed
/// toward lengths 2 and 3. All letters uppercase ASCII.
pub fn generate_callsign(rng: &mut impl Rng) -> String {
    let mut callsign = String::new();

    let prefix = pick_letter(rng, PREFIX_LETTERS.len());
    let prefix = PREFIX_LETTERS.get(prefix).copied().unwrap_or('K');
    callsign.push(prefix);

    let mut add_second_prefix_letter = rng.random_ratio(1, 3);
    if prefix == 'A' {
        // No choice for group A: the second prefix letter is mandatory.
        let idx = pick_letter(rng, GROUP_A_SECOND_LETTERS);
        callsign.push(ALPHABET.get(idx).copied().unwrap_or('A'));
        add_second_prefix_letter = false;
    }

    if add_second_prefix_letter {
        let idx = pick_letter(rng, ALPHABET.len());
        callsign.push(ALPHABET.get(idx).copied().unwrap_or('A'));
    }

    let digit = rng.random_range(0..=9_u32);
    callsign.push(char::from_digit(digit, 10).unwrap_or('0'));

    let suffix_length = if prefix == 'A' {
        rng.random_range(1..=2_usize)
    } else {
        // Skew toward the 2- and 3-letter suffixes that dominate the
        // real callsign population.
        match rng.random_range(0..5_u32) {
            0 => 1,
            1 | 2 => 2,
            _ => 3,
        }
    };

    for _ in 0..suffix_length {
        let idx = pick_letter(rng, ALPHABET.len());
        callsign.push(ALPHABET.get(idx).copied().unwrap_or('A'));
    }

    callsign
}

/// Generate a valid Field Day class.
///
/// Categories C, D, and E are always single-transmitter ("1C", "1D",
/// "1E"); B runs 1--2 transmitters, A runs 3--20, and F runs 1--20.
pub fn generate_class(rng: &mut impl Rng) -> String {
    let idx = pick_letter(rng, CATEGORIES.len());
    let category = CATEGORIES.get(idx).copied().unwrap_or('D');
    match category {
        'C' | 'D' | 'E' => format!("1{category}"),
        'B' => format!("{}B", rng.random_range(1..=2_u32)),
        'A' => format!("{}A", rng.random_range(3..=20_u32)),
        _ => format!("{}F", rng.random_range(1..=20_u32)),
    }
}

/// Generate a section consistent with the callsign's call area.
///
/// # Errors
///
/// Returns [`IdentityError::NoCallArea`] if the callsign has no digit
/// in either the second or third character position.
pub fn generate_section(rng: &mut impl Rng, callsign: &str) -> Result<String, IdentityError> {
    let digit = call_area_digit(callsign).ok_or_else(|| IdentityError::NoCallArea {
        callsign: callsign.to_owned(),
    })?;

    let area = usize::try_from(digit).unwrap_or(0);
    let entry = CALL_AREAS.get(area).copied().unwrap_or_default();
    let sections: Vec<&str> = entry.split_whitespace().collect();

    sections
        .choose(rng)
        .map(|section| String::from(*section))
        .ok_or_else(|| IdentityError::NoCallArea {
            callsign: callsign.to_owned(),
        })
}

/// Generate a complete caller identity.
///
/// # Errors
///
/// Returns [`IdentityError`] only if section derivation fails, which
/// cannot happen for callsigns this module generated itself; an error
/// here indicates a generator defect and should be treated as fatal by
/// the caller.
pub fn generate_identity(rng: &mut impl Rng) -> Result<Identity, IdentityError> {
    let callsign = generate_callsign(rng);
    let class = generate_class(rng);
    let section = generate_section(rng, &callsign)?;
    Ok(Identity {
        callsign,
        class,
        section,
    })
}

/// Extract the call-area digit: the second character if it is a digit,
/// otherwise the third.
fn call_area_digit(callsign: &str) -> Option<u32> {
    let mut chars = callsign.chars();
    let _prefix = chars.next()?;
    let second = chars.next()?;
    if let Some(digit) = second.to_digit(10) {
        return Some(digit);
    }
    chars.next()?.to_digit(10)
}

/// Draw a uniform index below `limit`.
fn pick_letter(rng: &mut impl Rng, limit: usize) -> usize {
    rng.random_range(0..limit)
}
