//! Morse transmission time estimation.
//!
//! The external audio renderer blocks for the real duration of the
//! tone sequence, so every render call needs an upper bound. This
//! module maps a phrase and a code speed to an estimated duration using
//! the standard element weights: a dit is one element, a dah three,
//! intra-character gaps one, and the PARIS convention of 50 elements
//! per word gives `60 / (50 x wpm)` seconds per element.
//!
//! Character weights below already include intra-character gaps ("E" is
//! 1, "0" is 19, a space is 7); one extra inter-character spacing
//! element is charged per character of phrase length, and a fixed two
//! second margin absorbs renderer startup cost.

use std::time::Duration;

/// Fixed safety margin added to every estimate, in seconds.
const SAFETY_MARGIN_SECS: u64 = 2;

/// Milliseconds in the element-time numerator: `60 / (50 x wpm)`
/// seconds is `1200 / wpm` milliseconds.
const ELEMENT_MS_NUMERATOR: u64 = 1200;

/// Errors that can occur when estimating transmission time.
#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    /// The phrase contains a character with no Morse weight. Phrases
    /// are built from generated identities and fixed prowords, so this
    /// indicates a caller defect, not an operator mistake.
    #[error("unsupported character {character:?} in phrase")]
    UnsupportedCharacter {
        /// The character with no element weight.
        character: char,
    },

    /// A speed of zero words per minute never finishes transmitting.
    #[error("code speed must be at least 1 WPM")]
    InvalidSpeed,
}

/// Element weight of a single character, including intra-character
/// gaps. Case-insensitive for ASCII letters.
///
/// Returns `None` for characters outside the supported set.
const fn element_count(character: char) -> Option<u64> {
    let weight = match character.to_ascii_uppercase() {
        'E' => 1,
        'T' => 3,
        'I' => 3,
        'A' | 'N' => 5,
        'S' => 5,
        'D' | 'H' | 'M' | 'R' | 'U' => 7,
        'B' | 'F' | 'G' | 'K' | 'L' | 'V' | 'W' | '5' => 9,
        'C' | 'O' | 'P' | 'X' | 'Z' | '4' | '6' => 11,
        'J' | 'Q' | 'Y' | '3' | '7' | '/' => 13,
        '2' | '8' => 15,
        '1' | '9' | '.' => 17,
        '0' | ',' => 19,
        '?' => 15,
        ' ' => 7,
        _ => return None,
    };
    Some(weight)
}

/// Total element count of a phrase: the per-character weights plus one
/// inter-character spacing element per character.
///
/// # Errors
///
/// Returns [`TimingError::UnsupportedCharacter`] on the first character
/// with no Morse weight.
pub fn phrase_elements(phrase: &str) -> Result<u64, TimingError> {
    let mut elements: u64 = 0;
    for character in phrase.chars() {
        let weight =
            element_count(character).ok_or(TimingError::UnsupportedCharacter { character })?;
        elements = elements.saturating_add(weight).saturating_add(1);
    }
    Ok(elements)
}

/// Estimated whole seconds to transmit `phrase` at `wpm`, including the
/// fixed safety margin.
///
/// # Errors
///
/// Returns [`TimingError::InvalidSpeed`] for zero WPM or
/// [`TimingError::UnsupportedCharacter`] for unweighted characters.
pub fn transmit_seconds(phrase: &str, wpm: u32) -> Result<u64, TimingError> {
    if wpm == 0 {
        return Err(TimingError::InvalidSpeed);
    }
    let elements = phrase_elements(phrase)?;

    // seconds = ceil(elements * (1200 / wpm) ms / 1000)
    let numerator = elements.saturating_mul(ELEMENT_MS_NUMERATOR);
    let denominator = u64::from(wpm).saturating_mul(1000);
    let seconds = numerator.div_ceil(denominator);

    Ok(seconds.saturating_add(SAFETY_MARGIN_SECS))
}

/// [`transmit_seconds`] as a [`Duration`], for use as a timeout.
///
/// # Errors
///
/// Same conditions as [`transmit_seconds`].
pub fn transmit_duration(phrase: &str, wpm: u32) -> Result<Duration, TimingError> {
    transmit_seconds(phrase, wpm).map(Duration::from_secs)
}
