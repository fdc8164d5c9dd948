//! Variant letter assignment.

use crate::hash::stable_hash;
use crate::ExperimentDefinition;
use std::collections::HashMap;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Letter for a variant ordinal, if one exists.
pub fn letter_for_ordinal(ordinal: usize) -> Option<char> {
    ALPHABET.get(ordinal).map(|&b| b as char)
}

/// One letter per experiment, in definition order.
///
/// The user's bucket picks the first variant whose running weight total is
/// strictly greater than it. Experiments whose weights never pass the bucket,
/// or whose chosen ordinal has no letter, contribute nothing, so the result
/// may be shorter than `definitions`.
pub fn compute_letters(definitions: &[ExperimentDefinition], user_id: &str) -> String {
    let mut letters = String::with_capacity(definitions.len());

    for definition in definitions {
        let key = format!("{user_id}.{}", definition.canonical_name());
        let bucket = i64::from(stable_hash(&key));

        let mut cumulative = 0i64;
        for (ordinal, weight) in definition.variant_weights.iter().enumerate() {
            cumulative = cumulative.saturating_add(*weight);
            if cumulative > bucket {
                if let Some(letter) = letter_for_ordinal(ordinal) {
                    letters.push(letter);
                }
                break;
            }
        }
    }

    letters
}

/// Map every lowercased alias to the letter at its experiment's index.
///
/// Processing stops at the first experiment without a letter at its index;
/// later experiments are left unmapped even if letters exist for them.
pub fn compute_name_to_letter(
    definitions: &[ExperimentDefinition],
    letters: &str,
) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    let mut letters = letters.chars();

    for definition in definitions {
        let Some(letter) = letters.next() else {
            break;
        };
        for name in &definition.names {
            mapping.insert(name.to_lowercase(), letter.to_string());
        }
    }

    mapping
}
