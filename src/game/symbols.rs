/// Faces a card can show. A board of N pairs draws N distinct entries.
pub const SYMBOL_ALPHABET: [&str; 32] = [
    // Animals
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼",
    "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🦄",
    "🐙", "🦋", "🐞", "🦀", "🐠", "🦕", "🦖", "🐢",
    // Fruits
    "🍎", "🍌", "🍇", "🍉", "🍓", "🍒", "🍑", "🍍",
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn alphabet_has_no_duplicates() {
        let unique: HashSet<_> = SYMBOL_ALPHABET.iter().collect();
        assert_eq!(unique.len(), SYMBOL_ALPHABET.len());
    }
}
