/// Nibble is a 4-bit value (0-15)
pub type Nibble = u8;

/// Expand a byte key into the nibble path the trie matches on
///
/// Each byte is split into two nibbles (4-bit values), high nibble first.
/// For example, the byte 0xAB becomes two nibbles: 0xA and 0xB.
pub fn bytes_to_nibbles(bytes: &[u8]) -> Vec<Nibble> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);

    for &byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }

    nibbles
}

/// Convert a vector of nibbles back to bytes
///
/// Every two nibbles are combined into a single byte.
/// A trailing odd nibble fills the high half of the last byte.
pub fn nibbles_to_bytes(nibbles: &[Nibble]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|chunk| match chunk {
            [high, low] => (high << 4) | low,
            [high] => high << 4,
            _ => 0,
        })
        .collect()
}

/// Render nibbles as lowercase hex characters, one per nibble
pub fn nibbles_to_hex(nibbles: &[Nibble]) -> String {
    nibbles
        .iter()
        .map(|&nibble| char::from_digit(u32::from(nibble & 0x0F), 16).unwrap_or('?'))
        .collect()
}

/// Length of the longest shared leading run of two nibble paths
pub fn common_prefix_len(a: &[Nibble], b: &[Nibble]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Compact encoding for paths in extension and leaf nodes
///
/// The first nibble of the compact encoding contains flags:
/// - bit 0 (0x10 in the first byte) is the parity of the path length
/// - bit 1 (0x20 in the first byte) marks a leaf path
///
/// For example:
/// - [0, 1, 2, 3, 4, 5] as an extension path becomes [0x00, 0x01, 0x23, 0x45]
/// - [0, 1, 2, 3, 4, 5] as a leaf path becomes [0x20, 0x01, 0x23, 0x45]
/// - [1, 2, 3, 4, 5] as an extension path becomes [0x11, 0x23, 0x45]
/// - [1, 2, 3, 4, 5] as a leaf path becomes [0x31, 0x23, 0x45]
pub fn compact_encode(nibbles: &[Nibble], is_leaf: bool) -> Vec<u8> {
    let mut compact = Vec::with_capacity(nibbles.len() / 2 + 1);
    let mut first_byte = if is_leaf { 0x20 } else { 0x00 };

    let rest = if nibbles.len() % 2 != 0 {
        first_byte |= 0x10;
        compact.push(first_byte | nibbles[0]);
        &nibbles[1..]
    } else {
        compact.push(first_byte);
        nibbles
    };

    compact.extend(rest.chunks(2).map(|pair| (pair[0] << 4) | pair[1]));
    compact
}

/// Decode a compact encoding back to nibbles and the leaf flag
///
/// This is the reverse of compact_encode.
pub fn compact_decode(compact: &[u8]) -> (Vec<Nibble>, bool) {
    let Some((&first_byte, rest)) = compact.split_first() else {
        return (Vec::new(), false);
    };

    let is_leaf = (first_byte & 0x20) != 0;
    let is_odd = (first_byte & 0x10) != 0;

    let mut nibbles = Vec::with_capacity(rest.len() * 2 + 1);
    if is_odd {
        nibbles.push(first_byte & 0x0F);
    }
    nibbles.extend(bytes_to_nibbles(rest));

    (nibbles, is_leaf)
}
