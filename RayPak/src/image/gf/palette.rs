//! Palette construction for indexed GF textures

use std::collections::HashMap;

use indexmap::IndexMap;

/// Palette entries plus the index of every input pixel
pub(super) struct Indexed {
    pub entries: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

/// Index B, G, R, A pixels against a palette of at most 256 entries.
///
/// Images with 256 colours or fewer are indexed exactly, in order of first
/// appearance. Larger sets keep the 256 most frequent colours and map every
/// other pixel to its nearest entry.
pub(super) fn build_palette(pixels: &[[u8; 4]]) -> Indexed {
    let mut counts: IndexMap<[u8; 4], usize> = IndexMap::new();
    for px in pixels {
        *counts.entry(*px).or_default() += 1;
    }

    let entries: Vec<[u8; 4]> = if counts.len() <= 256 {
        counts.keys().copied().collect()
    } else {
        let mut by_count: Vec<_> = counts.iter().map(|(px, n)| (*px, *n)).collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1));
        by_count.into_iter().take(256).map(|(px, _)| px).collect()
    };

    let mut lookup: HashMap<[u8; 4], u8> = entries
        .iter()
        .enumerate()
        .map(|(i, px)| (*px, i as u8))
        .collect();

    let indices = pixels
        .iter()
        .map(|px| {
            if let Some(&i) = lookup.get(px) {
                return i;
            }
            let nearest = nearest_entry(&entries, *px);
            lookup.insert(*px, nearest);
            nearest
        })
        .collect();

    Indexed { entries, indices }
}

fn nearest_entry(entries: &[[u8; 4]], px: [u8; 4]) -> u8 {
    let distance = |entry: &[u8; 4]| -> u32 {
        entry
            .iter()
            .zip(px)
            .map(|(a, b)| u32::from(a.abs_diff(b)).pow(2))
            .sum()
    };
    entries
        .iter()
        .enumerate()
        .min_by_key(|(_, e)| distance(e))
        .map_or(0, |(i, _)| i as u8)
}
