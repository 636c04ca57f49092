use rand::Rng;

/// Pick the rows drawn on the map.
///
/// When there are more rows than `sample_size`, draws `sample_size` of them
/// uniformly without replacement; otherwise returns all rows. The result is
/// never longer than `min(sample_size, indices.len())`.
pub fn sample_indices<R: Rng + ?Sized>(indices: &[usize], sample_size: usize, rng: &mut R) -> Vec<usize> {
    if indices.len() <= sample_size {
        return indices.to_vec();
    }
    rand::seq::index::sample(rng, indices.len(), sample_size)
        .into_iter()
        .map(|i| indices[i])
        .collect()
}
