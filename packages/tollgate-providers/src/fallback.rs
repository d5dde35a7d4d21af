/// Deterministic offline embedding: BLAKE3 extendable output over the text, one byte per
/// dimension, each mapped into `[0, 1]`.
pub fn fallback_embedding(text: &str, dimensions: u32) -> Vec<f32> {
	let mut bytes = vec![0_u8; dimensions as usize];
	let mut hasher = blake3::Hasher::new();

	hasher.update(text.as_bytes());
	hasher.finalize_xof().fill(&mut bytes);

	bytes.into_iter().map(|byte| f32::from(byte) / 255.0).collect()
}
