use crate::{Embedding, MnemoService};
use mnemo_domain::{ContextDocument, scoring};

/// Greedily drops documents that are near-duplicates of a higher-ranked survivor.
///
/// `docs` must already be sorted best first. The first document always survives.
pub(crate) async fn deduplicate(
	service: &MnemoService,
	docs: Vec<ContextDocument>,
	threshold: f32,
) -> Vec<ContextDocument> {
	let texts = docs.iter().map(|doc| doc.text.clone()).collect::<Vec<_>>();
	let embeddings = service.embed(&texts).await;
	let keep = select_distinct(&embeddings, threshold);
	let before = docs.len();
	let docs = docs
		.into_iter()
		.zip(keep)
		.filter_map(|(doc, keep)| keep.then_some(doc))
		.collect::<Vec<_>>();

	tracing::debug!(before, after = docs.len(), threshold, "Near-duplicates removed.");

	docs
}

pub(crate) fn select_distinct(embeddings: &[Embedding], threshold: f32) -> Vec<bool> {
	let mut kept: Vec<&Embedding> = Vec::with_capacity(embeddings.len());
	let mut keep = Vec::with_capacity(embeddings.len());

	for embedding in embeddings {
		let duplicate = !embedding.fallback
			&& kept.iter().any(|other| {
				!other.fallback
					&& scoring::cosine_similarity(&embedding.vector, &other.vector)
						.map(|similarity| similarity > threshold)
						.unwrap_or(false)
			});

		if !duplicate {
			kept.push(embedding);
		}

		keep.push(!duplicate);
	}

	keep
}
