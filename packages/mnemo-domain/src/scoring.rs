use std::cmp::Ordering;

use time::{
	Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
	macros::format_description,
};

/// Lowest recency score; keeps arbitrarily old documents rankable.
pub const RECENCY_FLOOR: f32 = 0.1;
/// Age in days at which the recency score drops to one half.
pub const RECENCY_HALF_LIFE_DAYS: f32 = 30.0;
/// Share of the prior combined score kept when blending in a rerank score.
pub const RERANK_PRIOR_WEIGHT: f32 = 0.8;

pub fn similarity_from_distance(distance: f32) -> f32 {
	if !distance.is_finite() {
		return 0.0;
	}

	(1.0 - distance).clamp(0.0, 1.0)
}

pub fn recency_score(age_days: i64) -> f32 {
	let age = age_days.max(0) as f32;

	(1.0 / (1.0 + age / RECENCY_HALF_LIFE_DAYS)).max(RECENCY_FLOOR)
}

/// Recency for a stored timestamp. Missing or unparsable timestamps count as fresh.
pub fn recency_from_timestamp(raw: Option<&str>, now: OffsetDateTime) -> f32 {
	let Some(stored) = raw.and_then(parse_timestamp) else {
		return 1.0;
	};
	let now = PrimitiveDateTime::new(now.date(), now.time());

	recency_score((now - stored).whole_days())
}

/// Parses RFC 3339 or naive ISO-8601 timestamps, keeping the wall-clock value and dropping
/// any offset.
pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}
	if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
		return Some(PrimitiveDateTime::new(parsed.date(), parsed.time()));
	}

	let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
	let with_t =
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
	let with_space =
		format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");

	if let Ok(parsed) = PrimitiveDateTime::parse(naive, with_t) {
		return Some(parsed);
	}
	if let Ok(parsed) = PrimitiveDateTime::parse(naive, with_space) {
		return Some(parsed);
	}

	Date::parse(naive, format_description!("[year]-[month]-[day]"))
		.ok()
		.map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
}

pub fn combined_score(similarity: f32, recency: f32, recency_weight: f32) -> f32 {
	(1.0 - recency_weight) * similarity + recency_weight * recency
}

/// Affine rescale of a raw cross-encoder score into [0, 1].
pub fn normalize_rerank_score(raw: f32) -> f32 {
	if !raw.is_finite() {
		return 0.0;
	}

	((raw + 1.0) / 2.0).clamp(0.0, 1.0)
}

pub fn blend_rerank(prior: f32, normalized_rerank: f32) -> f32 {
	RERANK_PRIOR_WEIGHT * prior + (1.0 - RERANK_PRIOR_WEIGHT) * normalized_rerank
}

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
