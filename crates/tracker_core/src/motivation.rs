use rand::Rng;

pub const MOTIVATION_QUOTES: [&str; 6] = [
    "Small steps, done daily, change everything.",
    "Consistency beats intensity. Focus on today.",
    "Progress is built quietly.",
    "Focus on today. Results will follow.",
    "Show up. Keep it simple. Repeat.",
    "Discipline is a calm decision, repeated daily.",
];

/// One quote per session, drawn uniformly.
pub fn pick_quote(rng: &mut impl Rng) -> &'static str {
    MOTIVATION_QUOTES[rng.gen_range(0..MOTIVATION_QUOTES.len())]
}
