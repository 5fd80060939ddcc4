use crate::models::HugStyle;

pub const REALISTIC: &str = include_str!("../data/prompts/realistic.txt");
pub const CARTOON: &str = include_str!("../data/prompts/cartoon.txt");

/// Instruction text sent with the photos, one row per style.
pub const STYLE_PROMPTS: &[(HugStyle, &str)] = &[
    (HugStyle::Realistic, REALISTIC),
    (HugStyle::Cartoon, CARTOON),
];

pub fn instruction_for(style: HugStyle) -> &'static str {
    STYLE_PROMPTS
        .iter()
        .find(|&&(s, _)| s == style)
        .map(|&(_, text)| text.trim())
        .unwrap_or_else(|| REALISTIC.trim())
}
