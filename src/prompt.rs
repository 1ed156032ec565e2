//! Prompt construction for the roadmap request.
//!
//! The template carries `{NAME}` placeholders. Values are resolved up front
//! into an ordered list of `(Placeholder, String)` pairs and applied in one
//! left-to-right scan: a token must match a placeholder name exactly, every
//! occurrence is replaced, and substituted text is never scanned again.

use std::borrow::Cow;
use std::num::IntErrorKind;

use crate::models::UserProfile;

/// Base used for derived ages when the age field has no usable integer
pub const DEFAULT_AGE: i64 = 13;

pub const BASE_PROMPT: &str = "
You are {PERSONA_NAME}. I am a {USER_AGE}-year-old {USER_GENDER} in China who is passionate about {USER_DREAM}.
Provide a detailed 5-year roadmap (from age {USER_AGE} to {USER_AGE_PLUS_5}) for my growth.

{PERSONA_CONTEXT}

Your response must be structured as follows:
1. **The Core Philosophy**: Explain your unique approach to learning and technology in the context of {USER_DREAM}.
2. **5-Year Growth Roadmap**: A year-by-year breakdown (Age {USER_AGE}, {USER_AGE_PLUS_1}, {USER_AGE_PLUS_2}, {USER_AGE_PLUS_3}, {USER_AGE_PLUS_4}/{USER_AGE_PLUS_5}).
3. **The Practical Toolbelt**: Specific tools, languages, and platforms relevant to {USER_DREAM} (mentioning Chinese-friendly resources like Bilibili, local communities, or global ones).
4. **Ethics & The Future**: How to stay legal, ethical, and ahead of trends in this field.
5. **A Personal Message**: A short, inspiring closing statement in your unique voice.

Language: Chinese (Simplified) for the advice content, but keep technical terms in English where appropriate. Use Google Search to find current (2025) platforms and competitions relevant to a student in China.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    PersonaName,
    UserAge,
    UserAgePlus(u8),
    UserGender,
    UserDream,
    PersonaContext,
}

impl Placeholder {
    /// Token name as written between braces in the template
    pub fn token(&self) -> Cow<'static, str> {
        match self {
            Placeholder::PersonaName => "PERSONA_NAME".into(),
            Placeholder::UserAge => "USER_AGE".into(),
            Placeholder::UserAgePlus(n) => format!("USER_AGE_PLUS_{n}").into(),
            Placeholder::UserGender => "USER_GENDER".into(),
            Placeholder::UserDream => "USER_DREAM".into(),
            Placeholder::PersonaContext => "PERSONA_CONTEXT".into(),
        }
    }
}

/// Lenient integer parse of the age field: leading whitespace and an optional
/// sign, then digits; anything after the digits is ignored. Falls back to
/// [`DEFAULT_AGE`] when no digits are found or the value is zero. Values
/// beyond the `i64` range saturate.
pub fn derived_age_base(age: &str) -> i64 {
    let s = age.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = match digits[..end].parse::<i64>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(_) => return DEFAULT_AGE,
    };
    match (magnitude, negative) {
        (0, _) => DEFAULT_AGE,
        (n, true) => -n,
        (n, false) => n,
    }
}

/// The instruction telling the model whose voice to use
pub fn persona_context(persona_name: &str, dream: &str, description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(desc) => format!("Follow your specific philosophy: {desc}"),
        None => format!(
            "Fully adopt the persona, speaking style, and known philosophy of {persona_name}. \
             Infer their likely advice based on their public history and achievements \
             regarding {dream}."
        ),
    }
}

/// Resolve every placeholder value for one request, in substitution order
pub fn placeholder_values(
    persona_name: &str,
    profile: &UserProfile,
    description: Option<&str>,
) -> Vec<(Placeholder, String)> {
    let base = derived_age_base(&profile.age);
    let mut values = vec![
        (Placeholder::PersonaName, persona_name.to_string()),
        (Placeholder::UserAge, profile.age.clone()),
        (Placeholder::UserGender, profile.gender.clone()),
        (Placeholder::UserDream, profile.dream.clone()),
    ];
    values.extend((1..=5u8).map(|n| {
        let derived = base.saturating_add(i64::from(n));
        (Placeholder::UserAgePlus(n), derived.to_string())
    }));
    values.push((
        Placeholder::PersonaContext,
        persona_context(persona_name, &profile.dream, description),
    ));
    values
}

/// Apply `values` to `template`. Unknown `{...}` sequences are copied through.
pub fn render_template(template: &str, values: &[(Placeholder, String)]) -> String {
    let tokens: Vec<(Cow<'static, str>, &str)> = values
        .iter()
        .map(|(p, v)| (p.token(), v.as_str()))
        .collect();

    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let resolved = after.find('}').and_then(|close| {
            let name = &after[..close];
            tokens
                .iter()
                .find(|(token, _)| token.as_ref() == name)
                .map(|(_, value)| (*value, close))
        });
        match resolved {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds the roadmap instruction sent to the advice service
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: Cow<'static, str>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: Cow::Borrowed(BASE_PROMPT),
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: Cow::Owned(template.into()),
        }
    }

    pub fn build(
        &self,
        persona_name: &str,
        profile: &UserProfile,
        description: Option<&str>,
    ) -> String {
        let values = placeholder_values(persona_name, profile, description);
        render_template(&self.template, &values)
    }
}
