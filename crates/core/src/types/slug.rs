//! URL-safe slugs and per-collection slug allocation.
//!
//! A slug is derived from a record's human-readable name and must be unique
//! within its collection. Products and categories have independent
//! namespaces, so the same slug may appear once in each.
//!
//! Allocation is pure: callers fetch the existing slugs (usually by prefix
//! from the database) and pass them in. The database unique constraint is
//! still the final arbiter when two writers race on the same name.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving or parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The name contains no ASCII letters or digits, so no slug can be derived.
    #[error("\"{input}\" does not contain any letters or digits")]
    Empty {
        /// The name that normalized to nothing.
        input: String,
    },
    /// The string is not a well-formed slug.
    #[error("\"{0}\" is not a valid slug (lowercase letters, digits and single hyphens only)")]
    Malformed(String),
}

/// A validated, URL-safe slug.
///
/// ## Constraints
///
/// - Non-empty
/// - Only `a-z`, `0-9` and `-`
/// - No leading, trailing or repeated hyphens
///
/// ## Examples
///
/// ```
/// use shopwright_core::Slug;
///
/// assert!(Slug::parse("classic-white-t-shirt").is_ok());
/// assert!(Slug::parse("shirt-2").is_ok());
///
/// assert!(Slug::parse("").is_err());
/// assert!(Slug::parse("-shirt").is_err());
/// assert!(Slug::parse("two--hyphens").is_err());
/// assert!(Slug::parse("Upper").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Parse an already-formed slug, e.g. one read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Malformed`] if the input breaks any of the
    /// slug constraints.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if is_well_formed(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(SlugError::Malformed(s.to_owned()))
        }
    }

    /// Derive a slug from a human-readable name without checking uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the name normalizes to nothing.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let base = normalize(name);
        if base.is_empty() {
            return Err(SlugError::Empty {
                input: name.to_owned(),
            });
        }
        Ok(Self(base))
    }

    /// Get the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the slug, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(SlugError::Malformed(value))
        }
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0.as_str(), buf)
    }
}

/// Normalize a human-readable name into slug form.
///
/// Lowercases, drops every character that is not an ASCII letter, digit,
/// underscore, whitespace or hyphen, and turns each run of whitespace,
/// underscores and hyphens into a single hyphen. Leading and trailing
/// hyphens never survive.
///
/// Returns an empty string only when the name has no ASCII letters or digits.
///
/// ```
/// use shopwright_core::slug::normalize;
///
/// assert_eq!(normalize("  Classic White T-Shirt "), "classic-white-t-shirt");
/// assert_eq!(normalize("Salt & Pepper"), "salt-pepper");
/// assert_eq!(normalize("snake_case__name"), "snake-case-name");
/// assert_eq!(normalize("!!!"), "");
/// ```
#[must_use]
pub fn normalize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut separator_pending = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if separator_pending && !slug.is_empty() {
                slug.push('-');
            }
            separator_pending = false;
            slug.push(c);
        } else if is_separator(c) {
            separator_pending = true;
        }
        // Anything else is stripped and does not separate words.
    }

    slug
}

/// Word separators: underscores, hyphens and whitespace. Whitespace here is
/// the `\s` class of web form validation, which counts the byte order mark
/// (U+FEFF) and excludes NEXT LINE (U+0085).
fn is_separator(c: char) -> bool {
    match c {
        '_' | '-' | '\u{feff}' => true,
        '\u{85}' => false,
        _ => c.is_whitespace(),
    }
}

/// Allocate a slug for `name` that does not collide with `existing`.
///
/// `existing` holds the slugs already used in the same collection. When
/// renaming a record, pass its current slug as `excluding` so the record
/// does not collide with itself.
///
/// If the normalized name is free it is returned unchanged. Otherwise the
/// suffixes `-1`, `-2`, ... are probed in ascending order and the first free
/// candidate wins, so gaps left by deleted records are reused.
///
/// # Errors
///
/// Returns [`SlugError::Empty`] if the name normalizes to nothing.
///
/// ```
/// use shopwright_core::slug::allocate_unique;
///
/// let taken = ["classic-white-t-shirt", "classic-white-t-shirt-1"];
/// let slug = allocate_unique("Classic White T-Shirt", taken, None).unwrap();
/// assert_eq!(slug.as_str(), "classic-white-t-shirt-2");
/// ```
pub fn allocate_unique<I, S>(
    name: &str,
    existing: I,
    excluding: Option<&str>,
) -> Result<Slug, SlugError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base = Slug::from_name(name)?.into_inner();

    let taken: HashSet<String> = existing
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .filter(|s| excluding != Some(s.as_str()))
        .collect();

    if !taken.contains(&base) {
        return Ok(Slug(base));
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return Ok(Slug(candidate));
        }
        suffix += 1;
    }
}

/// Check the slug invariant: `^[a-z0-9]+(-[a-z0-9]+)*$`.
fn is_well_formed(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const NO_SLUGS: [&str; 0] = [];

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Classic White T-Shirt"), "classic-white-t-shirt");
        assert_eq!(normalize("  padded  "), "padded");
        assert_eq!(normalize("Multiple   Spaces"), "multiple-spaces");
    }

    #[test]
    fn test_normalize_strips_special_characters() {
        assert_eq!(normalize("Men's Shoes"), "mens-shoes");
        assert_eq!(normalize("50% Off!"), "50-off");
        assert_eq!(normalize("C++ & Rust"), "c-rust");
    }

    #[test]
    fn test_normalize_collapses_separators() {
        assert_eq!(normalize("a - _ b"), "a-b");
        assert_eq!(normalize("--lead and trail--"), "lead-and-trail");
        assert_eq!(normalize("tab\tand\nnewline"), "tab-and-newline");
    }

    #[test]
    fn test_normalize_unicode_separators() {
        assert_eq!(normalize("a\u{feff}b"), "a-b");
        assert_eq!(normalize("a\u{a0}b\u{3000}c"), "a-b-c");
        assert_eq!(normalize("a\u{85}b"), "ab");
    }

    #[test]
    fn test_normalize_non_ascii_letters_are_stripped() {
        assert_eq!(normalize("Café Crème"), "caf-crme");
        assert_eq!(normalize("日本"), "");
    }

    #[test]
    fn test_normalize_empty_cases() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("-_-"), "");
        assert_eq!(normalize("!@#$"), "");
    }

    #[test]
    fn test_scenario_a_no_collision() {
        let slug = allocate_unique("Classic White T-Shirt", NO_SLUGS, None).unwrap();
        assert_eq!(slug.as_str(), "classic-white-t-shirt");
    }

    #[test]
    fn test_scenario_b_first_suffix() {
        let slug = allocate_unique("Classic White T-Shirt", ["classic-white-t-shirt"], None).unwrap();
        assert_eq!(slug.as_str(), "classic-white-t-shirt-1");
    }

    #[test]
    fn test_scenario_c_second_suffix() {
        let existing = ["classic-white-t-shirt", "classic-white-t-shirt-1"];
        let slug = allocate_unique("Classic White T-Shirt", existing, None).unwrap();
        assert_eq!(slug.as_str(), "classic-white-t-shirt-2");
    }

    #[test]
    fn test_allocate_reuses_smallest_gap() {
        let existing = ["hat", "hat-1", "hat-3"];
        let slug = allocate_unique("Hat", existing, None).unwrap();
        assert_eq!(slug.as_str(), "hat-2");
    }

    #[test]
    fn test_allocate_ignores_unrelated_prefix_matches() {
        // "hat-stand" shares the prefix but is not a suffix candidate
        let existing = ["hat-stand", "hats"];
        let slug = allocate_unique("Hat", existing, None).unwrap();
        assert_eq!(slug.as_str(), "hat");
    }

    #[test]
    fn test_allocate_excluding_own_slug() {
        let existing = ["summer-sale", "winter-sale"];
        let slug = allocate_unique("Summer Sale", existing, Some("summer-sale")).unwrap();
        assert_eq!(slug.as_str(), "summer-sale");
    }

    #[test]
    fn test_allocate_excluding_own_suffixed_slug() {
        let existing = ["cap", "cap-1"];
        let slug = allocate_unique("Cap", existing, Some("cap-1")).unwrap();
        assert_eq!(slug.as_str(), "cap-1");
    }

    #[test]
    fn test_allocate_rejects_empty_name() {
        let err = allocate_unique("???", NO_SLUGS, None).unwrap_err();
        assert_eq!(
            err,
            SlugError::Empty {
                input: "???".to_string()
            }
        );
    }

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("a").is_ok());
        assert!(Slug::parse("a-1-b").is_ok());
        assert!(Slug::parse("2024-collection").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Slug::parse(""), Err(SlugError::Malformed(_))));
        assert!(Slug::parse("trailing-").is_err());
        assert!(Slug::parse("has space").is_err());
        assert!(Slug::parse("under_score").is_err());
        assert!(Slug::parse("ÜBER").is_err());
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let slug: Slug = serde_json::from_str("\"red-scarf\"").unwrap();
        assert_eq!(slug.as_str(), "red-scarf");
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"red-scarf\"");

        assert!(serde_json::from_str::<Slug>("\"Red Scarf\"").is_err());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in ".*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_is_well_formed_or_empty(s in ".*") {
            let slug = normalize(&s);
            prop_assert!(slug.is_empty() || is_well_formed(&slug), "bad slug {:?}", slug);
        }

        #[test]
        fn allocated_slug_is_never_taken(
            name in "[A-Za-z0-9 _-]{1,20}",
            existing in prop::collection::hash_set("[a-z0-9-]{1,24}", 0..16),
        ) {
            prop_assume!(!normalize(&name).is_empty());
            let slug = allocate_unique(&name, &existing, None).unwrap();
            prop_assert!(!existing.contains(slug.as_str()));
        }

        #[test]
        fn free_base_is_returned_unchanged(
            name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
            existing in prop::collection::hash_set("[a-z]{1,8}-[0-9]{1,2}", 0..8),
        ) {
            let base = normalize(&name);
            prop_assume!(!existing.contains(&base));
            let slug = allocate_unique(&name, &existing, None).unwrap();
            prop_assert_eq!(slug.as_str(), base.as_str());
        }

        #[test]
        fn suffix_follows_contiguous_collisions(k in 0_u64..40) {
            let mut existing = vec!["tote".to_string()];
            existing.extend((1..=k).map(|n| format!("tote-{n}")));
            let slug = allocate_unique("Tote", &existing, None).unwrap();
            prop_assert_eq!(slug.into_inner(), format!("tote-{}", k + 1));
        }
    }
}
