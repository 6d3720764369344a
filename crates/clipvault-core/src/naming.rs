//! Naming rules for committed clips.
//!
//! The resolver is a pure function of a listing snapshot. Uniqueness is ultimately
//! enforced by the store's add+autorename commit, so two submissions racing on the same
//! snapshot end up as `Clip #0006.mp3` and `Clip #0006 (1).mp3` rather than overwriting.

use regex::Regex;

use crate::models::AudioFormat;

/// How new submissions are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `"{prefix} #{ordinal:0width}"`, ordinal = max existing + 1.
    Sequential { prefix: String, width: usize },
    /// Always the same base name; the store's autorename resolves collisions.
    Fixed { name: String },
}

#[derive(Debug, Clone)]
pub struct NamingResolver {
    policy: NamingPolicy,
    pattern: Regex,
}

impl NamingResolver {
    pub fn new(policy: NamingPolicy) -> Result<Self, regex::Error> {
        let pattern = match &policy {
            NamingPolicy::Sequential { prefix, .. } => {
                Regex::new(&format!(r"^{} #(\d+)", regex::escape(prefix)))?
            }
            NamingPolicy::Fixed { name } => Regex::new(&format!(
                r"^{}(?: \((\d+)\))?\.[A-Za-z0-9]+$",
                regex::escape(name)
            ))?,
        };
        Ok(Self { policy, pattern })
    }

    /// Whether `next_name` needs a listing snapshot at all.
    pub fn needs_listing(&self) -> bool {
        matches!(self.policy, NamingPolicy::Sequential { .. })
    }

    /// Ordinal encoded in a stored name, if any.
    ///
    /// Fixed-policy names yield the autorename counter (`clip (3).mp3` -> 3, `clip.mp3` -> 0).
    pub fn ordinal(&self, name: &str) -> Option<u64> {
        let captures = self.pattern.captures(name)?;
        match captures.get(1) {
            Some(digits) => digits.as_str().parse().ok(),
            None => match self.policy {
                NamingPolicy::Fixed { .. } => Some(0),
                NamingPolicy::Sequential { .. } => None,
            },
        }
    }

    /// Next name for a submission of `format`, given the names currently in the folder.
    pub fn next_name<'a, I>(&self, existing: I, format: AudioFormat) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        match &self.policy {
            NamingPolicy::Sequential { prefix, width } => {
                let next = existing
                    .into_iter()
                    .filter_map(|name| self.ordinal(name))
                    .max()
                    .map(|max| max.saturating_add(1))
                    .unwrap_or(1);
                format!(
                    "{} #{:0width$}.{}",
                    prefix,
                    next,
                    format.extension(),
                    width = *width
                )
            }
            NamingPolicy::Fixed { name } => format!("{}.{}", name, format.extension()),
        }
    }
}

/// Presentation name: known audio extension stripped, optional label prepended.
pub fn display_name(stored_name: &str, label: Option<&str>) -> String {
    let stem = match stored_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && AudioFormat::from_extension(stored_name).is_some() => {
            stem
        }
        _ => stored_name,
    };
    match label {
        Some(label) if !label.is_empty() => format!("{} {}", label, stem),
        _ => stem.to_string(),
    }
}
