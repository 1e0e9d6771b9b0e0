//! Version and build selection.
//!
//! The CLI accepts symbolic selectors (`latest`, `current`, empty-for-default)
//! as well as literal values. Raw strings are parsed exactly once at the CLI
//! boundary into a [`Selector`], so the resolution logic here operates on a
//! closed variant set instead of sniffing strings.
//!
//! Resolution rules, applied in order by [`resolve`]:
//! 1. [`Selector::Default`] substitutes the provided default selector.
//! 2. [`Selector::Latest`] picks the LAST element of the choices; catalog
//!    ordering guarantees newest-last.
//! 3. [`Selector::Current`] returns the presently-installed value for the
//!    kind, taken from the installed state rather than from the choices.
//! 4. A literal must parse as the value type and be a member of the choices;
//!    anything else is a [`SelectionFailed`].
//!
//! `SelectionFailed` is a reportable, recoverable outcome, not a panic: an
//! interactive caller re-prompts on it, a non-interactive caller aborts the
//! operation with no update performed.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A parsed selection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Empty input: fall back to the caller-supplied default.
    Default,
    /// The newest value the catalog offers.
    Latest,
    /// The presently-installed value.
    Current,
    /// An explicit value, still unvalidated against the catalog.
    Literal(String),
}

impl Selector {
    /// Parse a raw CLI or prompt string.
    ///
    /// Empty (or whitespace-only) input means "use the default"; the
    /// keywords `latest` and `current` are recognized case-sensitively,
    /// matching the catalog's own conventions.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Self::Default,
            "latest" => Self::Latest,
            "current" => Self::Current,
            other => Self::Literal(other.to_string()),
        }
    }
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(raw))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(""),
            Self::Latest => f.write_str("latest"),
            Self::Current => f.write_str("current"),
            Self::Literal(value) => f.write_str(value),
        }
    }
}

/// What is being selected: a version string or a build number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKind {
    /// A version string such as `1.18.1`.
    Version,
    /// A build number such as `12`.
    Build,
}

impl fmt::Display for SelectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version => f.write_str("version"),
            Self::Build => f.write_str("build"),
        }
    }
}

/// A selection request that could not be satisfied.
///
/// Carries the kind and the offending input so the failure can be reported
/// (and, interactively, re-prompted) without re-deriving context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no matching {kind}: {requested:?}")]
pub struct SelectionFailed {
    /// Whether a version or a build was being selected.
    pub kind: SelectKind,
    /// The input that failed to select anything.
    pub requested: String,
}

/// A value that selectors can resolve to.
///
/// Implemented for version strings and build numbers; `parse_literal` turns
/// raw user input into the value type (an unparseable build number is a
/// selection failure, not a parse panic).
pub trait Selectable: Clone + PartialEq + fmt::Display {
    /// Parse a literal selector into this value type.
    fn parse_literal(raw: &str) -> Option<Self>;
}

impl Selectable for String {
    fn parse_literal(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl Selectable for i64 {
    fn parse_literal(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Resolve a selector against the catalog's choices.
///
/// `current` is the presently-installed value for `kind`. The `default`
/// selector is substituted for [`Selector::Default`] input; a default that is
/// itself `Default` behaves as `Latest`.
pub fn resolve<T: Selectable>(
    requested: &Selector,
    choices: &[T],
    default: &Selector,
    current: &T,
    kind: SelectKind,
) -> std::result::Result<T, SelectionFailed> {
    let effective = match requested {
        Selector::Default => default,
        other => other,
    };

    match effective {
        Selector::Default | Selector::Latest => {
            choices.last().cloned().ok_or_else(|| SelectionFailed {
                kind,
                requested: "latest".to_string(),
            })
        }
        Selector::Current => Ok(current.clone()),
        Selector::Literal(raw) => match T::parse_literal(raw) {
            Some(value) if choices.contains(&value) => Ok(value),
            _ => Err(SelectionFailed {
                kind,
                requested: raw.clone(),
            }),
        },
    }
}
