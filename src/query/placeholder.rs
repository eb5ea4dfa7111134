//! Placeholder scanning.
//!
//! A single left-to-right pass over the query text finds positional (`?`)
//! and named (`:name`) placeholders and records their byte offsets.

use std::fmt;

/// How a placeholder is written in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    Positional,
    /// `:name`
    Named,
}

/// Explicit cast wrapped around a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastType {
    #[default]
    None,
    Uuid,
    Datetime,
}

impl CastType {
    /// SQL type name used in `CAST(... AS <type>)`.
    pub fn sql_type(&self) -> Option<&'static str> {
        match self {
            CastType::None => None,
            CastType::Uuid => Some("UUID"),
            CastType::Datetime => Some("DATETIME"),
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type().unwrap_or("NONE"))
    }
}

/// Quote handling while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Skip text inside `'...'` literals and `"..."` identifiers.
    #[default]
    QuoteAware,
    /// Treat every `?` and `:` as a placeholder, even inside quotes.
    Literal,
}

impl ScanMode {
    /// Parse a mode name as used in connection strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "quote_aware" | "quoted" | "default" => Some(ScanMode::QuoteAware),
            "literal" | "legacy" => Some(ScanMode::Literal),
            _ => None,
        }
    }
}

/// One placeholder occurrence in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of the token in the current query text
    pub position: usize,
    pub style: PlaceholderStyle,
    /// Name without the leading colon, empty for positional placeholders
    pub name: String,
    pub cast: CastType,
}

impl Placeholder {
    pub fn positional(position: usize) -> Self {
        Self {
            position,
            style: PlaceholderStyle::Positional,
            name: String::new(),
            cast: CastType::None,
        }
    }

    pub fn named(position: usize, name: impl Into<String>) -> Self {
        Self {
            position,
            style: PlaceholderStyle::Named,
            name: name.into(),
            cast: CastType::None,
        }
    }

    /// Whether the binder decided this placeholder needs an explicit cast.
    pub fn cast_required(&self) -> bool {
        self.cast != CastType::None
    }

    /// Token text as it appears in the query.
    pub fn token(&self) -> String {
        match self.style {
            PlaceholderStyle::Positional => "?".to_string(),
            PlaceholderStyle::Named => format!(":{}", self.name),
        }
    }

    /// Length of the token in bytes.
    pub fn token_len(&self) -> usize {
        match self.style {
            PlaceholderStyle::Positional => 1,
            PlaceholderStyle::Named => 1 + self.name.len(),
        }
    }
}

/// Find all placeholders in `query`, in order of appearance.
///
/// A `:` starts a named placeholder whose name is the run of alphanumeric
/// characters that follows. The character ending the run is then scanned
/// normally, so `::` yields two named placeholders with empty names.
///
/// Alphanumeric is Unicode's: besides letters and decimal digits it takes
/// letter-like and other numerals (`Ⅻ`, `²`), which continue a name.
pub fn scan(query: &str, mode: ScanMode) -> Vec<Placeholder> {
    let mut placeholders: Vec<Placeholder> = Vec::new();
    let mut naming = false;
    let mut name = String::new();
    let mut quote: Option<char> = None;

    for (offset, ch) in query.char_indices() {
        if naming {
            if ch.is_alphanumeric() {
                name.push(ch);
                continue;
            }
            if let Some(last) = placeholders.last_mut() {
                last.name = std::mem::take(&mut name);
            }
            naming = false;
        }

        if let Some(open) = quote {
            // A doubled quote closes and immediately reopens.
            if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '?' => placeholders.push(Placeholder::positional(offset)),
            ':' => {
                naming = true;
                placeholders.push(Placeholder::named(offset, ""));
            }
            '\'' | '"' if mode == ScanMode::QuoteAware => quote = Some(ch),
            _ => {}
        }
    }

    if naming {
        if let Some(last) = placeholders.last_mut() {
            last.name = name;
        }
    }

    placeholders
}
