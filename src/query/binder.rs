//! Argument binding.
//!
//! Reconciles scanned placeholders with caller arguments and decides which
//! placeholders need an explicit cast.

use crate::error::BindingError;
use crate::query::placeholder::{CastType, Placeholder, PlaceholderStyle};
use crate::types::{NamedValue, Value, ValueKind};

/// Cast a value needs so the engine reads it with the right type.
pub fn cast_for(value: &Value) -> CastType {
    match value.semantic_kind() {
        Some(ValueKind::Uuid) => CastType::Uuid,
        Some(ValueKind::Datetime | ValueKind::Time) => CastType::Datetime,
        _ => CastType::None,
    }
}

/// Match every placeholder to exactly one argument and record its cast.
///
/// Arguments are considered in ordinal order. A named placeholder takes the
/// first remaining argument with the same name, a positional one the first
/// remaining unnamed argument. Placeholders are left untouched on error.
///
/// # Errors
///
/// Returns `CountMismatch` when the counts differ, `NoNamedParameter` or
/// `NotEnoughUnnamed` when a placeholder finds no argument.
pub fn bind(placeholders: &mut [Placeholder], args: &[NamedValue]) -> Result<(), BindingError> {
    if placeholders.len() != args.len() {
        return Err(BindingError::CountMismatch {
            want: placeholders.len(),
            have: args.len(),
        });
    }

    let mut remaining: Vec<&NamedValue> = args.iter().collect();
    remaining.sort_by_key(|arg| arg.ordinal);

    let mut casts = Vec::with_capacity(placeholders.len());
    for placeholder in placeholders.iter() {
        let index = match placeholder.style {
            PlaceholderStyle::Named => remaining
                .iter()
                .position(|arg| arg.name().unwrap_or("") == placeholder.name)
                .ok_or_else(|| BindingError::NoNamedParameter {
                    name: placeholder.name.clone(),
                })?,
            PlaceholderStyle::Positional => remaining
                .iter()
                .position(|arg| arg.name().is_none())
                .ok_or(BindingError::NotEnoughUnnamed)?,
        };
        let arg = remaining.remove(index);
        casts.push(cast_for(&arg.value));
    }

    for (placeholder, cast) in placeholders.iter_mut().zip(casts) {
        placeholder.cast = cast;
    }
    Ok(())
}
