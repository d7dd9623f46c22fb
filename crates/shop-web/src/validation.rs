//! Form checks shared by the controllers.
//!
//! Posted forms derive [`Validate`](validator::Validate); [`collect`] copies
//! the failures into a [`ModelState`] keyed the way views name fields
//! (`first_name` becomes `FirstName`, nested structs become `Address.City`).

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::result::ModelState;

/// Error code raised by [`non_blank`].
pub const REQUIRED: &str = "required";

/// `custom` rule for text that must have non-blank content.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(REQUIRED));
    }
    Ok(())
}

fn pascal_case(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Copy `result` into `state` under `prefix`. One message per field: a
/// missing value wins over a malformed one.
pub fn collect(state: &mut ModelState, prefix: &str, result: Result<(), ValidationErrors>) {
    if let Err(errors) = result {
        collect_errors(state, prefix, &errors);
    }
}

fn collect_errors(state: &mut ModelState, prefix: &str, errors: &ValidationErrors) {
    for (field, kind) in errors.errors() {
        let name: &str = field.as_ref();
        let key = format!("{}{}", prefix, pascal_case(name));
        match kind {
            ValidationErrorsKind::Field(list) => {
                let first = list.iter().find(|e| e.code == REQUIRED).or_else(|| list.first());
                if let Some(error) = first {
                    let message = match error.message.as_deref() {
                        Some(message) => message.to_string(),
                        None => format!("{} is not valid.", key),
                    };
                    state.add_error(key, message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(state, &format!("{}.", key), nested),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_errors(state, &format!("{}.", key), nested);
                }
            }
        }
    }
}

/// Whether a return URL stays on this site: a rooted path, not
/// protocol-relative and without a scheme.
pub fn is_local_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.contains('\\') {
        return false;
    }
    if url.starts_with("//") {
        return false;
    }
    url.starts_with('/') || url.starts_with("~/")
}
