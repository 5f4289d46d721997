use crate::MAX_IDENT_LEN;

/// Ensure an identifier is non-empty, ASCII, bounded, and shaped like
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_ident(what: &str, ident: &str) -> Result<(), String> {
    if ident.is_empty() {
        return Err(format!("{what} name is empty"));
    }
    if ident.len() > MAX_IDENT_LEN {
        return Err(format!(
            "{what} name '{ident}' exceeds max length {MAX_IDENT_LEN}"
        ));
    }
    if !ident.is_ascii() {
        return Err(format!("{what} name '{ident}' must be ASCII"));
    }

    let mut chars = ident.chars();
    let leading_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !leading_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "{what} name '{ident}' must match [A-Za-z_][A-Za-z0-9_]*"
        ));
    }

    Ok(())
}
