//! Identifier sanitizing for bucket table names.

/// Map a well or channel name to a fragment safe for use in a table name.
///
/// Alphanumeric characters are lowercased, everything else becomes `_`.
/// Lowercasing may expand a character (`İ` becomes `i` plus a combining
/// dot); produced characters that are not alphanumeric also become `_`, so
/// the output is a fixed point of `sanitize`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(
                c.to_lowercase()
                    .map(|l| if l.is_alphanumeric() { l } else { '_' }),
            );
        } else {
            out.push('_');
        }
    }
    out
}
