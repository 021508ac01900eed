//! File-name slugs for artifact naming.

use deunicode::deunicode;

/// Transliterate to ASCII and keep only `[A-Za-z0-9]`, joining runs of
/// anything else with `sep` (which may be empty).
///
/// Case is preserved so `"Crème Brûlée"` becomes `"Creme-Brulee"`.
pub fn slugify(text: &str, sep: &str) -> String {
    let ascii = deunicode(text);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_sep = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push_str(sep);
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    if out.is_empty() {
        out.push_str("Untitled");
    }
    out
}
