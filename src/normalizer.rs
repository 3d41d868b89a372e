use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical form used for all name matching: NFKC, lowercase, accents
/// stripped, inner whitespace collapsed to single spaces.
///
/// "Äpfel", "äpfel" and "APFEL" all normalize to "apfel", so a query in
/// any of those spellings finds the same records.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().nfkc().collect::<String>();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
