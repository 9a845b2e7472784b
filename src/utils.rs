/// Strip a trailing `.version` from an accession or transcript id.
///
/// `ENST00000169551.7` becomes `ENST00000169551`.
pub fn strip_version(id: &str) -> &str {
    match id.find('.') {
        Some(i) => &id[..i],
        None => id,
    }
}

/// Normalize a transcript identifier taken from a FASTA header or a list file.
///
/// Anything after the first `|` or whitespace is discarded, then the version.
pub fn transcript_id(x: &str) -> &str {
    let x = x.trim();
    let end = x.find(|c: char| c == '|' || c.is_whitespace()).unwrap_or(x.len());
    strip_version(&x[..end])
}

/// Split an HGVS expression into its reference sequence id and its change.
///
/// Splits at the first colon; the version of the reference is stripped.
pub fn split_hgvs(x: &str) -> Option<(&str, &str)> {
    match x.find(':') {
        Some(i) => {
            let reference = strip_version(&x[..i]);
            let change = &x[i+1..];
            if reference.is_empty() || change.is_empty() {
                None
            } else {
                Some((reference, change))
            }
        },
        None => None,
    }
}
