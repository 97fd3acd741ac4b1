//! Placeholder substitution
//!
//! Translations keep the placeholders of their source: `%1` to `%99` for arguments and `%n` for
//! the count of a numerus message. Lookup returns them untouched; these functions fill them in.
//! The `%L` variants, which Qt formats with the locale's digit grouping, are replaced the same
//! way.

use regex::{Captures, NoExpand, Regex};
use std::borrow::Cow;

lazy_static!{
    static ref ARG_RE: Regex = Regex::new("%L?([1-9][0-9]?)").unwrap();
    static ref COUNT_RE: Regex = Regex::new("%L?n").unwrap();
}

/// Replace `%1`, `%2`, … with the corresponding argument.
///
/// Placeholders without a matching argument are left in place.
///
/// ```
/// use ts_catalogue::args::substitute;
///
/// assert_eq!(substitute("Không thể mở %1: %2", &["game.nsp", "không tìm thấy"]),
///            "Không thể mở game.nsp: không tìm thấy");
/// assert_eq!(substitute("%1 of %3", &["1"]), "1 of %3");
/// ```
pub fn substitute<'a, S: AsRef<str>>(template: &'a str, args: &[S]) -> Cow<'a, str> {
    if args.is_empty() {
        return Cow::Borrowed(template);
    }
    ARG_RE.replace_all(template, |c: &Captures| {
        let arg = c[1].parse::<usize>().ok()
            .and_then(|i| args.get(i - 1));
        match arg {
            Some(a) => a.as_ref().to_owned(),
            None => c[0].to_owned(),
        }
    })
}

/// Replace `%n` with the count.
pub fn substitute_count(template: &str, n: u64) -> Cow<str> {
    COUNT_RE.replace_all(template, NoExpand(&n.to_string()))
}
