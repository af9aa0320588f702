//! Canonicalization of partial upstream date strings.
//!
//! Upstreams report dates at wildly different granularity: full `YYYY-MM-DD`,
//! year-month, bare years, or nothing at all. Everything is canonicalized to
//! a fixed `YYYY-MM-DD` shape so that date ordering reduces to lexicographic
//! string comparison. Unknown components are filled depending on whether the
//! date opens or closes an interval:
//!
//! - start dates fill missing components with `0000` / `00`
//! - end dates fill missing components with `9999` / `99`
//!
//! so an empty input yields the fully-open sentinels [`OPEN_START`] and
//! [`OPEN_END`], and a year-only bound still sorts on the correct side of
//! every real date inside that year.

/// Sentinel for an unknown start date.
pub const OPEN_START: &str = "0000-00-00";

/// Sentinel for an unknown end date.
pub const OPEN_END: &str = "9999-99-99";

/// Whether a raw date opens or closes a role interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDirection {
    Start,
    End,
}

/// Canonicalize a possibly-partial date string into `YYYY-MM-DD`.
///
/// Never fails: components that are present are zero-padded as-is (garbage
/// in, canonical-shape garbage out), missing components are filled with the
/// direction's sentinel tokens.
#[must_use]
pub fn normalize_date(raw: &str, direction: DateDirection) -> String {
    let (year_fill, part_fill) = match direction {
        DateDirection::Start => ("0000", "00"),
        DateDirection::End => ("9999", "99"),
    };

    let mut parts = raw.trim().split('-').filter(|p| !p.is_empty());
    let year = parts
        .next()
        .map_or_else(|| year_fill.to_owned(), |y| pad(y, 4));
    let month = parts
        .next()
        .map_or_else(|| part_fill.to_owned(), |m| pad(m, 2));
    let day = parts
        .next()
        .map_or_else(|| part_fill.to_owned(), |d| pad(d, 2));

    format!("{year}-{month}-{day}")
}

fn pad(component: &str, width: usize) -> String {
    format!("{component:0>width$}")
}
