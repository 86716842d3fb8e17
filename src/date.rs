//! Parsing of the partial date/time grammar used by range parameters.
//!
//! Dates may be given as `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or a bare
//! `MM`/`MM-DD` pair for searches by time of year.  Times are prefixes of
//! `YYYY-MM-DD-HH-MM-SS`.  Values are validated up front and stored as
//! strings; the condition builders re-parse them when emitting comparisons.

/// A validated partial date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateVal {
    /// Year with optional month and day.
    Ymd { y: u16, m: Option<u8>, d: Option<u8> },
    /// Month with optional day, no year ("time of year" searches).
    Md { m: u8, d: Option<u8> },
}

impl DateVal {
    /// Render the inclusive lower bound of this partial date.
    /// Only valid for the `Ymd` form.
    pub fn min_bound(&self) -> Option<String> {
        match *self {
            DateVal::Ymd { y, m, d } => Some(format!(
                "{:04}-{:02}-{:02}",
                y,
                m.unwrap_or(1),
                d.unwrap_or(1)
            )),
            DateVal::Md { .. } => None,
        }
    }

    /// Render the inclusive upper bound of this partial date.
    pub fn max_bound(&self) -> Option<String> {
        match *self {
            DateVal::Ymd { y, m, d } => Some(format!(
                "{:04}-{:02}-{:02}",
                y,
                m.unwrap_or(12),
                d.unwrap_or(31)
            )),
            DateVal::Md { .. } => None,
        }
    }

    pub fn month_day(&self) -> Option<(u8, Option<u8>)> {
        match *self {
            DateVal::Md { m, d } => Some((m, d)),
            DateVal::Ymd { .. } => None,
        }
    }
}

/// A validated partial time: year plus up to five trailing components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeVal {
    pub y: u16,
    pub m: Option<u8>,
    pub d: Option<u8>,
    pub h: Option<u8>,
    pub min: Option<u8>,
    pub s: Option<u8>,
}

impl TimeVal {
    /// Missing trailing components default to the range boundary: the
    /// minimum of each field for a lower bound, the maximum for an upper.
    pub fn bound(&self, min: bool) -> String {
        let (dm, dd, dh, dmin, ds) = if min { (1, 1, 0, 0, 0) } else { (12, 31, 23, 59, 59) };
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.y,
            self.m.unwrap_or(dm),
            self.d.unwrap_or(dd),
            self.h.unwrap_or(dh),
            self.min.unwrap_or(dmin),
            self.s.unwrap_or(ds)
        )
    }
}

fn split_fields(val: &str) -> Option<Vec<u16>> {
    let mut out = Vec::new();
    for part in val.split('-') {
        if part.is_empty() || part.len() > 4 || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        out.push(part.parse::<u16>().ok()?);
    }
    Some(out)
}

/// Parse a partial date string.  Empty strings and `"0"` mean "no bound"
/// and return `Ok(None)`; malformed strings return `Err`.
///
/// ```
/// use mo_query::date::{parse_date, DateVal};
///
/// assert_eq!(parse_date("2010").unwrap(),
///            Some(DateVal::Ymd { y: 2010, m: None, d: None }));
/// assert_eq!(parse_date("2010-03-05").unwrap(),
///            Some(DateVal::Ymd { y: 2010, m: Some(3), d: Some(5) }));
/// assert_eq!(parse_date("11-20").unwrap(),
///            Some(DateVal::Md { m: 11, d: Some(20) }));
/// assert_eq!(parse_date("").unwrap(), None);
/// assert!(parse_date("next tuesday").is_err());
/// ```
pub fn parse_date(val: &str) -> Result<Option<DateVal>, String> {
    let val = val.trim();
    if val.is_empty() || val == "0" {
        return Ok(None);
    }

    let fields = split_fields(val).ok_or_else(|| format!("Invalid date: {val:?}"))?;
    let four_digit_year = val.len() >= 4 && val.as_bytes()[..4].iter().all(u8::is_ascii_digit);

    if four_digit_year {
        match fields.as_slice() {
            [y] => Ok(Some(DateVal::Ymd { y: *y, m: None, d: None })),
            [y, m] if (1..=12).contains(m) => {
                Ok(Some(DateVal::Ymd { y: *y, m: Some(*m as u8), d: None }))
            }
            [y, m, d] if (1..=12).contains(m) && (1..=31).contains(d) => Ok(Some(DateVal::Ymd {
                y: *y,
                m: Some(*m as u8),
                d: Some(*d as u8),
            })),
            _ => Err(format!("Invalid date: {val:?}")),
        }
    } else {
        match fields.as_slice() {
            [m] if (1..=12).contains(m) => Ok(Some(DateVal::Md { m: *m as u8, d: None })),
            [m, d] if (1..=12).contains(m) && (1..=31).contains(d) => {
                Ok(Some(DateVal::Md { m: *m as u8, d: Some(*d as u8) }))
            }
            _ => Err(format!("Invalid date: {val:?}")),
        }
    }
}

/// Parse a partial time string (`YYYY` through `YYYY-MM-DD-HH-MM-SS`).
/// Empty strings and `"0"` mean "no bound".
///
/// ```
/// use mo_query::date::parse_time;
///
/// let t = parse_time("2012-06-15-13").unwrap().unwrap();
/// assert_eq!(t.bound(true), "2012-06-15 13:00:00");
/// assert_eq!(t.bound(false), "2012-06-15 13:59:59");
/// assert!(parse_time("2012-13").is_err());
/// ```
pub fn parse_time(val: &str) -> Result<Option<TimeVal>, String> {
    let val = val.trim();
    if val.is_empty() || val == "0" {
        return Ok(None);
    }

    let fields = split_fields(val).ok_or_else(|| format!("Invalid time: {val:?}"))?;
    if fields.is_empty() || fields.len() > 6 || val.len() < 4 {
        return Err(format!("Invalid time: {val:?}"));
    }

    let ranges: [(u16, u16); 5] = [(1, 12), (1, 31), (0, 23), (0, 59), (0, 59)];
    for (i, f) in fields.iter().enumerate().skip(1) {
        let (lo, hi) = ranges[i - 1];
        if *f < lo || *f > hi {
            return Err(format!("Invalid time: {val:?}"));
        }
    }

    let get = |i: usize| fields.get(i).map(|v| *v as u8);
    Ok(Some(TimeVal {
        y: fields[0],
        m: get(1),
        d: get(2),
        h: get(3),
        min: get(4),
        s: get(5),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_bounds() {
        let d = parse_date("2010-03").unwrap().unwrap();
        assert_eq!(d.min_bound().unwrap(), "2010-03-01");
        assert_eq!(d.max_bound().unwrap(), "2010-03-31");

        let d = parse_date("1999").unwrap().unwrap();
        assert_eq!(d.min_bound().unwrap(), "1999-01-01");
        assert_eq!(d.max_bound().unwrap(), "1999-12-31");
    }

    #[test]
    fn month_day_form_has_no_year_bounds() {
        let d = parse_date("12-01").unwrap().unwrap();
        assert_eq!(d.min_bound(), None);
        assert_eq!(d.month_day(), Some((12, Some(1))));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(parse_date("2010-13").is_err());
        assert!(parse_date("2010-01-32").is_err());
        assert!(parse_time("2012-06-15-25").is_err());
    }

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(parse_date("0").unwrap(), None);
        assert_eq!(parse_time("").unwrap(), None);
    }
}
