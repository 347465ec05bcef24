/*!
Formats minute counts as short duration strings (`1h 15m`) and parses
them back. Parsing is lenient: the first `<N>h <M>m` or `<M>m` found
anywhere in the text wins, and anything unrecognized reads as zero.
!*/
use winnow::Parser;
use winnow::Result;
use winnow::ascii::digit1;
use winnow::combinator::alt;
use winnow::combinator::preceded;
use winnow::combinator::terminated;
use winnow::token::take_while;

/// Renders minutes as `1h 15m`, `1h`, `15m`, or `0m`.
pub fn format_duration(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, 0) => "0m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Like [`format_duration`], but the minutes part is always present and
/// padded to two digits.
pub fn format_duration_with_zeros(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    if h == 0 {
        format!("{m:02}m")
    } else {
        format!("{h}h {m:02}m")
    }
}

/// Returns the minute count of the first duration found in `input`, or 0.
pub fn parse_duration(input: &str) -> u32 {
    for (start, _) in input.char_indices() {
        let mut rest = &input[start..];
        if let Ok(found) = parse_span.parse_next(&mut rest) {
            return found.unwrap_or(0);
        }
    }
    0
}

// `None` means the text matched but the value doesn't fit in u32.
fn parse_span(input: &mut &str) -> Result<Option<u32>> {
    alt((parse_hours_minutes, parse_minutes)).parse_next(input)
}

fn parse_hours_minutes(input: &mut &str) -> Result<Option<u32>> {
    let (hours, _, minutes) = (
        terminated(parse_number, 'h'),
        parse_space,
        terminated(parse_number, 'm'),
    )
        .parse_next(input)?;
    Ok(hours
        .zip(minutes)
        .and_then(|(h, m)| h.checked_mul(60)?.checked_add(m)))
}

fn parse_minutes(input: &mut &str) -> Result<Option<u32>> {
    preceded(parse_space, terminated(parse_number, 'm')).parse_next(input)
}

fn parse_number(input: &mut &str) -> Result<Option<u32>> {
    digit1
        .map(|digits: &str| digits.parse::<u32>().ok())
        .parse_next(input)
}

fn parse_space<'s>(input: &mut &'s str) -> Result<&'s str> {
    take_while(0.., char::is_whitespace).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_examples() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(75), "1h 15m");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(5), "5m");
        assert_eq!(format_duration(605), "10h 5m");
    }

    #[test]
    fn test_format_with_zeros_examples() {
        assert_eq!(format_duration_with_zeros(75), "1h 15m");
        assert_eq!(format_duration_with_zeros(5), "05m");
        assert_eq!(format_duration_with_zeros(65), "1h 05m");
        assert_eq!(format_duration_with_zeros(60), "1h 00m");
        assert_eq!(format_duration_with_zeros(0), "00m");
    }

    #[test]
    fn test_parse_examples() {
        assert_eq!(parse_duration("1h 15m"), 75);
        assert_eq!(parse_duration("45m"), 45);
        assert_eq!(parse_duration("2h 05m"), 125);
        assert_eq!(parse_duration("bad"), 0);
        assert_eq!(parse_duration(""), 0);
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(parse_duration("1h15m"), 75);
        assert_eq!(parse_duration("about 1h  30m please"), 90);
        assert_eq!(parse_duration("3h 2h 5m"), 125);
        assert_eq!(parse_duration("90m"), 90);
        assert_eq!(parse_duration("  7m"), 7);
    }

    #[test]
    fn test_hours_without_minutes_is_zero() {
        assert_eq!(parse_duration("2h"), 0);
        assert_eq!(parse_duration("1h"), 0);
    }

    #[test]
    fn test_oversized_number_is_zero() {
        assert_eq!(parse_duration("99999999999m"), 0);
        assert_eq!(parse_duration("99999999h 1m"), 0);
    }

    #[test]
    fn test_round_trip_with_zeros() {
        for m in 0..=1500 {
            assert_eq!(parse_duration(&format_duration_with_zeros(m)), m);
        }
    }

    #[test]
    fn test_round_trip_plain_format() {
        for m in (0..=1500).filter(|m| m % 60 != 0 || *m == 0) {
            assert_eq!(parse_duration(&format_duration(m)), m);
        }
    }
}
