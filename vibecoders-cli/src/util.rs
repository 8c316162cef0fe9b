use vibecoders::url::{self, Url};

pub fn as_usize((x, y): (u16, u16)) -> (usize, usize) {
    (usize::from(x), usize::from(y))
}

pub fn parse_url(src: &str) -> Result<Url, url::ParseError> {
    src.parse()
}

/// Number of columns a score takes, sign included
pub fn count_digits(num: i64) -> usize {
    let mut digits = if num < 0 { 2 } else { 1 };
    let mut rest = (num as i128).abs() / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_digits() {
        assert_eq!(count_digits(0), 1);
        assert_eq!(count_digits(1), 1);
        assert_eq!(count_digits(10), 2);
        assert_eq!(count_digits(99), 2);
        assert_eq!(count_digits(101), 3);
        assert_eq!(count_digits(-1), 2);
        assert_eq!(count_digits(-99), 3);
        assert_eq!(count_digits(-101), 4);
    }
}
