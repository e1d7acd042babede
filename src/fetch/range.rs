use crate::error::{Result, SubfetchError};
use regex::Regex;
use std::sync::OnceLock;

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:-(\d+))?(-)?$").expect("Invalid regex"))
}

/// Inclusive, 1-based range of playlist items. `end == None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PlaylistRange {
    /// Parse user input such as `"3"`, `"1-5"` or `"7-"`.
    ///
    /// Empty input means "the whole list" and yields `None`.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        input.parse().map(Some)
    }

    pub fn contains(&self, ordinal: u32) -> bool {
        ordinal >= self.start && self.end.map_or(true, |end| ordinal <= end)
    }

    /// Number of items requested, if bounded. An inverted range is empty.
    pub fn len(&self) -> Option<u32> {
        self.end
            .map(|end| end.saturating_add(1).saturating_sub(self.start))
    }

    /// Fetch-tool arguments selecting this range.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--playlist-start".to_string(), self.start.to_string()];
        if let Some(end) = self.end {
            args.push("--playlist-end".to_string());
            args.push(end.to_string());
        }
        args
    }
}

impl std::str::FromStr for PlaylistRange {
    type Err = SubfetchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            SubfetchError::Usage(format!(
                "Invalid range '{}'. Use a format like 1-5, 3, or 7-",
                s
            ))
        };

        let caps = range_regex().captures(s.trim()).ok_or_else(invalid)?;
        let start: u32 = caps[1].parse().map_err(|_| invalid())?;
        let end: Option<u32> = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
            // "N" alone is a single item, "N-" is open-ended
            None if caps.get(3).is_some() => None,
            None => Some(start),
        };

        if start == 0 {
            return Err(SubfetchError::Usage(
                "Playlist items are numbered from 1".to_string(),
            ));
        }
        if let Some(end) = end {
            if end < start {
                return Err(SubfetchError::Usage(format!(
                    "Invalid range '{}': end {} is before start {}",
                    s, end, start
                )));
            }
        }

        Ok(PlaylistRange { start, end })
    }
}

impl std::fmt::Display for PlaylistRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> PlaylistRange {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_item() {
        assert_eq!(range("3"), PlaylistRange { start: 3, end: Some(3) });
        assert_eq!(range("3").len(), Some(1));
    }

    #[test]
    fn test_inclusive_range() {
        let r = range("2-3");
        assert_eq!(r, PlaylistRange { start: 2, end: Some(3) });
        assert!(r.contains(2) && r.contains(3));
        assert!(!r.contains(1) && !r.contains(4));
        assert_eq!(r.len(), Some(2));
    }

    #[test]
    fn test_open_ended() {
        let r = range("7-");
        assert_eq!(r, PlaylistRange { start: 7, end: None });
        assert!(r.contains(10_000));
        assert_eq!(r.len(), None);
    }

    #[test]
    fn test_len_of_hand_built_ranges() {
        let inverted = PlaylistRange { start: 5, end: Some(3) };
        assert_eq!(inverted.len(), Some(0));
        assert!(!inverted.contains(4));

        let widest = PlaylistRange { start: 1, end: Some(u32::MAX) };
        assert_eq!(widest.len(), Some(u32::MAX));
    }

    #[test]
    fn test_trailing_dash_after_end_is_ignored() {
        assert_eq!(range("1-5-"), PlaylistRange { start: 1, end: Some(5) });
    }

    #[test]
    fn test_invalid_inputs_are_usage_errors() {
        for input in ["abc", "-5-", "-5", "1--2", "1-2-3", "1,2", " - "] {
            let err = input.parse::<PlaylistRange>().unwrap_err();
            assert!(err.is_usage(), "{input} should be a usage error");
        }
    }

    #[test]
    fn test_zero_and_inverted_ranges_rejected() {
        assert!("0".parse::<PlaylistRange>().is_err());
        assert!("5-3".parse::<PlaylistRange>().is_err());
    }

    #[test]
    fn test_empty_means_whole_list() {
        assert_eq!(PlaylistRange::parse("").unwrap(), None);
        assert_eq!(PlaylistRange::parse("  ").unwrap(), None);
        assert_eq!(PlaylistRange::parse("4-").unwrap(), Some(range("4-")));
        assert!("".parse::<PlaylistRange>().is_err());
    }

    #[test]
    fn test_to_args() {
        assert_eq!(range("2-3").to_args(), ["--playlist-start", "2", "--playlist-end", "3"]);
        assert_eq!(range("7-").to_args(), ["--playlist-start", "7"]);
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["3", "2-3", "7-"] {
            assert_eq!(range(s).to_string(), s);
        }
    }
}
