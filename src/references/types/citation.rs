//! Citation parsing
//!
//! A reference field holds one or more citations separated by `,` or `;`.
//! Each citation is a source prefix followed directly by a page number,
//! e.g. `B102` (prefix `B`, page 102) or `CI45` (prefix `CI`, page 45).

use std::fmt;

/// Split a raw reference field into trimmed, non-empty citation strings.
///
/// Splits on `,` and `;` with no escaping. Order is preserved.
pub fn split_citation_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Why a citation string could not be split into prefix and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedCitation {
    /// Nothing to parse.
    Empty,
    /// The citation is all digits.
    MissingPrefix,
    /// The citation does not end in digits.
    MissingPage,
    /// The digit suffix does not fit a page number.
    PageOutOfRange,
}

impl fmt::Display for MalformedCitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty citation"),
            Self::MissingPrefix => write!(f, "citation has no source prefix"),
            Self::MissingPage => write!(f, "citation has no page number"),
            Self::PageOutOfRange => write!(f, "page number is out of range"),
        }
    }
}

impl std::error::Error for MalformedCitation {}

/// A single `<prefix><page>` citation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Citation {
    pub prefix: String,
    pub page: u32,
}

impl Citation {
    /// Split a trimmed citation into its prefix and trailing page number.
    ///
    /// The page is the maximal run of ASCII digits at the end of the string;
    /// the prefix is everything before it and must be non-empty.
    pub fn parse(s: &str) -> Result<Citation, MalformedCitation> {
        if s.is_empty() {
            return Err(MalformedCitation::Empty);
        }

        // Digits are single-byte, so this length is a char boundary.
        let boundary = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if boundary == 0 {
            return Err(MalformedCitation::MissingPrefix);
        }
        if boundary == s.len() {
            return Err(MalformedCitation::MissingPage);
        }

        let (prefix, digits) = s.split_at(boundary);
        let page = digits
            .parse::<u32>()
            .map_err(|_| MalformedCitation::PageOutOfRange)?;

        Ok(Citation {
            prefix: prefix.to_string(),
            page,
        })
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_segment() {
        assert_eq!(split_citation_list("  B102 "), vec!["B102"]);
        assert!(split_citation_list("   ").is_empty());
        assert!(split_citation_list("").is_empty());
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(split_citation_list("B102, CI45 ;  "), vec!["B102", "CI45"]);
        assert_eq!(split_citation_list(";;B1,,;"), vec!["B1"]);
    }

    #[test]
    fn test_parse_prefix_and_page() {
        let c = Citation::parse("B102").unwrap();
        assert_eq!(c.prefix, "B");
        assert_eq!(c.page, 102);

        let c = Citation::parse("CI45").unwrap();
        assert_eq!(c.prefix, "CI");
        assert_eq!(c.page, 45);
    }

    #[test]
    fn test_parse_keeps_inner_digits_in_prefix() {
        let c = Citation::parse("DF1-12").unwrap();
        assert_eq!(c.prefix, "DF1-");
        assert_eq!(c.page, 12);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Citation::parse(""), Err(MalformedCitation::Empty));
        assert_eq!(Citation::parse("12"), Err(MalformedCitation::MissingPrefix));
        assert_eq!(Citation::parse("B"), Err(MalformedCitation::MissingPage));
        assert_eq!(
            Citation::parse("B99999999999"),
            Err(MalformedCitation::PageOutOfRange)
        );
    }

    #[test]
    fn test_parse_non_ascii_prefix() {
        let c = Citation::parse("Ü7").unwrap();
        assert_eq!(c.prefix, "Ü");
        assert_eq!(c.page, 7);
    }
}
