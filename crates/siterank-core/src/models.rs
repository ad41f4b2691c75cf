use std::fmt;

use chrono::NaiveDateTime;

/// Format used when a crawl timestamp is rendered as text.
pub const CRAWL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one rank-extraction strategy.
///
/// Persisted as a single integer: the rank itself, or a sentinel code
/// describing why no rank could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    /// Actual rank, thousands separators already stripped.
    Ranked(u64),
    /// The provider explicitly marks the site as not ranked (`0`).
    NotRanked,
    /// The section holding the rank is absent from the page (`-1`).
    SectionMissing,
    /// The section exists but an expected nested element is missing (`-2`).
    ElementMissing,
    /// Text was found but is not an integer (`-3`).
    Unparseable,
}

impl Rank {
    pub fn code(&self) -> i64 {
        match self {
            Rank::Ranked(rank) => i64::try_from(*rank).unwrap_or(i64::MAX),
            Rank::NotRanked => 0,
            Rank::SectionMissing => -1,
            Rank::ElementMissing => -2,
            Rank::Unparseable => -3,
        }
    }

    /// Parse a rank cell: `-` means not ranked, commas are separators.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text == "-" {
            return Rank::NotRanked;
        }
        match text.replace(',', "").parse::<u64>() {
            Ok(rank) => Rank::Ranked(rank),
            Err(_) => Rank::Unparseable,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The four rank fields read from one ranking page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankFields {
    pub china_rank: Rank,
    pub global_rank: Rank,
    pub china_visitors_rank: Rank,
    pub global_rank_alt: Rank,
}

impl RankFields {
    /// All fields set to the same value; used for empty pages.
    pub fn uniform(rank: Rank) -> Self {
        Self {
            china_rank: rank,
            global_rank: rank,
            china_visitors_rank: rank,
            global_rank_alt: rank,
        }
    }

    pub fn codes(&self) -> [i64; 4] {
        [
            self.china_rank.code(),
            self.global_rank.code(),
            self.china_visitors_rank.code(),
            self.global_rank_alt.code(),
        ]
    }
}

/// A persisted rank record for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankResult {
    pub domain: String,
    pub ranks: RankFields,
    pub crawled_at: NaiveDateTime,
}

impl RankResult {
    pub fn new(domain: impl Into<String>, ranks: RankFields, crawled_at: NaiveDateTime) -> Self {
        Self {
            domain: domain.into(),
            ranks,
            crawled_at,
        }
    }

    /// Render as a result-file line: `domain,rank,rank,rank,rank`.
    pub fn to_line(&self) -> String {
        let [a, b, c, d] = self.ranks.codes();
        format!("{},{a},{b},{c},{d}", self.domain)
    }
}
