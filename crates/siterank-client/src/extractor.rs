use std::sync::Arc;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use siterank_core::config::AltRankStrategy;
use siterank_core::error::AppError;
use siterank_core::models::{Rank, RankFields};
use siterank_core::traits::RankParser;

/// Rank embedded in the page's bootstrap JSON, e.g.
/// `"siteinfo":{"rank":{"country":{...},"global":1234}`.
const SCRIPT_RANK_PATTERN: &str = r#""siteinfo":\{"rank":\{.*"global":([\d\w]+)"#;

struct Selectors {
    rank_panel: Selector,
    country_rank: Selector,
    china_flag_title: Selector,
    global_rank: Selector,
    global_rank_icon: Selector,
    visitors: Selector,
    table: Selector,
    tbody: Selector,
    china_flag_alt: Selector,
    td: Selector,
    span: Selector,
    script: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, AppError> {
        Ok(Self {
            rank_panel: selector("section#rank-panel-content")?,
            country_rank: selector("span.countryRank")?,
            china_flag_title: selector(r#"img[title="China Flag"]"#)?,
            global_rank: selector(r#"span[data-cat="globalRank"]"#)?,
            global_rank_icon: selector(r#"img[title="Global rank icon"]"#)?,
            visitors: selector("section#visitors-content")?,
            table: selector("table")?,
            tbody: selector("tbody")?,
            china_flag_alt: selector(r#"img[alt="China Flag"]"#)?,
            td: selector("td")?,
            span: selector("span")?,
            script: selector("script")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Generic(format!("Invalid selector '{css}': {e}")))
}

/// Reads the four rank fields from a ranking provider page.
///
/// Each field is computed by its own strategy against a single parsed
/// document; a strategy that cannot find its data yields a sentinel
/// [`Rank`] and never affects the others.
#[derive(Clone)]
pub struct HtmlRankExtractor {
    selectors: Arc<Selectors>,
    script_rank: Regex,
    alt_strategy: AltRankStrategy,
}

impl HtmlRankExtractor {
    pub fn new() -> Result<Self, AppError> {
        Self::with_alt_strategy(AltRankStrategy::default())
    }

    pub fn with_alt_strategy(alt_strategy: AltRankStrategy) -> Result<Self, AppError> {
        let script_rank = Regex::new(SCRIPT_RANK_PATTERN)
            .map_err(|e| AppError::Generic(format!("Invalid script rank pattern: {e}")))?;
        Ok(Self {
            selectors: Arc::new(Selectors::compile()?),
            script_rank,
            alt_strategy,
        })
    }

    /// Extract all four fields. An empty page yields `-1` everywhere.
    pub fn extract(&self, page: &[u8]) -> RankFields {
        if page.is_empty() {
            return RankFields::uniform(Rank::SectionMissing);
        }

        let html = String::from_utf8_lossy(page);
        let doc = Html::parse_document(&html);

        let global_rank = self.global_rank(&doc);
        let global_rank_alt = match self.alt_strategy {
            AltRankStrategy::Script => self.script_global_rank(&doc),
            AltRankStrategy::Panel => global_rank,
        };

        RankFields {
            china_rank: self.china_rank(&doc),
            global_rank,
            china_visitors_rank: self.china_visitors_rank(&doc),
            global_rank_alt,
        }
    }

    /// Country rank from the rank panel's country list.
    fn china_rank(&self, doc: &Html) -> Rank {
        let s = &self.selectors;
        let Some(section) = doc.select(&s.rank_panel).next() else {
            return Rank::SectionMissing;
        };
        // Country not listed at all: not ranked there
        let Some(country) = section.select(&s.country_rank).next() else {
            return Rank::NotRanked;
        };
        let Some(flag) = country.select(&s.china_flag_title).next() else {
            return Rank::NotRanked;
        };
        match sibling_text(flag) {
            Some(text) => Rank::from_text(&text),
            None => Rank::ElementMissing,
        }
    }

    /// Global rank from the rank panel, next to the global rank icon.
    fn global_rank(&self, doc: &Html) -> Rank {
        let s = &self.selectors;
        let Some(section) = doc.select(&s.rank_panel).next() else {
            return Rank::SectionMissing;
        };
        let text = section
            .select(&s.global_rank)
            .next()
            .and_then(|span| span.select(&s.global_rank_icon).next())
            .and_then(sibling_text);
        match text {
            Some(text) => Rank::from_text(&text),
            None => Rank::ElementMissing,
        }
    }

    /// Country rank from the visitors breakdown table.
    fn china_visitors_rank(&self, doc: &Html) -> Rank {
        let s = &self.selectors;
        let Some(section) = doc.select(&s.visitors).next() else {
            return Rank::SectionMissing;
        };
        let Some(body) = section
            .select(&s.table)
            .next()
            .and_then(|table| table.select(&s.tbody).next())
        else {
            return Rank::ElementMissing;
        };
        let Some(flag) = body.select(&s.china_flag_alt).next() else {
            return Rank::NotRanked;
        };

        let cell = flag
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr")
            .and_then(|row| row.select(&s.td).nth(2))
            .and_then(|td| td.select(&s.span).next());
        match cell {
            Some(span) => Rank::from_text(&span.text().collect::<String>()),
            None => Rank::ElementMissing,
        }
    }

    /// Global rank from the JSON bootstrap inside an inline script.
    fn script_global_rank(&self, doc: &Html) -> Rank {
        let script = doc
            .select(&self.selectors.script)
            .map(|el| el.text().collect::<String>())
            .find(|text| self.script_rank.is_match(text));
        let Some(script) = script else {
            return Rank::SectionMissing;
        };
        let Some(rank) = self
            .script_rank
            .captures(&script)
            .and_then(|caps| caps.get(1))
        else {
            return Rank::ElementMissing;
        };
        match rank.as_str() {
            "false" => Rank::NotRanked,
            raw => raw.parse().map(Rank::Ranked).unwrap_or(Rank::Unparseable),
        }
    }
}

/// Text of the node right after `el`, whether a text node or an element.
fn sibling_text(el: ElementRef<'_>) -> Option<String> {
    let node = el.next_sibling()?;
    match node.value() {
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(node).map(|el| el.text().collect()),
        _ => None,
    }
}

impl RankParser for HtmlRankExtractor {
    fn parse(&self, page: &[u8]) -> RankFields {
        self.extract(page)
    }
}
