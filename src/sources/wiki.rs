//! Biographical fields from a player's English Wikipedia infobox

use super::height::format_heights;
use super::{clean_ws, CandidateSource, Candidates};
use crate::error::SourceError;
use crate::model::{format_date, parse_date, Column, PlayerRecord};
use crate::net::Fetcher;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

const WIKI_BASE: &str = "https://en.wikipedia.org/wiki/";

lazy_static::lazy_static! {
    static ref LONG_DATE: Regex = Regex::new(r"([A-Za-z]+ \d{1,2}, \d{4})").unwrap();
    static ref FOOTNOTE: Regex = Regex::new(r"\[.*?\]").unwrap();
    static ref US_STATE_ABBR: HashMap<&'static str, &'static str> = [
        ("Alabama", "AL"), ("Alaska", "AK"), ("Arizona", "AZ"), ("Arkansas", "AR"),
        ("California", "CA"), ("Colorado", "CO"), ("Connecticut", "CT"), ("Delaware", "DE"),
        ("Florida", "FL"), ("Georgia", "GA"), ("Hawaii", "HI"), ("Idaho", "ID"),
        ("Illinois", "IL"), ("Indiana", "IN"), ("Iowa", "IA"), ("Kansas", "KS"),
        ("Kentucky", "KY"), ("Louisiana", "LA"), ("Maine", "ME"), ("Maryland", "MD"),
        ("Massachusetts", "MA"), ("Michigan", "MI"), ("Minnesota", "MN"), ("Mississippi", "MS"),
        ("Missouri", "MO"), ("Montana", "MT"), ("Nebraska", "NE"), ("Nevada", "NV"),
        ("New Hampshire", "NH"), ("New Jersey", "NJ"), ("New Mexico", "NM"), ("New York", "NY"),
        ("North Carolina", "NC"), ("North Dakota", "ND"), ("Ohio", "OH"), ("Oklahoma", "OK"),
        ("Oregon", "OR"), ("Pennsylvania", "PA"), ("Rhode Island", "RI"), ("South Carolina", "SC"),
        ("South Dakota", "SD"), ("Tennessee", "TN"), ("Texas", "TX"), ("Utah", "UT"),
        ("Vermont", "VT"), ("Virginia", "VA"), ("Washington", "WA"), ("West Virginia", "WV"),
        ("Wisconsin", "WI"), ("Wyoming", "WY"),
    ]
    .into_iter()
    .collect();
}

/// Raw infobox fields before formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoboxData {
    pub height: Option<String>,
    pub plays: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
}

pub struct WikiSource {
    fetcher: Fetcher,
}

impl WikiSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

impl CandidateSource for WikiSource {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn columns(&self) -> &[Column] {
        &Column::BIOGRAPHICAL
    }

    fn fetch(&mut self, player: &PlayerRecord) -> Result<Candidates, SourceError> {
        let url = wiki_url(&player.full_name);
        let html = self.fetcher.get_text(&url)?;
        let info = parse_infobox(&html).ok_or_else(|| SourceError::MissingStructure(format!("no infobox at {}", url)))?;
        Ok(candidates_from_infobox(&info))
    }
}

/// Article URL for a player name
pub fn wiki_url(full_name: &str) -> String {
    format!("{}{}", WIKI_BASE, full_name.trim().replace(' ', "_"))
}

/// Extract the infobox fields we care about. `None` if the page has no infobox.
pub fn parse_infobox(html: &str) -> Option<InfoboxData> {
    let document = Html::parse_document(html);
    let infobox_selector = Selector::parse("table.infobox").ok()?;
    let row_selector = Selector::parse("tr").ok()?;
    let th_selector = Selector::parse("th").ok()?;
    let td_selector = Selector::parse("td").ok()?;
    let bday_selector = Selector::parse("span.bday").ok()?;

    let infobox = document.select(&infobox_selector).next()?;
    let mut out = InfoboxData::default();

    for row in infobox.select(&row_selector) {
        let (Some(th), Some(td)) = (row.select(&th_selector).next(), row.select(&td_selector).next()) else {
            continue;
        };
        let label = clean_ws(&th.text().collect::<String>());
        let value = clean_ws(&td.text().collect::<Vec<_>>().join(" "));

        match label.as_str() {
            "Height" => out.height = Some(value),
            "Plays" => {
                let hand = if value.contains("Left") { "Left-Handed" } else { "Right-Handed" };
                out.plays = Some(hand.to_string());
            }
            "Born" => {
                out.birth_date = match td.select(&bday_selector).next() {
                    Some(span) => Some(span.text().collect::<String>().trim().to_string()),
                    None => LONG_DATE.captures(&value).map(|c| c[1].to_string()),
                };
                out.birth_place = text_after_break(&td);
            }
            _ => {}
        }
    }

    Some(out)
}

/// Text of the cell's children after its first `<br>`
fn text_after_break(td: &ElementRef) -> Option<String> {
    let mut after_br = false;
    let mut parts = Vec::new();

    for child in td.children() {
        if !after_br {
            if let Node::Element(el) = child.value() {
                if el.name() == "br" {
                    after_br = true;
                }
            }
            continue;
        }
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                parts.push(text.to_string());
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    parts.push(el.text().collect::<String>());
                }
            }
            _ => {}
        }
    }

    let text = clean_ws(&parts.concat());
    if text.is_empty() { None } else { Some(text) }
}

/// Strip footnote markers and abbreviate US states in "City, State, Country"
pub fn normalize_birthplace(place: &str) -> Option<String> {
    let place = FOOTNOTE.replace_all(place, "");
    let mut parts: Vec<String> = place.split(',').map(|p| p.trim().to_string()).collect();
    if parts.iter().all(|p| p.is_empty()) {
        return None;
    }
    if parts.len() == 3 {
        if let Some(abbr) = US_STATE_ABBR.get(parts[1].as_str()) {
            parts[1] = abbr.to_string();
        }
    }
    Some(parts.join(", "))
}

/// Format raw infobox data into candidate cell values
pub fn candidates_from_infobox(info: &InfoboxData) -> Candidates {
    let (inches, cm) = info.height.as_deref().map(format_heights).unwrap_or((None, None));
    let birth_date = info
        .birth_date
        .as_deref()
        .and_then(parse_date)
        .map(|d| format_date(Some(d)));
    let birthplace = info.birth_place.as_deref().and_then(normalize_birthplace);

    Candidates::new()
        .with(Column::HeightInches, inches.unwrap_or_default())
        .with(Column::HeightCm, cm.unwrap_or_default())
        .with(Column::Plays, info.plays.clone().unwrap_or_default())
        .with(Column::BirthDate, birth_date.unwrap_or_default())
        .with(Column::Birthplace, birthplace.unwrap_or_default())
}
