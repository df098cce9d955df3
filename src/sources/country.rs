//! Represented country (IOC code) from the WTA player page, with TennisEnDirect as fallback

use super::{slugify, CandidateSource, Candidates};
use crate::error::SourceError;
use crate::model::{Column, PlayerRecord};
use crate::net::Fetcher;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static::lazy_static! {
    static ref PAYS: Regex = Regex::new(r"Pays:\s*([A-Za-z ]+)").unwrap();
}

/// Full country names whose IOC code is not their first three letters
const IOC_OVERRIDES: &[(&str, &str)] = &[("Russia", "RUS"), ("Belarus", "BLR")];

pub fn wta_url(player_id: u64, full_name: &str) -> String {
    format!("https://www.wtatennis.com/players/{}/{}", player_id, slugify(full_name))
}

pub fn ted_url(full_name: &str) -> String {
    format!("https://www.tennisendirect.net/wta/{}/", slugify(full_name))
}

/// The first `<img>` whose alt text is a three-letter code (the flag next to the name)
pub fn parse_wta_country(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img[alt]").ok()?;
    document
        .select(&selector)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| alt.len() == 3 && alt.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_string)
}

/// "Pays: Russia" in the page text, mapped to a code
pub fn parse_ted_country(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<Vec<_>>().join("\n");
    let country = PAYS.captures(&text)?[1].trim().to_string();
    if country.is_empty() {
        return None;
    }
    let code = IOC_OVERRIDES
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| country.chars().take(3).collect::<String>().to_uppercase());
    Some(code)
}

pub struct CountrySource {
    fetcher: Fetcher,
}

impl CountrySource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    fn from_wta(&mut self, player: &PlayerRecord) -> Result<Option<String>, SourceError> {
        let url = wta_url(player.player_id, &player.full_name);
        log::debug!("WTA lookup: {}", url);
        let html = self.fetcher.get_text(&url)?;
        Ok(parse_wta_country(&html))
    }

    fn from_ted(&mut self, player: &PlayerRecord) -> Result<Option<String>, SourceError> {
        let url = ted_url(&player.full_name);
        log::debug!("TennisEnDirect lookup: {}", url);
        let html = self.fetcher.get_text(&url)?;
        Ok(parse_ted_country(&html))
    }
}

impl CandidateSource for CountrySource {
    fn name(&self) -> &str {
        "country"
    }

    fn columns(&self) -> &[Column] {
        &[Column::RepresentedCountry]
    }

    fn fetch(&mut self, player: &PlayerRecord) -> Result<Candidates, SourceError> {
        let wta = self.from_wta(player);
        if let Ok(Some(code)) = &wta {
            return Ok(Candidates::new().with(Column::RepresentedCountry, code.clone()));
        }
        if let Err(e) = &wta {
            log::debug!("WTA lookup failed for {}: {}", player.full_name, e);
        }

        match (self.from_ted(player), wta) {
            (Ok(Some(code)), _) => Ok(Candidates::new().with(Column::RepresentedCountry, code)),
            // Both pages failed outright
            (Err(e), Err(_)) => Err(e),
            _ => Ok(Candidates::new()),
        }
    }
}
