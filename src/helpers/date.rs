//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Languages with built-in month and weekday names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
    En,
    PtBr,
}

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const EN_MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const EN_WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const EN_WEEKDAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const PT_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];
const PT_MONTHS_SHORT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const PT_WEEKDAYS: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];
const PT_WEEKDAYS_SHORT: [&str; 7] = ["dom", "seg", "ter", "qua", "qui", "sex", "sáb"];

impl DateLocale {
    /// Parse a language tag; anything that is not Portuguese falls back to English
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
        if tag == "pt" || tag.starts_with("pt-") {
            Self::PtBr
        } else {
            Self::En
        }
    }

    fn months(self) -> &'static [&'static str; 12] {
        match self {
            Self::En => &EN_MONTHS,
            Self::PtBr => &PT_MONTHS,
        }
    }

    fn months_short(self) -> &'static [&'static str; 12] {
        match self {
            Self::En => &EN_MONTHS_SHORT,
            Self::PtBr => &PT_MONTHS_SHORT,
        }
    }

    fn weekdays(self) -> &'static [&'static str; 7] {
        match self {
            Self::En => &EN_WEEKDAYS,
            Self::PtBr => &PT_WEEKDAYS,
        }
    }

    fn weekdays_short(self) -> &'static [&'static str; 7] {
        match self {
            Self::En => &EN_WEEKDAYS_SHORT,
            Self::PtBr => &PT_WEEKDAYS_SHORT,
        }
    }
}

/// A pattern, a language and a timezone to render publication dates with
#[derive(Debug, Clone, PartialEq)]
pub struct DateStyle {
    pub format: String,
    pub locale: DateLocale,
    pub timezone: Tz,
}

impl DateStyle {
    pub fn new(format: &str, locale: DateLocale, timezone: Tz) -> Self {
        Self {
            format: format.to_string(),
            locale,
            timezone,
        }
    }

    /// Style used on the post listing
    pub fn listing(config: &SiteConfig) -> Self {
        Self::new(
            &config.listing_date_format,
            DateLocale::parse(&config.listing_date_locale),
            parse_timezone(&config.timezone),
        )
    }

    /// Style used on post pages
    pub fn post(config: &SiteConfig) -> Self {
        Self::new(
            &config.post_date_format,
            DateLocale::parse(&config.post_date_locale),
            parse_timezone(&config.timezone),
        )
    }

    pub fn format(&self, date: &DateTime<Utc>) -> String {
        format_date(&date.with_timezone(&self.timezone), &self.format, self.locale)
    }
}

/// Resolve an IANA timezone name; empty or unknown names mean UTC
pub fn parse_timezone(name: &str) -> Tz {
    let name = name.trim();
    if name.is_empty() {
        return Tz::UTC;
    }
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, using UTC", name);
        Tz::UTC
    })
}

/// Moment.js tokens, longest first so `MMMM` wins over `MM`
const TOKENS: [&str; 24] = [
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "DDDD", "DD", "D", "dddd", "ddd", "HH", "H", "hh",
    "h", "mm", "m", "ss", "s", "SSS", "ZZ", "Z", "A", "a",
];

/// Format a date using a Moment.js-compatible pattern
///
/// Text inside `[...]` is copied verbatim.
///
/// # Examples
/// ```ignore
/// format_date(&date, "D MMM YYYY", DateLocale::En) // -> "15 Mar 2021"
/// format_date(&date, "DD MMM YYYY", DateLocale::PtBr) // -> "15 mar 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, format: &str, locale: DateLocale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let mut result = String::with_capacity(format.len() + 8);
    let mut rest = format;

    while !rest.is_empty() {
        if let Some(literal) = rest.strip_prefix('[') {
            if let Some(end) = literal.find(']') {
                result.push_str(&literal[..end]);
                rest = &literal[end + 1..];
                continue;
            }
        }

        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            result.push_str(&render_token(date, token, locale));
            rest = &rest[token.len()..];
            continue;
        }

        match rest.chars().next() {
            Some(c) => {
                result.push(c);
                rest = &rest[c.len_utf8()..];
            }
            None => break,
        }
    }

    result
}

fn render_token<Tz2: TimeZone>(date: &DateTime<Tz2>, token: &str, locale: DateLocale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let month = date.month0() as usize;
    let weekday = date.weekday().num_days_from_sunday() as usize;
    match token {
        "YYYY" => date.format("%Y").to_string(),
        "YY" => date.format("%y").to_string(),
        "MMMM" => locale.months()[month].to_string(),
        "MMM" => locale.months_short()[month].to_string(),
        "MM" => date.format("%m").to_string(),
        "M" => date.month().to_string(),
        "DDDD" => date.format("%j").to_string(),
        "DD" => date.format("%d").to_string(),
        "D" => date.day().to_string(),
        "dddd" => locale.weekdays()[weekday].to_string(),
        "ddd" => locale.weekdays_short()[weekday].to_string(),
        "HH" => date.format("%H").to_string(),
        "H" => date.hour().to_string(),
        "hh" => date.format("%I").to_string(),
        "h" => date.hour12().1.to_string(),
        "mm" => date.format("%M").to_string(),
        "m" => date.minute().to_string(),
        "ss" => date.format("%S").to_string(),
        "s" => date.second().to_string(),
        "SSS" => date.format("%3f").to_string(),
        "ZZ" => date.format("%z").to_string(),
        "Z" => date.format("%:z").to_string(),
        "A" => date.format("%p").to_string(),
        "a" => date.format("%P").to_string(),
        other => other.to_string(),
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ides_of_march() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_listing_format() {
        let style = DateStyle::new("D MMM YYYY", DateLocale::En, Tz::UTC);
        assert_eq!(style.format(&ides_of_march()), "15 Mar 2021");
    }

    #[test]
    fn test_post_format_portuguese() {
        let style = DateStyle::new("DD MMM YYYY", DateLocale::PtBr, Tz::UTC);
        assert_eq!(style.format(&ides_of_march()), "15 mar 2021");
    }

    #[test]
    fn test_default_styles_from_config() {
        let config = SiteConfig::default();
        assert_eq!(DateStyle::listing(&config).format(&ides_of_march()), "15 Mar 2021");
        assert_eq!(DateStyle::post(&config).format(&ides_of_march()), "15 mar 2021");
    }

    #[test]
    fn test_day_padding() {
        let date = Utc.with_ymd_and_hms(2021, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date, "D MMM YYYY", DateLocale::En), "5 Mar 2021");
        assert_eq!(format_date(&date, "DD/MM/YYYY", DateLocale::En), "05/03/2021");
    }

    #[test]
    fn test_timezone_shift() {
        let style = DateStyle::new("D MMM YYYY", DateLocale::En, parse_timezone("America/Sao_Paulo"));
        assert_eq!(style.format(&ides_of_march()), "14 Mar 2021");
    }

    #[test]
    fn test_full_names_and_literals() {
        let date = ides_of_march();
        assert_eq!(
            format_date(&date, "dddd, D [de] MMMM", DateLocale::PtBr),
            "segunda-feira, 15 de março"
        );
        assert_eq!(format_date(&date, "HH:mm:ss", DateLocale::En), "00:00:00");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(DateLocale::parse("pt-BR"), DateLocale::PtBr);
        assert_eq!(DateLocale::parse("pt_br"), DateLocale::PtBr);
        assert_eq!(DateLocale::parse("en"), DateLocale::En);
        assert_eq!(DateLocale::parse("fr"), DateLocale::En);
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        assert_eq!(parse_timezone("Mars/Olympus_Mons"), Tz::UTC);
        assert_eq!(parse_timezone(""), Tz::UTC);
    }
}
