//! World Bank API client for fetching indicator time series.
//!
//! Endpoint shape (API v2, JSON):
//! `GET {base}/country/{codes}/indicator/{indicator}?format=json&date={start}:{end}&per_page=N&page=P`
//!
//! Successful responses are a two-element array `[meta, rows]` where `rows`
//! may be `null` when nothing matched. Errors come back as
//! `[{"message": [{"id": .., "key": .., "value": ..}]}]`.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use super::models::{Indicator, IndicatorSeries, Observation};
use crate::error::{Error, Result};

/// Default public API location
pub const DEFAULT_API_URL: &str = "https://api.worldbank.org/v2";

/// Rows requested per page
const PER_PAGE: u32 = 20_000;

/// Which countries to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountrySelection {
    All,
    Codes(Vec<String>),
}

impl CountrySelection {
    /// Parse a ',' or ';' separated list; "all" or an empty list selects everything
    pub fn parse(list: &str) -> Self {
        let codes: Vec<String> = list
            .split([',', ';'])
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if codes.is_empty() || codes.iter().any(|c| c == "ALL") {
            CountrySelection::All
        } else {
            CountrySelection::Codes(codes)
        }
    }

    fn as_path(&self) -> String {
        match self {
            CountrySelection::All => "all".to_string(),
            CountrySelection::Codes(codes) => codes.join(";"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(deserialize_with = "number_or_string")]
    page: u32,
    #[serde(deserialize_with = "number_or_string")]
    pages: u32,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    id: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiRow {
    country: ApiRef,
    #[serde(default)]
    countryiso3code: String,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    value: String,
}

/// The API is inconsistent about quoting paging numbers
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Blocking client for the World Bank indicators API
#[derive(Debug, Clone)]
pub struct WorldBankClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl WorldBankClient {
    /// Create a client against `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wealth-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(WorldBankClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_url(
        &self,
        indicator: Indicator,
        countries: &CountrySelection,
        start_year: i32,
        end_year: i32,
        page: u32,
    ) -> String {
        format!(
            "{}/country/{}/indicator/{}?format=json&date={}:{}&per_page={}&page={}",
            self.base_url,
            countries.as_path(),
            indicator.code(),
            start_year,
            end_year,
            PER_PAGE,
            page
        )
    }

    /// Fetch every requested indicator.
    ///
    /// All codes are validated before the first request, and the first failure
    /// aborts the whole fetch.
    pub fn fetch_all(
        &self,
        codes: &[String],
        countries: &CountrySelection,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorSeries>> {
        let indicators = codes
            .iter()
            .map(|c| Indicator::from_code(c))
            .collect::<Result<Vec<_>>>()?;
        if indicators.is_empty() {
            return Err(Error::InvalidArgument("no indicators requested".to_string()));
        }

        indicators
            .into_iter()
            .map(|indicator| self.fetch_indicator(indicator, countries, start_year, end_year))
            .collect()
    }

    /// Fetch all pages of one indicator for the given countries and years
    pub fn fetch_indicator(
        &self,
        indicator: Indicator,
        countries: &CountrySelection,
        start_year: i32,
        end_year: i32,
    ) -> Result<IndicatorSeries> {
        if start_year > end_year {
            return Err(Error::InvalidArgument(format!(
                "start year {start_year} is after end year {end_year}"
            )));
        }

        info!(indicator = indicator.code(), "Fetching indicator");

        let mut observations = Vec::new();
        let mut page = 1;
        loop {
            let url = self.build_url(indicator, countries, start_year, end_year, page);
            debug!(%url, "GET");
            let body = self.get(&url)?;
            let (meta, rows) = parse_page(&body)?;
            if meta.page != page {
                return Err(Error::Provider(format!(
                    "requested page {page} but received page {} of {}",
                    meta.page, meta.pages
                )));
            }
            observations.extend(
                rows.into_iter()
                    .filter(|o| (start_year..=end_year).contains(&o.year)),
            );
            if page >= meta.pages {
                break;
            }
            page += 1;
        }

        let series = IndicatorSeries::new(indicator, observations);
        if series.value_count() == 0 {
            warn!(indicator = indicator.code(), "Provider returned no values");
            return Err(Error::EmptyResult {
                indicator: indicator.code().to_string(),
                start: start_year,
                end: end_year,
            });
        }

        info!(
            indicator = indicator.code(),
            rows = series.observations.len(),
            values = series.value_count(),
            "Fetched indicator"
        );
        Ok(series)
    }

    fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("{url} returned HTTP {status}")));
        }

        response.text().map_err(|e| Error::Network(e.to_string()))
    }
}

fn malformed(err: serde_json::Error) -> Error {
    Error::Provider(format!("malformed response: {err}"))
}

/// Parse one response page into its paging info and observations
fn parse_page(body: &str) -> Result<(PageMeta, Vec<Observation>)> {
    let parts: Vec<serde_json::Value> = serde_json::from_str(body).map_err(malformed)?;
    let mut parts = parts.into_iter();

    let head = parts
        .next()
        .ok_or_else(|| Error::Provider("empty response".to_string()))?;

    if let Some(messages) = head.get("message") {
        let messages: Vec<ApiMessage> =
            serde_json::from_value(messages.clone()).map_err(malformed)?;
        let text = messages
            .iter()
            .map(|m| format!("[{}] {}", m.id, m.value.trim()))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Provider(text));
    }

    let meta: PageMeta = serde_json::from_value(head).map_err(malformed)?;
    let rows: Option<Vec<ApiRow>> = match parts.next() {
        Some(value) => serde_json::from_value(value).map_err(malformed)?,
        None => None,
    };

    let observations = rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let year = row
                .date
                .trim()
                .parse::<i32>()
                .map_err(|_| Error::Provider(format!("unexpected date: {}", row.date)))?;
            let country_code = if row.countryiso3code.is_empty() {
                row.country.id
            } else {
                row.countryiso3code
            };
            Ok(Observation {
                country_code,
                country: row.country.value,
                year,
                value: row.value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((meta, observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn page_body(page: u32, pages: u32, rows: &str) -> String {
        format!(
            r#"[{{"page":{page},"pages":{pages},"per_page":"20000","total":3,"sourceid":"2"}},{rows}]"#
        )
    }

    const ITALY_ROWS: &str = r#"[
        {"indicator":{"id":"NY.GDP.PCAP.CD","value":"GDP per capita (current US$)"},
         "country":{"id":"IT","value":"Italy"},"countryiso3code":"ITA","date":"2020",
         "value":31911.3,"unit":"","obs_status":"","decimal":1},
        {"indicator":{"id":"NY.GDP.PCAP.CD","value":"GDP per capita (current US$)"},
         "country":{"id":"IT","value":"Italy"},"countryiso3code":"ITA","date":"2019",
         "value":null,"unit":"","obs_status":"","decimal":1}
    ]"#;

    const WORLD_ROWS: &str = r#"[
        {"indicator":{"id":"NY.GDP.PCAP.CD","value":"GDP per capita (current US$)"},
         "country":{"id":"1W","value":"World"},"countryiso3code":"WLD","date":"2020",
         "value":10936.1,"unit":"","obs_status":"","decimal":1}
    ]"#;

    fn client(url: &str) -> WorldBankClient {
        WorldBankClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_page_rows() {
        let (meta, rows) = parse_page(&page_body(1, 1, ITALY_ROWS)).unwrap();
        assert_eq!((meta.page, meta.pages), (1, 1));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country_code, "ITA");
        assert_eq!(rows[0].country, "Italy");
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].value, Some(31911.3));
        assert_eq!(rows[1].value, None);
    }

    #[test]
    fn test_parse_page_null_rows() {
        let (_, rows) = parse_page(&page_body(1, 0, "null")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_page_error_payload() {
        let body = r#"[{"message":[{"id":"120","key":"Invalid value","value":"The provided parameter value is not valid"}]}]"#;
        let err = parse_page(body).unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("120")));
    }

    #[test]
    fn test_country_selection_parse() {
        assert_eq!(CountrySelection::parse("all"), CountrySelection::All);
        assert_eq!(CountrySelection::parse(""), CountrySelection::All);
        assert_eq!(
            CountrySelection::parse("it, de"),
            CountrySelection::Codes(vec!["IT".into(), "DE".into()])
        );
        assert_eq!(
            CountrySelection::parse("IT,DE").as_path(),
            "IT;DE"
        );
    }

    #[test]
    fn test_fetch_indicator_follows_pages() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", Matcher::Regex(r"^/country/all/indicator/NY\.GDP\.PCAP\.CD".into()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("date".into(), "2019:2020".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(page_body(1, 2, ITALY_ROWS))
            .create();
        let second = server
            .mock("GET", Matcher::Regex(r"^/country/all/indicator/NY\.GDP\.PCAP\.CD".into()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("date".into(), "2019:2020".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(page_body(2, 2, WORLD_ROWS))
            .create();

        let series = client(&server.url())
            .fetch_indicator(Indicator::GdpPerCapita, &CountrySelection::All, 2019, 2020)
            .unwrap();

        first.assert();
        second.assert();
        assert_eq!(series.indicator, Indicator::GdpPerCapita);
        assert_eq!(series.observations.len(), 3);
        assert_eq!(series.value_count(), 2);
    }

    #[test]
    fn test_repeated_page_number_is_provider_error() {
        let mut server = mockito::Server::new();
        // Always answers "page 1 of 2", whatever page was asked for
        let stuck = server
            .mock("GET", Matcher::Regex(r"^/country/all/indicator/NY\.GDP\.PCAP\.CD".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page_body(1, 2, ITALY_ROWS))
            .expect(2)
            .create();

        let err = client(&server.url())
            .fetch_indicator(Indicator::GdpPerCapita, &CountrySelection::All, 2019, 2020)
            .unwrap_err();

        stuck.assert();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("page 2")));
    }

    #[test]
    fn test_malformed_body_is_provider_error() {
        let err = parse_page("<html>Service unavailable</html>").unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("malformed")));

        let err = parse_page(r#"[{"page":"one","pages":1},[]]"#).unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_fetch_indicator_empty_result() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/country/ITA/indicator/SH\.DYN\.MORT".into()))
            .with_status(200)
            .with_body(page_body(1, 0, "null"))
            .create();

        let err = client(&server.url())
            .fetch_indicator(
                Indicator::ChildMortality,
                &CountrySelection::Codes(vec!["ITA".into()]),
                2010,
                2020,
            )
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResult { ref indicator, .. } if indicator == "SH.DYN.MORT"));
    }

    #[test]
    fn test_http_error_is_network_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(503)
            .create();

        let err = client(&server.url())
            .fetch_indicator(Indicator::LifeExpectancy, &CountrySelection::All, 2010, 2020)
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let err = client("http://127.0.0.1:1")
            .fetch_indicator(Indicator::LifeExpectancy, &CountrySelection::All, 2010, 2020)
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_unsupported_code_fails_before_request() {
        // An unreachable host would produce a network error if a request were made
        let err = client("http://127.0.0.1:1")
            .fetch_all(
                &["NY.GDP.PCAP.CD".to_string(), "SP.POP.TOTL".to_string()],
                &CountrySelection::All,
                2010,
                2020,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedIndicator(code) if code == "SP.POP.TOTL"));
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let err = client("http://127.0.0.1:1")
            .fetch_indicator(Indicator::GdpPerCapita, &CountrySelection::All, 2020, 2010)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
