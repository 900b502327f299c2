//! Continent lookup for World Bank country codes.
//!
//! Aggregates the API reports alongside countries (World, income groups,
//! regional blocs) have no continent and map to `None`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Continent a country is grouped under on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    Africa,
    Asia,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    #[serde(alias = "Oceania")]
    Australia,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::Africa,
        Continent::Asia,
        Continent::Europe,
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Australia,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Australia => "Australia",
        }
    }

    /// Look up the continent for an ISO 3166-1 alpha-3 code
    pub fn from_iso3(code: &str) -> Option<Continent> {
        let code = code.trim().to_ascii_uppercase();
        let code = code.as_str();
        if AFRICA.contains(&code) {
            Some(Continent::Africa)
        } else if ASIA.contains(&code) {
            Some(Continent::Asia)
        } else if EUROPE.contains(&code) {
            Some(Continent::Europe)
        } else if NORTH_AMERICA.contains(&code) {
            Some(Continent::NorthAmerica)
        } else if SOUTH_AMERICA.contains(&code) {
            Some(Continent::SouthAmerica)
        } else if OCEANIA.contains(&code) {
            Some(Continent::Australia)
        } else {
            None
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Continent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("oceania") {
            return Ok(Continent::Australia);
        }
        Continent::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown continent: {s}")))
    }
}

const AFRICA: &[&str] = &[
    "DZA", "AGO", "BEN", "BWA", "BFA", "BDI", "CPV", "CMR", "CAF", "TCD", "COM", "COD", "COG",
    "CIV", "DJI", "EGY", "GNQ", "ERI", "SWZ", "ETH", "GAB", "GMB", "GHA", "GIN", "GNB", "KEN",
    "LSO", "LBR", "LBY", "MDG", "MWI", "MLI", "MRT", "MUS", "MAR", "MOZ", "NAM", "NER", "NGA",
    "RWA", "STP", "SEN", "SYC", "SLE", "SOM", "ZAF", "SSD", "SDN", "TZA", "TGO", "TUN", "UGA",
    "ZMB", "ZWE",
];

// Russia is grouped with Asia, matching how the dashboard has always shown it.
const ASIA: &[&str] = &[
    "AFG", "ARM", "AZE", "BHR", "BGD", "BTN", "BRN", "KHM", "CHN", "CYP", "GEO", "HKG", "IND",
    "IDN", "IRN", "IRQ", "ISR", "JPN", "JOR", "KAZ", "KWT", "KGZ", "LAO", "LBN", "MAC", "MYS",
    "MDV", "MNG", "MMR", "NPL", "PRK", "OMN", "PAK", "PSE", "PHL", "QAT", "RUS", "SAU", "SGP",
    "KOR", "LKA", "SYR", "TJK", "THA", "TLS", "TUR", "TKM", "ARE", "UZB", "VNM", "YEM",
];

const EUROPE: &[&str] = &[
    "ALB", "AND", "AUT", "BLR", "BEL", "BIH", "BGR", "HRV", "CZE", "DNK", "EST", "FRO", "FIN",
    "FRA", "DEU", "GIB", "GRC", "HUN", "ISL", "IRL", "IMN", "ITA", "XKX", "LVA", "LIE", "LTU",
    "LUX", "MLT", "MDA", "MCO", "MNE", "NLD", "MKD", "NOR", "POL", "PRT", "ROU", "SMR", "SRB",
    "SVK", "SVN", "ESP", "SWE", "CHE", "UKR", "GBR", "CHI",
];

const NORTH_AMERICA: &[&str] = &[
    "ATG", "ABW", "BHS", "BRB", "BLZ", "BMU", "VGB", "CAN", "CYM", "CRI", "CUB", "CUW", "DMA",
    "DOM", "SLV", "GRL", "GRD", "GTM", "HTI", "HND", "JAM", "MEX", "NIC", "PAN", "PRI", "KNA",
    "LCA", "MAF", "VCT", "SXM", "TTO", "TCA", "USA", "VIR",
];

const SOUTH_AMERICA: &[&str] = &[
    "ARG", "BOL", "BRA", "CHL", "COL", "ECU", "GUY", "PRY", "PER", "SUR", "URY", "VEN",
];

const OCEANIA: &[&str] = &[
    "ASM", "AUS", "FJI", "PYF", "GUM", "KIR", "MHL", "FSM", "NRU", "NCL", "NZL", "MNP", "PLW",
    "PNG", "WSM", "SLB", "TON", "TUV", "VUT",
];
