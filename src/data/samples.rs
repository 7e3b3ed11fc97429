//! Embedded sample rows used once every path of a resource has failed.

use crate::core::RawRow;

/// Crash counts per state (`State`, `Total Crashes Liability`).
pub const CRASHES_CSV: &str = "Data.csv";
/// Average annual insurance cost per state (`State`, `Avg annual cost`).
pub const COSTS_CSV: &str = "Data2.csv";
/// Population density per state.
pub const POPULATION_CSV: &str = "Population.csv";
pub const INSURANCE_RATES_CSV: &str = "data/insurance_rates.csv";
pub const FACTORS_CSV: &str = "data/factors.csv";
pub const ACCIDENT_RATES_CSV: &str = "data/accident_rates.csv";
pub const POPULATION_DENSITY_CSV: &str = "data/population_density.csv";

/// Static table with the same shape as a parsed CSV document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTable {
    pub headers: &'static [&'static str],
    pub rows: &'static [&'static [&'static str]],
}

impl SampleTable {
    #[must_use]
    pub fn to_rows(self) -> Vec<RawRow> {
        self.rows
            .iter()
            .map(|values| RawRow::from_pairs(self.headers.iter().copied().zip(values.iter().copied())))
            .collect()
    }
}

const CRASHES: SampleTable = SampleTable {
    headers: &["State", "Total Crashes Liability"],
    rows: &[
        &["Alabama", "1,512"],
        &["California", "2,817"],
        &["Florida", "3,104"],
        &["Michigan", "2,206"],
        &["New York", "2,954"],
        &["Texas", "3,000"],
    ],
};

const COSTS: SampleTable = SampleTable {
    headers: &["State", "Avg annual cost"],
    rows: &[
        &["Alabama", "$1,995"],
        &["California", "$2,416"],
        &["Florida", "$3,183"],
        &["Michigan", "$2,691"],
        &["New York", "$3,139"],
        &["Texas", "$1,872"],
    ],
};

const POPULATION: SampleTable = SampleTable {
    headers: &["State", "Population Density (people/sq. mile)"],
    rows: &[
        &["Alabama", "99.2"],
        &["California", "253.7"],
        &["Florida", "401.4"],
        &["Michigan", "177.6"],
        &["New York", "428.7"],
        &["Texas", "111.6"],
    ],
};

const INSURANCE_RATES: SampleTable = SampleTable {
    headers: &["state", "rate"],
    rows: &[
        &["Alabama", "1995"],
        &["California", "2416"],
        &["Florida", "3183"],
        &["Michigan", "2691"],
        &["New York", "3139"],
        &["Texas", "1872"],
    ],
};

const ACCIDENT_RATES: SampleTable = SampleTable {
    headers: &["state", "rate"],
    rows: &[
        &["Alabama", "196.4"],
        &["California", "98.7"],
        &["Florida", "158.3"],
        &["Michigan", "115.1"],
        &["New York", "54.3"],
        &["Texas", "152.0"],
    ],
};

const POPULATION_DENSITY: SampleTable = SampleTable {
    headers: &["state", "density"],
    rows: &[
        &["Alabama", "99.2"],
        &["California", "253.7"],
        &["Florida", "401.4"],
        &["Michigan", "177.6"],
        &["New York", "428.7"],
        &["Texas", "111.6"],
    ],
};

const FACTORS: SampleTable = SampleTable {
    headers: &[
        "state",
        "accident_rate",
        "population_density",
        "urban_population",
        "vehicle_theft",
        "average_age",
        "natural_disasters",
    ],
    rows: &[
        &["Alabama", "19.6", "9.9", "57.7", "28.4", "39.4", "7.0"],
        &["California", "9.9", "25.4", "94.2", "49.6", "37.3", "8.5"],
        &["Florida", "15.8", "40.1", "91.5", "19.1", "42.2", "9.1"],
        &["Michigan", "11.5", "17.8", "73.6", "26.8", "39.9", "3.2"],
        &["New York", "5.4", "42.9", "87.9", "8.1", "39.0", "4.4"],
        &["Texas", "15.2", "11.2", "83.7", "33.5", "35.5", "9.6"],
    ],
};

/// Sample table registered for `resource`, matched on its path without a
/// leading `/`.
#[must_use]
pub fn sample_for(resource: &str) -> Option<SampleTable> {
    match resource.trim_start_matches('/') {
        CRASHES_CSV => Some(CRASHES),
        COSTS_CSV => Some(COSTS),
        POPULATION_CSV => Some(POPULATION),
        INSURANCE_RATES_CSV => Some(INSURANCE_RATES),
        FACTORS_CSV => Some(FACTORS),
        ACCIDENT_RATES_CSV => Some(ACCIDENT_RATES),
        POPULATION_DENSITY_CSV => Some(POPULATION_DENSITY),
        _ => None,
    }
}
