// 🧭 Column candidates - ordered name lists per semantic field
//
// Source files disagree on column naming. Each field is resolved once per
// table with `Table::resolve`, first candidate present wins.

/// Country code columns tried when deriving a continent
pub const COUNTRY_CODE: &[&str] = &["country_code", "code", "noc", "NOC", "Country Code"];

/// Country code columns for per-athlete rows, where `code` is the athlete's own id
pub const COUNTRY_CODE_STRICT: &[&str] = &["country_code", "noc", "NOC", "Country Code"];

/// Columns a country selection is matched against
pub const COUNTRY: &[&str] = &["country", "country_code", "code", "noc", "NOC", "Country"];

pub const COUNTRY_NAME: &[&str] = &["country", "Country"];

pub const SPORT: &[&str] = &["sport", "Sport", "discipline", "Discipline"];

/// Same field as `SPORT`, preferring the discipline of medal rows
pub const DISCIPLINE: &[&str] = &["discipline", "Discipline", "sport", "Sport"];

pub const EVENT: &[&str] = &["event", "Event"];

pub const MEDAL_TYPE: &[&str] = &["medal_type", "medal", "Medal", "medal_code"];

pub const GENDER: &[&str] = &["gender", "Gender", "sex", "Sex"];

pub const AGE: &str = "age";

pub const CONTINENT: &str = "continent";

pub const ATHLETE_CODE: &[&str] = &["code", "athlete_code", "code_athlete", "Code", "Athlete Code"];

pub const ATHLETE_NAME: &[&str] = &["name", "athlete_name", "athlete"];

pub const BIRTH_DATE: &str = "birth_date";

pub const MEDAL_DATE: &[&str] = &["medal_date", "date"];

/// Canonical medal columns after normalization
pub const GOLD: &str = "Gold";
pub const SILVER: &str = "Silver";
pub const BRONZE: &str = "Bronze";
pub const TOTAL: &str = "Total";

// Per-sport results tables
pub const PARTICIPANT_COUNTRY_CODE: &str = "participant_country_code";
pub const PARTICIPANT_NAME: &str = "participant_name";
pub const PARTICIPANT_TYPE: &str = "participant_type";
pub const STAGE_CODE: &str = "stage_code";
