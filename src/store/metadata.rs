use std::collections::HashSet;

use chrono::{DateTime, Duration, SecondsFormat, Timelike, Utc};
use rand::Rng;

use crate::store::attrs::{read_string_attr, write_string_attr};
use crate::store::Category;
use crate::Error;

/// Number of decimal digits in a group identifier.
pub const QID_DIGITS: usize = 10;

const DESCRIPTION_ATTR: &str = "description";
const DATE_ATTR: &str = "creation_date";

/// Identity and bookkeeping attached to every stored group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMeta {
    pub category: Category,
    /// The data type within the category, e.g. `B_TC` or `gc`.
    pub type_name: String,
    /// Unique, immutable identifier.
    pub qid: String,
    pub description: String,
    /// Creation time, strictly increasing within a file.
    pub date: DateTime<Utc>,
}

impl GroupMeta {
    /// Name of the group inside its section.
    pub fn key(&self) -> String {
        format!("{}-{}", self.type_name, self.qid)
    }

    /// Short tag derived from the description: its first word, upper-cased,
    /// keeping only alphanumeric characters.
    pub fn tag(&self) -> String {
        self.description
            .split_whitespace()
            .next()
            .unwrap_or("")
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Whether `tag` names this group through its description or its tag.
    /// An empty tag names nothing.
    pub fn matches(&self, tag: &str) -> bool {
        !tag.is_empty() && (self.description == tag || self.tag() == tag)
    }

    pub(crate) fn read(category: Category, key: &str, group: &hdf5::Group) -> Result<Self, Error> {
        let (type_name, qid) = split_key(key)?;
        let date = read_string_attr(group, DATE_ATTR)?;
        Ok(Self {
            category,
            type_name: type_name.to_string(),
            qid: qid.to_string(),
            description: read_string_attr(group, DESCRIPTION_ATTR)?,
            date: parse_date(&date)?,
        })
    }

    pub(crate) fn write(&self, group: &hdf5::Group) -> Result<(), Error> {
        write_string_attr(group, DESCRIPTION_ATTR, &self.description)?;
        write_string_attr(group, DATE_ATTR, &format_date(&self.date))
    }
}

/// Splits a group name into type and identifier. Types may contain `-`.
pub(crate) fn split_key(key: &str) -> Result<(&str, &str), Error> {
    match key.rsplit_once('-') {
        Some((type_name, qid)) if !type_name.is_empty() && !qid.is_empty() => Ok((type_name, qid)),
        _ => Err(Error::Malformed(format!("group name \"{}\" is not <type>-<qid>", key))),
    }
}

/// Draws a fresh identifier that is not in `taken`.
pub(crate) fn generate_qid<R: Rng>(rng: &mut R, taken: &HashSet<String>) -> String {
    let upper = 10u64.pow(QID_DIGITS as u32);
    loop {
        let qid = format!("{:0width$}", rng.gen_range(0..upper), width = QID_DIGITS);
        if !taken.contains(&qid) {
            return qid;
        }
    }
}

/// Current time at microsecond precision, pushed past `latest` if the clock
/// has not advanced.
pub(crate) fn next_date(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let now = now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now);
    match latest {
        Some(latest) if now <= latest => latest + Duration::microseconds(1),
        _ => now,
    }
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_date(text: &str) -> Result<DateTime<Utc>, Error> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}
