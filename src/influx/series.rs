//! Series identifiers

use crate::error::MigrationError;

/// Tag of a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPair {
    /// Tag name
    pub name: String,
    /// Tag value
    pub value: String,
}

impl LabelPair {
    /// Create a tag
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A measurement, one of its fields and the tags identifying the series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    /// Measurement name
    pub measurement: String,
    /// Field to fetch
    pub field: String,
    /// Tags in identifier order
    pub label_pairs: Vec<LabelPair>,
}

impl Series {
    /// Parse a series identifier such as `cpu,host=web-1,region=eu`
    ///
    /// Commas separate the measurement and the tags, the first `=` of a tag
    /// separates its name from its value. A backslash escapes `,` `=` space
    /// and backslash; other escapes are kept verbatim. The field is left
    /// empty.
    pub fn unmarshal(s: &str) -> Result<Self, MigrationError> {
        let mut parts = split_unescaped(s, ',').into_iter();
        let measurement = unescape(parts.next().unwrap_or(""));

        let label_pairs = parts
            .map(|part| {
                let eq = find_unescaped(part, '=').ok_or_else(|| MigrationError::InvalidSeries {
                    series: s.to_string(),
                    message: format!("missing `=` in tag {part:?}"),
                })?;
                Ok(LabelPair {
                    name: unescape(&part[..eq]),
                    value: unescape(&part[eq + 1..]),
                })
            })
            .collect::<Result<Vec<_>, MigrationError>>()?;

        Ok(Self {
            measurement,
            field: String::new(),
            label_pairs,
        })
    }

    /// Query selecting this series' field, restricted by `time_filter`
    pub fn fetch_query(&self, time_filter: &str) -> String {
        let mut query = format!("select {:?} from {:?}", self.field, self.measurement);

        if !self.label_pairs.is_empty() || !time_filter.is_empty() {
            query.push_str(" where");
        }

        for (i, pair) in self.label_pairs.iter().enumerate() {
            if i > 0 {
                query.push_str(" and");
            }
            query.push_str(&format!(" {:?}::tag='{}'", pair.name, escape_value(&pair.value)));
        }

        if !time_filter.is_empty() {
            if !self.label_pairs.is_empty() {
                query.push_str(" and");
            }
            query.push(' ');
            query.push_str(time_filter);
        }

        query
    }
}

/// Time condition for [`Series::fetch_query`]; empty bounds are omitted
pub fn time_filter(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!("time >= '{start}'"),
        (true, false) => format!("time <= '{end}'"),
        (false, false) => format!("time >= '{start}' and time <= '{end}'"),
    }
}

fn escape_value(s: &str) -> String {
    s.replace('\\', r"\\").replace('\'', r"\'")
}

/// Byte offset of the first `sep` not preceded by an escaping backslash
fn find_unescaped(s: &str, sep: char) -> Option<usize> {
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == sep {
            return Some(i);
        }
    }
    None
}

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unescaped(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next @ (',' | '=' | ' ' | '\\')) => {
                    result.push(next);
                    chars.next();
                },
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}
