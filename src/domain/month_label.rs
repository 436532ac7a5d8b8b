use chrono::{Datelike, Months, NaiveDate};

/// English abbreviation → site-locale (French) month label.
const SITE_LOCALE_MONTHS: [(&str, &str); 12] = [
    ("jan.", "janv."),
    ("feb.", "févr."),
    ("mar.", "mars"),
    ("apr.", "avr."),
    ("may.", "mai"),
    ("jun.", "juin"),
    ("jul.", "juil."),
    ("aug.", "août"),
    ("sep.", "sept."),
    ("oct.", "oct."),
    ("nov.", "nov."),
    ("dec.", "déc."),
];

/// The title texts a month tile may carry on the period picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthLabel {
    pub first_day: NaiveDate,
    /// Lowercase English abbreviation with a trailing dot (`"feb."`).
    pub primary: String,
}

impl MonthLabel {
    pub fn for_date(date: NaiveDate) -> Self {
        let first_day = date.with_day(1).unwrap_or(date);
        Self {
            first_day,
            primary: format!("{}.", first_day.format("%b")).to_lowercase(),
        }
    }

    /// First day of the month `offset` months after `today`'s month.
    pub fn offset_from(today: NaiveDate, offset: u32) -> Option<Self> {
        let first = today.with_day(1)?;
        first.checked_add_months(Months::new(offset)).map(Self::for_date)
    }

    pub fn site_locale(&self) -> &'static str {
        SITE_LOCALE_MONTHS[self.first_day.month0() as usize].1
    }

    /// Labels to try in order, without duplicates.
    pub fn candidates(&self) -> Vec<String> {
        let mut out = vec![self.primary.clone()];
        for label in [self.site_locale().to_string(), strip_accents(self.site_locale())] {
            if !out.contains(&label) {
                out.push(label);
            }
        }
        out
    }
}

impl std::fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.primary)
    }
}

/// Replace the accented letters used in French month names.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' => 'E',
            'û' | 'ù' | 'ü' => 'u',
            'à' | 'â' => 'a',
            'ô' => 'o',
            'î' | 'ï' => 'i',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
