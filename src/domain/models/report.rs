use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Deserialize;

/// The kind of monitoring report a run produces. Keys match the entries of
/// the prompt document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Juridique,
    PedagogiqueTechnologique,
}

impl ReportKind {
    /// Stable identifier used to look the kind up in the prompt document.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Juridique => "veille_juridique",
            Self::PedagogiqueTechnologique => "veille_pedagogique_technologique",
        }
    }

    /// Email subject line for this kind of report.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Juridique => "Veille juridique",
            Self::PedagogiqueTechnologique => "Veille pédagogique et technologique",
        }
    }

    /// Human-readable name substituted into the `{type}` template placeholder.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Juridique => "juridique",
            Self::PedagogiqueTechnologique => "pédagogique et technologique",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The lookback window a report covers. Dates are rendered `DD/MM/YYYY` for
/// both the prompt and the email template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportPeriod {
    /// Period ending on `end` and starting `days` before it.
    pub fn ending_on(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Period ending today, starting `days` ago.
    pub fn ending_today(days: i64) -> Self {
        Self::ending_on(Local::now().date_naive(), days)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format("%d/%m/%Y").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%d/%m/%Y").to_string()
    }

    /// Placeholder values substituted into prompt templates.
    ///
    /// `report_date` duplicates `start_date` (the English prompt variant uses
    /// the former name) and `start_year`/`end_year` bracket the end date's
    /// calendar year.
    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        let current_year = self.end.year();
        vec![
            ("start_date", self.start_str()),
            ("end_date", self.end_str()),
            ("report_date", self.start_str()),
            ("current_year", current_year.to_string()),
            ("start_year", current_year.to_string()),
            ("end_year", (current_year + 1).to_string()),
        ]
    }
}

/// Recipient lists loaded from the recipients document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recipients {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
}

impl Recipients {
    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }
}

/// A fully rendered report email, ready to hand to a sender.
#[derive(Debug, Clone)]
pub struct EmailReport {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn period_formats_dates_as_day_month_year() {
        let period = ReportPeriod::ending_on(date(2026, 3, 15), 60);
        assert_eq!(period.end_str(), "15/03/2026");
        assert_eq!(period.start_str(), "14/01/2026");
    }

    #[test]
    fn placeholders_cover_dates_and_years() {
        let period = ReportPeriod::ending_on(date(2026, 8, 24), 60);
        let vars = period.placeholders();

        let get = |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .expect("placeholder present")
        };
        assert_eq!(get("start_date"), "25/06/2026");
        assert_eq!(get("end_date"), "24/08/2026");
        assert_eq!(get("report_date"), get("start_date"));
        assert_eq!(get("current_year"), "2026");
        assert_eq!(get("start_year"), "2026");
        assert_eq!(get("end_year"), "2027");
    }

    #[test]
    fn report_kind_keys_and_subjects() {
        assert_eq!(ReportKind::Juridique.key(), "veille_juridique");
        assert_eq!(
            ReportKind::PedagogiqueTechnologique.key(),
            "veille_pedagogique_technologique"
        );
        assert_eq!(ReportKind::Juridique.subject(), "Veille juridique");
        assert_eq!(
            ReportKind::PedagogiqueTechnologique.display_name(),
            "pédagogique et technologique"
        );
    }

    #[test]
    fn recipients_default_to_empty() {
        let recipients: Recipients = serde_json::from_str(r#"{"to": ["a@example.com"]}"#).expect("decode");
        assert_eq!(recipients.to.len(), 1);
        assert!(recipients.cc.is_empty());
        assert!(!recipients.is_empty());

        let empty: Recipients = serde_json::from_str("{}").expect("decode");
        assert!(empty.is_empty());
    }
}
