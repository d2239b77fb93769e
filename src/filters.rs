//! # Date Filters
//!
//! Builds the SQL query the conversation webhook expects. The upstream
//! endpoint forwards the `query` URL parameter verbatim to the reporting
//! database, so the statement text (column aliases included) is part of the
//! wire contract.

use chrono::{Datelike, Duration, NaiveDate};

const BASE_SQL_QUERY: &str = "SELECT \n    id,\n    Modelo,\n    Token_Entrada,\n    Token_Saída,\n    Token_Total,\n    COALESCE(Seção, '') AS Seção,\n    COALESCE(Prompt_Usuário, '') AS Prompt_Usuário,\n    COALESCE(Resposta_Agente, '') AS Resposta_Agente,\n    TO_CHAR(Data, 'DD/MM/YY') AS Data,\n    TO_CHAR(Hora, 'HH24:MI:SS') AS Hora,\n    COALESCE(sistema, '') AS Sistema,\n    COALESCE(UserName, '') AS UserName,\n    COALESCE(ferramentas, '') AS ferramentas,\n    COALESCE(Email, '') AS Email,\n    COALESCE(Setor, '') AS Setor\nFROM rateio_token";

const ORDER_BY_CLAUSE: &str = "ORDER BY Data DESC, Hora DESC";

/// The selectable reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    /// Last 7 days.
    Week,
    /// The current calendar month.
    Month,
    /// Last 365 days.
    Year,
    All,
    Custom {
        start: NaiveDate,
        end: NaiveDate,
    },
}

fn fmt_ddmmyyyy(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

fn between_clause(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "WHERE Data >= TO_DATE('{}', 'DD/MM/YYYY')\n  AND Data <= TO_DATE('{}', 'DD/MM/YYYY')",
        fmt_ddmmyyyy(start),
        fmt_ddmmyyyy(end)
    )
}

fn last_day_of_month(today: NaiveDate) -> NaiveDate {
    let (y, m) = (today.year(), today.month());
    let first_next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    first_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(today)
}

impl DateFilter {
    /// Full SQL statement for this filter, anchored at `today`.
    pub fn sql_query(&self, today: NaiveDate) -> String {
        match self {
            DateFilter::Today => format!(
                "{BASE_SQL_QUERY}\nWHERE EXTRACT(DAY FROM Data) = {}\n  AND EXTRACT(MONTH FROM Data) = {}\n  AND EXTRACT(YEAR FROM Data) = {}\n{ORDER_BY_CLAUSE}",
                today.day(),
                today.month(),
                today.year()
            ),
            DateFilter::Week => {
                let start = today - Duration::days(7);
                format!("{BASE_SQL_QUERY}\n{}\n{ORDER_BY_CLAUSE}", between_clause(start, today))
            }
            DateFilter::Month => {
                let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
                let end = last_day_of_month(today);
                format!("{BASE_SQL_QUERY}\n{}\n{ORDER_BY_CLAUSE}", between_clause(start, end))
            }
            DateFilter::Year => {
                let start = today - Duration::days(365);
                format!("{BASE_SQL_QUERY}\n{}\n{ORDER_BY_CLAUSE}", between_clause(start, today))
            }
            DateFilter::Custom { start, end } => {
                format!("{BASE_SQL_QUERY}\n{}\n{ORDER_BY_CLAUSE}", between_clause(*start, *end))
            }
            DateFilter::All => format!("{BASE_SQL_QUERY}\n{ORDER_BY_CLAUSE}"),
        }
    }

    /// Start/end of the period in `DD/MM/YYYY`, for report headers.
    /// `None` means unbounded ("all records").
    pub fn date_range(&self, today: NaiveDate) -> Option<(String, String)> {
        match self {
            DateFilter::Today => Some((fmt_ddmmyyyy(today), fmt_ddmmyyyy(today))),
            DateFilter::Week => {
                Some((fmt_ddmmyyyy(today - Duration::days(7)), fmt_ddmmyyyy(today)))
            }
            DateFilter::Month => {
                let start =
                    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
                Some((fmt_ddmmyyyy(start), fmt_ddmmyyyy(last_day_of_month(today))))
            }
            DateFilter::Year => {
                Some((fmt_ddmmyyyy(today - Duration::days(365)), fmt_ddmmyyyy(today)))
            }
            DateFilter::Custom { start, end } => {
                Some((fmt_ddmmyyyy(*start), fmt_ddmmyyyy(*end)))
            }
            DateFilter::All => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_uses_extract_clauses() {
        let q = DateFilter::Today.sql_query(day(2025, 3, 15));
        assert!(q.contains("EXTRACT(DAY FROM Data) = 15"));
        assert!(q.contains("EXTRACT(MONTH FROM Data) = 3"));
        assert!(q.contains("EXTRACT(YEAR FROM Data) = 2025"));
        assert!(q.ends_with(ORDER_BY_CLAUSE));
    }

    #[test]
    fn month_covers_first_to_last_day() {
        let q = DateFilter::Month.sql_query(day(2025, 2, 10));
        assert!(q.contains("Data >= TO_DATE('01/02/2025', 'DD/MM/YYYY')"));
        assert!(q.contains("Data <= TO_DATE('28/02/2025', 'DD/MM/YYYY')"));
    }

    #[test]
    fn month_handles_december() {
        let q = DateFilter::Month.sql_query(day(2024, 12, 5));
        assert!(q.contains("Data <= TO_DATE('31/12/2024', 'DD/MM/YYYY')"));
    }

    #[test]
    fn custom_range_is_inclusive() {
        let f = DateFilter::Custom {
            start: day(2025, 1, 1),
            end: day(2025, 1, 31),
        };
        let q = f.sql_query(day(2025, 6, 1));
        assert!(q.contains("Data >= TO_DATE('01/01/2025', 'DD/MM/YYYY')"));
        assert!(q.contains("Data <= TO_DATE('31/01/2025', 'DD/MM/YYYY')"));
        assert_eq!(
            f.date_range(day(2025, 6, 1)),
            Some(("01/01/2025".to_string(), "31/01/2025".to_string()))
        );
    }

    #[test]
    fn all_has_no_where_clause() {
        let q = DateFilter::All.sql_query(day(2025, 3, 15));
        assert!(!q.contains("WHERE"));
        assert!(q.starts_with("SELECT"));
        assert_eq!(DateFilter::All.date_range(day(2025, 3, 15)), None);
    }
}
