use std::collections::BTreeMap;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// No-op color shim when the "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_white(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim;

use crate::report::{Group, GroupingMode, MonthlyTotal, Summary};
use crate::utils::{format_currency, format_month_label, format_tokens};

fn grouping_label(mode: GroupingMode) -> &'static str {
    match mode {
        GroupingMode::Section => "Seção",
        GroupingMode::User => "Usuário",
        GroupingMode::Sector => "Setor",
    }
}

pub fn print_text_report(
    summary: &Summary,
    groups: &[Group],
    monthly: &[MonthlyTotal],
    mode: GroupingMode,
    period: Option<&(String, String)>,
    system_filter: Option<&str>,
) {
    let period_label = match period {
        Some((start, end)) => format!("{start} — {end}"),
        None => "todos os registros".to_string(),
    };
    println!("{} {}", "Relatório de Custos LLM".bold(), period_label.dimmed());
    if let Some(sys) = system_filter {
        println!("{} {}", "Sistema:".dimmed(), sys);
    }
    println!(
        "{} conversas | {} tokens | {}",
        summary.total_conversations,
        format_tokens(summary.total_tokens),
        format_currency(summary.total_cost).green()
    );
    if summary.unpriced > 0 {
        println!(
            "{}",
            format!("⚠ {} conversa(s) sem preço vigente", summary.unpriced).yellow()
        );
    }

    println!();
    println!("{}", format!("Por {}:", grouping_label(mode)).bold());
    for g in groups {
        let key = if g.key.is_empty() { "—" } else { g.key.as_str() };
        let mut line = format!(
            "  {:<28} {:>6} conv {:>8} tok  {}",
            key,
            g.conversations,
            format_tokens(g.input_tokens + g.output_tokens),
            format_currency(g.total_cost)
        );
        if g.unpriced > 0 {
            line.push_str(&format!("  ({} sem preço)", g.unpriced));
        }
        println!("{line}");
    }

    if !monthly.is_empty() {
        println!();
        println!("{}", "Mensal:".bold());
        for m in monthly {
            println!(
                "  {:<8} {:>6} conv {:>8} tok  {}",
                format_month_label(&m.month),
                m.conversations,
                format_tokens(m.tokens),
                format_currency(m.cost)
            );
        }
    }
}

pub fn print_json_report(
    summary: &Summary,
    groups: &[Group],
    monthly: &[MonthlyTotal],
    monthly_by_system: &BTreeMap<String, Vec<MonthlyTotal>>,
    mode: GroupingMode,
    period: Option<&(String, String)>,
) {
    let monthly_json = |rows: &[MonthlyTotal]| -> Vec<serde_json::Value> {
        rows.iter()
            .map(|m| {
                serde_json::json!({
                    "month": m.month,
                    "conversations": m.conversations,
                    "tokens": m.tokens,
                    "cost": m.cost,
                })
            })
            .collect()
    };

    let out = serde_json::json!({
        "period": period.map(|(s, e)| serde_json::json!({"start": s, "end": e})),
        "summary": {
            "conversations": summary.total_conversations,
            "tokens": summary.total_tokens,
            "cost": summary.total_cost,
            "unpriced": summary.unpriced,
            "unique_users": summary.unique_users,
            "unique_sectors": summary.unique_sectors,
        },
        "grouping": grouping_label(mode),
        "groups": groups.iter().map(|g| serde_json::json!({
            "key": g.key,
            "conversations": g.conversations,
            "unique_users": g.unique_users,
            "input_tokens": g.input_tokens,
            "output_tokens": g.output_tokens,
            "cost": g.total_cost,
            "unpriced": g.unpriced,
        })).collect::<Vec<_>>(),
        "monthly": monthly_json(monthly),
        "monthly_by_system": monthly_by_system
            .iter()
            .map(|(k, v)| (k.clone(), monthly_json(v)))
            .collect::<BTreeMap<String, Vec<serde_json::Value>>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
}
