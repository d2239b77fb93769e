//! # Workbook Export
//!
//! Serializes the consolidated sector report: one timestamped directory per
//! export, one CSV file per sheet (resumo, resumo_setores, one mensal sheet
//! per system, mensal_por_setor). Costs are rounded to 8 fractional digits
//! here and nowhere earlier.

use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{Group, MonthlyTotal, Summary};
use crate::utils::format_month_label;

static SHEET_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());

/// Everything the consolidated report needs, already aggregated.
pub struct WorkbookData<'a> {
    pub summary: &'a Summary,
    /// Per-sector rows, descending by cost.
    pub sectors: &'a [Group],
    pub monthly_by_system: &'a BTreeMap<String, Vec<MonthlyTotal>>,
    pub monthly_by_sector: &'a BTreeMap<String, Vec<MonthlyTotal>>,
    /// `DD/MM/YYYY` period bounds; `None` means all records.
    pub period: Option<(String, String)>,
    /// System filter applied to the sector sheets, or "all systems".
    pub system_label: String,
}

fn sheet_file_name(name: &str) -> String {
    let safe = SHEET_NAME_RE.replace_all(name, "_");
    let safe = safe.trim_matches('_');
    let mut out: String = safe.chars().take(31).collect();
    if out.is_empty() {
        out.push_str("sheet");
    }
    format!("{}.csv", out.to_lowercase())
}

fn cost_cell(v: f64) -> String {
    format!("{:.8}", v)
}

/// Write the workbook under `base`, returning the created directory.
pub fn export_workbook(base: &Path, data: &WorkbookData<'_>) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
    let dir = base.join(format!("relatorio_consolidado_setores_{stamp}"));
    fs::create_dir_all(&dir).with_context(|| format!("create export dir {}", dir.display()))?;

    write_resumo(&dir, data)?;
    write_resumo_setores(&dir, data.sectors)?;
    write_mensal_por_sistema(&dir, data.monthly_by_system)?;
    write_mensal_por_setor(&dir, data.monthly_by_sector)?;

    Ok(dir)
}

fn write_resumo(dir: &Path, data: &WorkbookData<'_>) -> Result<()> {
    let path = dir.join("resumo.csv");
    let mut w = csv::Writer::from_path(&path)
        .with_context(|| format!("create {}", path.display()))?;
    let period_label = match &data.period {
        Some((start, end)) => format!("{start} a {end}"),
        None => "todos os registros".to_string(),
    };
    let s = data.summary;
    w.write_record(["RELATÓRIO CONSOLIDADO DE SETORES", ""])?;
    w.write_record(["Gerado em", &Local::now().format("%d/%m/%Y %H:%M:%S").to_string()])?;
    w.write_record(["Período", &period_label])?;
    w.write_record(["Sistema", &data.system_label])?;
    w.write_record(["", ""])?;
    w.write_record(["Setores", &s.unique_sectors.to_string()])?;
    w.write_record(["Usuários Únicos", &s.unique_users.to_string()])?;
    w.write_record(["Conversas", &s.total_conversations.to_string()])?;
    w.write_record(["Tokens", &s.total_tokens.to_string()])?;
    w.write_record(["Sem Preço", &s.unpriced.to_string()])?;
    w.write_record(["Custo Total (USD)", &cost_cell(s.total_cost)])?;
    w.flush()?;
    Ok(())
}

fn write_resumo_setores(dir: &Path, sectors: &[Group]) -> Result<()> {
    let path = dir.join("resumo_setores.csv");
    let mut w = csv::Writer::from_path(&path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record([
        "Setor",
        "Usuários Únicos",
        "Conversas",
        "Tokens",
        "Sem Preço",
        "Custo Total (USD)",
    ])?;
    for g in sectors {
        w.write_record([
            g.key.as_str(),
            &g.unique_users.to_string(),
            &g.conversations.to_string(),
            &(g.input_tokens + g.output_tokens).to_string(),
            &g.unpriced.to_string(),
            &cost_cell(g.total_cost),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_mensal_por_sistema(
    dir: &Path,
    monthly: &BTreeMap<String, Vec<MonthlyTotal>>,
) -> Result<()> {
    if monthly.is_empty() {
        return write_monthly_sheet(&dir.join("mensal_geral.csv"), &[]);
    }
    for (system, rows) in monthly {
        let path = dir.join(sheet_file_name(&format!("mensal_{system}")));
        write_monthly_sheet(&path, rows)?;
    }
    Ok(())
}

fn write_monthly_sheet(path: &Path, rows: &[MonthlyTotal]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["Mês", "Conversas", "Tokens", "Custo Total (USD)"])?;
    if rows.is_empty() {
        w.write_record(["—", "0", "0", "0"])?;
    }
    for m in rows {
        w.write_record([
            &format_month_label(&m.month),
            &m.conversations.to_string(),
            &m.tokens.to_string(),
            &cost_cell(m.cost),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_mensal_por_setor(
    dir: &Path,
    monthly: &BTreeMap<String, Vec<MonthlyTotal>>,
) -> Result<()> {
    let path = dir.join("mensal_por_setor.csv");
    let mut w = csv::Writer::from_path(&path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["Setor", "Mês", "Conversas", "Tokens", "Custo Total (USD)"])?;
    if monthly.is_empty() {
        w.write_record(["—", "—", "0", "0", "0"])?;
    }
    for (sector, rows) in monthly {
        for m in rows {
            w.write_record([
                sector.as_str(),
                &format_month_label(&m.month),
                &m.conversations.to_string(),
                &m.tokens.to_string(),
                &cost_cell(m.cost),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_sanitized_and_capped() {
        assert_eq!(sheet_file_name("Mensal - Chat Interno"), "mensal_-_chat_interno.csv");
        assert_eq!(sheet_file_name("///"), "sheet.csv");
        let long = "x".repeat(64);
        assert_eq!(sheet_file_name(&long).len(), 31 + 4);
    }
}
