use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use log::warn;

use llm_cost_report::cli::Args;
use llm_cost_report::cost::{apply_policy, calculate_costs};
use llm_cost_report::display::{print_json_report, print_text_report};
use llm_cost_report::export::{export_workbook, WorkbookData};
use llm_cost_report::models::{ConversationRecord, RoleFlags};
use llm_cost_report::report::{
    group_by, monthly_by_sector, monthly_by_system, monthly_totals, summarize, visible_to,
    GroupingMode,
};
use llm_cost_report::snapshot::{Endpoint, SnapshotStore};
use llm_cost_report::utils::default_export_dir;
use llm_cost_report::webhook::{build_submission, WebhookClient};

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    let client = WebhookClient::new(args.auth_header());

    if let Some(model) = args.set_price.clone() {
        return set_price(&args, &client, &model);
    }

    let conversations_url = args.conversations_url.as_deref().context(
        "no conversation webhook configured (--conversations-url or COST_CONVERSATIONS_URL)",
    )?;
    let pricing_url = args
        .pricing_url
        .as_deref()
        .context("no pricing webhook configured (--pricing-url or COST_PRICING_URL)")?;
    let filter = args.date_filter()?;
    let today = Local::now().date_naive();

    // Snapshots are published through the sequenced store so a re-run with
    // overlapping fetches can never apply a stale response.
    let store = SnapshotStore::new();
    let ticket = store.begin(Endpoint::Pricing);
    let book = client.fetch_pricing(pricing_url)?;
    store.publish_pricebook(ticket, book);

    let ticket = store.begin(Endpoint::Conversations);
    let records =
        client.fetch_conversations(conversations_url, &filter, args.email.as_deref(), today)?;
    store.publish_conversations(ticket, records);

    let book = store.pricebook().context("pricing snapshot missing")?;
    let conversations = store.conversations().context("conversation snapshot missing")?;

    // Role-based visibility applies only when the permission service is
    // configured; the flags are advisory and never affect pricing.
    let visible: Vec<ConversationRecord> =
        match (args.permissions_url.as_deref(), args.email.as_deref()) {
            (Some(url), Some(email)) => {
                let roles = client
                    .fetch_roles(url, args.name.as_deref(), email)
                    .unwrap_or_else(|err| {
                        warn!("role lookup failed, assuming no roles: {err:#}");
                        RoleFlags::default()
                    });
                conversations
                    .data
                    .iter()
                    .filter(|r| visible_to(r, &roles, Some(email)))
                    .cloned()
                    .collect()
            }
            _ => conversations.data.as_ref().clone(),
        };

    let costed = apply_policy(
        calculate_costs(&visible, &book.data),
        args.unpriced_policy(),
    );
    let summary = summarize(&costed);
    let mode = args.grouping_mode();
    let groups = group_by(&costed, mode, args.system.as_deref());
    let monthly = monthly_totals(&costed);
    let by_system = monthly_by_system(&costed);
    let period = filter.date_range(today);

    if args.json {
        print_json_report(&summary, &groups, &monthly, &by_system, mode, period.as_ref());
    } else {
        print_text_report(
            &summary,
            &groups,
            &monthly,
            mode,
            period.as_ref(),
            args.system.as_deref(),
        );
    }

    if let Some(dir) = &args.export {
        let sectors = group_by(&costed, GroupingMode::Sector, args.system.as_deref());
        let by_sector = monthly_by_sector(&costed);
        let data = WorkbookData {
            summary: &summary,
            sectors: &sectors,
            monthly_by_system: &by_system,
            monthly_by_sector: &by_sector,
            period: period.clone(),
            system_label: args
                .system
                .clone()
                .unwrap_or_else(|| "Todos os sistemas".to_string()),
        };
        let base = if dir.as_os_str().is_empty() {
            default_export_dir()
        } else {
            dir.clone()
        };
        let out = export_workbook(&base, &data)?;
        if !args.json {
            println!("\nRelatório exportado em {}", out.display());
        }
    }

    Ok(())
}

fn set_price(args: &Args, client: &WebhookClient, model: &str) -> Result<()> {
    let (Some(input_rate), Some(output_rate)) = (args.input_rate, args.output_rate) else {
        bail!("--set-price requires --input-rate and --output-rate");
    };
    if input_rate < 0.0 || output_rate < 0.0 {
        bail!("rates must be non-negative");
    }
    let save_url = args.save_pricing_url.as_deref().context(
        "no submission webhook configured (--save-pricing-url or COST_SAVE_PRICING_URL)",
    )?;
    let pricing_url = args
        .pricing_url
        .as_deref()
        .context("no pricing webhook configured (--pricing-url or COST_PRICING_URL)")?;

    // The previous active version, if any, is deactivated by the same
    // submission; the upstream never mutates existing version records.
    let book = client.fetch_pricing(pricing_url)?;
    let previous = book.active_version(model);
    let request = build_submission(
        model,
        input_rate,
        output_rate,
        &args.currency,
        Utc::now(),
        previous,
    );
    let had_previous = previous.is_some();
    client.submit_price(save_url, &request)?;

    if had_previous {
        println!("Nova versão de preço criada para {model}; versão anterior desativada");
    } else {
        println!("Configuração de preço criada para {model}");
    }
    Ok(())
}
