//! `stackship resources [--kind <kind>]`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stackship_artifacts::custom_resource;
use stackship_core::WorkloadKind;

use super::KindArg;

/// List custom resources per workload kind.
#[derive(Args, Debug)]
pub struct ResourcesArgs {
    /// Only show one kind, e.g. `scheduled-job`.
    #[arg(long)]
    pub kind: Option<KindArg>,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "function")]
    function: String,
    #[tabled(rename = "template")]
    template: String,
    #[tabled(rename = "key name")]
    key_name: String,
}

impl ResourcesArgs {
    pub fn run(self) -> Result<()> {
        let kinds: Vec<WorkloadKind> = match self.kind {
            Some(KindArg(kind)) => vec![kind],
            None => WorkloadKind::all().to_vec(),
        };

        for kind in kinds {
            println!("{}", kind.to_string().bold());
            let rows: Vec<ResourceRow> = custom_resource::for_kind(kind)
                .iter()
                .map(|cr| ResourceRow {
                    function: cr.name().to_string(),
                    template: cr.template_path(),
                    key_name: cr.key_name(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        Ok(())
    }
}
