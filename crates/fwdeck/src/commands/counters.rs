//! Per-rule packet/byte counters.

use std::sync::Arc;

use bytesize::ByteSize;
use tabled::Tabled;

use fwdeck_core::{Controller, Counter};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Chain")]
    chain: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Packets")]
    packets: u64,
    #[tabled(rename = "Bytes")]
    bytes: String,
}

fn row(c: &Arc<Counter>) -> CounterRow {
    CounterRow {
        chain: c.chain.to_string(),
        rule: c.rule.clone(),
        packets: c.packets,
        bytes: ByteSize::b(c.bytes).to_string(),
    }
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !controller.load_counters().await {
        let reason = controller
            .store()
            .counters_error()
            .unwrap_or_else(|| "unknown error".into());
        return Err(CliError::ApiError {
            status: None,
            message: format!("Failed to fetch counters: {reason}"),
        });
    }

    let snap = controller.counters_snapshot();
    let out = output::render_list(&global.output, &snap, row, |c| {
        format!("{}\t{}\t{}", c.rule, c.packets, c.bytes)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
