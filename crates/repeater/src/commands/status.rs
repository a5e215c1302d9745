//! `repeater status`: the repeater entry as a quick-settings tile would show it.

use repeater_core::RepeaterView;

use super::Context;
use crate::error::CliError;
use crate::output;

fn detail(v: &RepeaterView, color: bool) -> String {
    let interface = match (&v.interface, v.interface_address) {
        (Some(name), Some(mac)) => format!("{name} ({mac})"),
        (Some(name), None) => name.clone(),
        (None, _) => "-".into(),
    };
    [
        format!("Title:      {}", v.title),
        format!("Status:     {}", output::paint_status(v.status, color)),
        format!("Switch:     {}", if v.switch_enabled { "enabled" } else { "disabled" }),
        format!("Interface:  {interface}"),
        format!(
            "Features:   {}",
            if v.features.is_empty() { "-" } else { &v.features }
        ),
    ]
    .join("\n")
}

pub async fn handle(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.connect().await;
    let view = session.manager.view();
    session.close().await;

    let rendered = output::render_single(
        ctx.format,
        &view,
        |v| detail(v, ctx.color),
        |v| output::paint_status(v.status, false),
    )?;
    ctx.print(&rendered);
    Ok(())
}
