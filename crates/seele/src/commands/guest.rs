//! `seele guest`: the subscription backend's guest configuration.

use seele_core::{BackendConfig, GuestConfigCache};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(config: &BackendConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let backend = config.client()?;
    let guest = GuestConfigCache::global().get_or_fetch(&backend).await?;
    let out = output::render_single(
        global.output,
        guest.as_ref(),
        |v| output::render_json(v, false),
        |v| output::render_json(v, true),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
