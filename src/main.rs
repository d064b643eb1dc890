use anyhow::Result;
use tallytime::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    // stdin is read on a blocking thread that only returns after the next line, don't wait for it
    runtime.shutdown_background();
    result
}
