// Stdout applier: drains the driver's change request queue and writes
// each request as one JSON line, in submission order.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use ovnlb_core::ChangeRequest;

use crate::error::CliError;

/// Write requests until every sender is dropped. Returns how many were
/// written.
pub async fn write_json_lines<W>(
    mut rx: UnboundedReceiver<ChangeRequest>,
    mut out: W,
) -> Result<usize, CliError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(request) = rx.recv().await {
        let mut line = serde_json::to_vec(&request).map_err(|e| CliError::Sync {
            message: format!("failed to encode change request: {e}"),
        })?;
        line.push(b'\n');
        out.write_all(&line).await?;
        written += 1;
        debug!(op = %request.op(), written, "change request applied");
    }
    out.flush().await?;
    Ok(written)
}
