//! Draining a backend count stream

use crate::context::ExecutionContext;
use crate::storage::Int64Stream;
use crate::{Error, ResultExt, Result};
use futures::StreamExt;

/// Folded result of a count stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cardinality {
    /// Sum of every value the backend delivered
    pub value: i64,
    /// How many values were delivered
    pub partials: usize,
}

/// Drain `stream`, summing every delivered count.
///
/// The context is checked between items: cancellation yields
/// [`Error::Canceled`], an expired deadline [`Error::DeadlineExceeded`], and
/// no partial sum is returned. The stream is dropped on every exit path.
pub async fn consume_cardinality(
    ctx: &ExecutionContext,
    mut stream: Int64Stream,
) -> Result<Cardinality> {
    let mut folded = Cardinality::default();
    loop {
        let next = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(count)) => {
                folded.value = folded.value.checked_add(count).ok_or_else(|| {
                    Error::Internal(format!(
                        "series cardinality overflowed after {} partial counts",
                        folded.partials
                    ))
                })?;
                folded.partials += 1;
            }
            Some(Err(e)) => return Err(e).context("consume series cardinality stream"),
            None => return Ok(folded),
        }
    }
}
