use futures::Future;
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::error::{TransferError, TransferResult};

/* Fails with `TransferError::Timeout` if `f` takes longer than `time`. */
pub async fn timeout<T, F: Future<Output = TransferResult<T>>>(f: F, time: Duration) -> TransferResult<T> {
    select! {
        res = f => res,
        _ = tokio::time::sleep(time) => Err(TransferError::Timeout),
    }
}

pub async fn cancellable<T, F: Future<Output = T>>(f: F, token: &CancellationToken) -> Option<T> {
    select! {
        res = f => Some(res),
        _ = token.cancelled() => None,
    }
}
