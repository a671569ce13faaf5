//! Completion handle for operations submitted in the background.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::errors::SearchError;

/// The eventual result of a background operation.
///
/// Await it to get the result, or drop it to let the operation finish
/// unobserved. Dropping does not cancel the request.
#[must_use = "dropping a Completion discards the operation's result"]
pub struct Completion<T> {
    receiver: oneshot::Receiver<Result<T, SearchError>>,
}

impl<T> Completion<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<Result<T, SearchError>>) -> Self {
        Self { receiver }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, SearchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SearchError::TaskDropped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_delivers_result() {
        let (tx, rx) = oneshot::channel();
        let completion = Completion::new(rx);

        tx.send(Ok(7)).unwrap();
        assert_eq!(completion.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_completion_reports_dropped_sender() {
        let (tx, rx) = oneshot::channel::<Result<u32, SearchError>>();
        let completion = Completion::new(rx);

        drop(tx);
        assert_eq!(completion.await.unwrap_err(), SearchError::TaskDropped);
    }
}
