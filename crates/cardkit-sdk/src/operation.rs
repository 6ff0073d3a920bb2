//! # Deferred Operation
//!
//! A [`CallbackOperation`] wraps one unit of asynchronous work. Nothing runs
//! until it is started. Starting it spawns the body on the current Tokio
//! runtime and, when the body finishes, calls the completion exactly once
//! with either the value or the error.
//!
//! An operation runs at most once. A second `start` (or `run`) returns
//! [`OperationError::AlreadyStarted`] and never touches the new completion.
//! A panicking body, or a runtime that shuts down before the body finishes,
//! is reported to the completion as [`OperationError::Aborted`], so the
//! completion still fires.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::error::OperationError;

type Body<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Single-shot, lazily started unit of asynchronous work.
pub struct CallbackOperation<T, E> {
    body: Mutex<Option<Body<T, E>>>,
}

impl<T, E> CallbackOperation<T, E>
where
    T: Send + 'static,
    E: From<OperationError> + Send + 'static,
{
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            body: Mutex::new(Some(Box::pin(body))),
        }
    }

    /// An operation that completes immediately with `result`.
    pub fn ready(result: Result<T, E>) -> Self {
        Self::new(async move { result })
    }

    pub fn is_started(&self) -> bool {
        self.body.lock().is_none()
    }

    /// Run the body on the current Tokio runtime and hand its result to
    /// `completion`.
    ///
    /// # Errors
    ///
    /// [`OperationError::AlreadyStarted`] if the operation was started
    /// before; [`OperationError::NoRuntime`] if called outside a runtime.
    /// In both cases `completion` is dropped without being called.
    pub fn start<C>(&self, completion: C) -> Result<(), OperationError>
    where
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| OperationError::NoRuntime)?;
        let body = self.take_body()?;
        let guard = CompletionGuard::new(completion);
        handle.spawn(async move {
            let result = execute(body).await;
            guard.complete(result);
        });
        Ok(())
    }

    /// Run the body and wait for its result.
    pub async fn run(self) -> Result<T, E> {
        let body = self.take_body()?;
        execute(body).await
    }

    fn take_body(&self) -> Result<Body<T, E>, OperationError> {
        self.body.lock().take().ok_or(OperationError::AlreadyStarted)
    }
}

/// Holds the completion until the body finishes. Dropping it uncalled,
/// as happens when the runtime drops the task, reports `Aborted`.
struct CompletionGuard<T, E, C>
where
    E: From<OperationError>,
    C: FnOnce(Result<T, E>),
{
    completion: Option<C>,
    _result: PhantomData<fn(Result<T, E>)>,
}

impl<T, E, C> CompletionGuard<T, E, C>
where
    E: From<OperationError>,
    C: FnOnce(Result<T, E>),
{
    fn new(completion: C) -> Self {
        Self {
            completion: Some(completion),
            _result: PhantomData,
        }
    }

    fn complete(mut self, result: Result<T, E>) {
        if let Some(completion) = self.completion.take() {
            completion(result);
        }
    }
}

impl<T, E, C> Drop for CompletionGuard<T, E, C>
where
    E: From<OperationError>,
    C: FnOnce(Result<T, E>),
{
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            tracing::warn!("operation dropped before completion");
            completion(Err(E::from(OperationError::Aborted(
                "operation cancelled before completion".to_string(),
            ))));
        }
    }
}

/// Run the body on its own task so a panic surfaces as a `JoinError`.
async fn execute<T, E>(body: Body<T, E>) -> Result<T, E>
where
    T: Send + 'static,
    E: From<OperationError> + Send + 'static,
{
    match tokio::spawn(body).await {
        Ok(result) => result,
        Err(join_error) => {
            tracing::warn!(error = %join_error, "operation body aborted");
            Err(E::from(OperationError::Aborted(join_error.to_string())))
        }
    }
}

impl<T, E> std::fmt::Debug for CallbackOperation<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackOperation")
            .field("started", &self.body.lock().is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Op(OperationError),
        Body(&'static str),
    }

    impl From<OperationError> for TestError {
        fn from(e: OperationError) -> Self {
            Self::Op(e)
        }
    }

    fn started<T: Send + 'static>(
        op: &CallbackOperation<T, TestError>,
    ) -> oneshot::Receiver<Result<T, TestError>> {
        let (tx, rx) = oneshot::channel();
        op.start(move |r| {
            let _ = tx.send(r);
        })
        .unwrap();
        rx
    }

    #[tokio::test]
    async fn body_does_not_run_until_started() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let op = CallbackOperation::<u32, TestError>::new(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        });
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!op.is_started());

        assert_eq!(started(&op).await.unwrap(), Ok(7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(op.is_started());
    }

    #[tokio::test]
    async fn error_reaches_completion() {
        let op = CallbackOperation::<u32, TestError>::new(async { Err(TestError::Body("boom")) });
        assert_eq!(started(&op).await.unwrap(), Err(TestError::Body("boom")));
    }

    #[tokio::test]
    async fn second_start_fails_and_body_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let op = CallbackOperation::<(), TestError>::new(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let first = started(&op);

        let completions = Arc::new(AtomicUsize::new(0));
        let c = completions.clone();
        let second = op.start(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(second, Err(OperationError::AlreadyStarted));

        assert_eq!(first.await.unwrap(), Ok(()));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_body_reports_aborted() {
        let explode = true;
        let op = CallbackOperation::<u32, TestError>::new(async move {
            if explode {
                panic!("body exploded");
            }
            Ok(0)
        });
        match started(&op).await.unwrap() {
            Err(TestError::Op(OperationError::Aborted(msg))) => assert!(msg.contains("panic")),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_after_start_is_already_started() {
        let op = CallbackOperation::<u32, TestError>::ready(Ok(1));
        let _rx = started(&op);
        assert_eq!(op.run().await, Err(TestError::Op(OperationError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn run_awaits_the_result() {
        let op = CallbackOperation::<u32, TestError>::ready(Ok(42));
        assert_eq!(op.run().await, Ok(42));
    }

    #[test]
    fn runtime_shutdown_reports_aborted_once() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let op = CallbackOperation::<u32, TestError>::new(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(1)
        });
        rt.block_on(async {
            op.start(move |r| {
                let _ = tx.send(r);
            })
            .unwrap();
            tokio::task::yield_now().await;
        });
        drop(rt);

        match rx.recv_timeout(std::time::Duration::from_secs(5)) {
            Ok(Err(TestError::Op(OperationError::Aborted(_)))) => {}
            other => panic!("expected Aborted, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn start_outside_runtime_is_rejected() {
        let op = CallbackOperation::<u32, TestError>::ready(Ok(1));
        assert_eq!(op.start(|_| {}), Err(OperationError::NoRuntime));
        assert!(!op.is_started());
    }
}
