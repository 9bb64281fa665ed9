use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type Process = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;
type Closer = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

/// Runs the service processes concurrently with graceful shutdown.
///
/// Processes share one cancellation token and must stop when it fires.
/// The first failure (or SIGINT/SIGTERM) cancels the rest; closers run
/// afterwards regardless of outcome, bounded by the closer timeout.
pub struct ServiceSet {
    processes: Vec<Process>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    shutdown: CancellationToken,
}

impl ServiceSet {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            shutdown,
        }
    }

    pub fn with_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes
            .push(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Add a cleanup step that runs after every process has stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Run until every process has stopped, then execute the closers.
    /// Returns the first process error, if any.
    pub async fn run(self) -> anyhow::Result<()> {
        let token = self.shutdown;
        let closers = self.closers;
        let closer_timeout = self.closer_timeout;

        let mut join_set = JoinSet::new();
        for process in self.processes {
            let process_token = token.clone();
            join_set.spawn(async move { process(process_token).await });
        }

        spawn_signal_handlers(token.clone());

        let mut first_error: Option<anyhow::Error> = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(())) => {
                    debug!("process completed");
                    // A finished process means the service can no longer
                    // do its job as a whole; wind the rest down too.
                    token.cancel();
                }
                Ok(Err(e)) => {
                    error!("process failed: {:#}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    token.cancel();
                }
                Err(e) => {
                    error!("process panicked: {}", e);
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!(e));
                    }
                    token.cancel();
                }
            }
        }

        if !closers.is_empty() {
            info!(timeout = ?closer_timeout, "running closers");
            if tokio::time::timeout(closer_timeout, run_closers(closers))
                .await
                .is_err()
            {
                error!("closers timed out after {:?}", closer_timeout);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let sigint_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                sigint_token.cancel();
            }
            Err(e) => error!("error setting up signal handler: {}", e),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
        sigterm.recv().await;
        info!("received SIGTERM signal");
        token.cancel();
    });
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("closer completed"),
            Ok(Err(e)) => error!("closer failed: {:#}", e),
            Err(e) => error!("closer panicked: {}", e),
        }
    }
}
