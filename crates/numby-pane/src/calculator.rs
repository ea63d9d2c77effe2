// ABOUTME: Default pane session: input text plus debounced background evaluation.
// ABOUTME: Recompute runs on a tokio task that is cancelled when the pane closes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use numby_core::{LeafId, SessionSettings};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{ContentSession, SessionError, SessionFactory};

/// Evaluates one line of calculator input. Implemented by the native engine.
pub trait Engine: Send + 'static {
    fn evaluate(&mut self, line: &str) -> Option<String>;
}

/// Stand-in engine that produces no results
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEngine;

impl Engine for NoopEngine {
    fn evaluate(&mut self, _line: &str) -> Option<String> {
        None
    }
}

type EngineBuilder = Arc<dyn Fn() -> Box<dyn Engine> + Send + Sync>;

/// Creates [`CalculatorSession`]s on a tokio runtime
#[derive(Clone)]
pub struct CalculatorFactory {
    runtime: Handle,
    engine: EngineBuilder,
    debounce: Duration,
    max_sessions: usize,
    live: Arc<AtomicUsize>,
}

impl CalculatorFactory {
    pub fn new(runtime: Handle, settings: &SessionSettings) -> Self {
        Self {
            runtime,
            engine: Arc::new(|| Box::new(NoopEngine) as Box<dyn Engine>),
            debounce: Duration::from_millis(settings.debounce_ms),
            max_sessions: settings.max_sessions,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Use a different engine for sessions created from now on
    pub fn with_engine<F, E>(mut self, build: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Engine,
    {
        self.engine = Arc::new(move || Box::new(build()) as Box<dyn Engine>);
        self
    }

    /// Sessions created by this factory (or its clones) that are not yet disposed
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn reserve_slot(&self) -> Result<(), SessionError> {
        if self.max_sessions == 0 {
            self.live.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_sessions).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| SessionError::LimitReached(self.max_sessions))
    }
}

impl SessionFactory for CalculatorFactory {
    type Session = CalculatorSession;

    fn create(&mut self, leaf: LeafId) -> Result<CalculatorSession, SessionError> {
        self.reserve_slot()?;
        Ok(CalculatorSession::spawn(
            leaf,
            &self.runtime,
            (self.engine)(),
            self.debounce,
            Arc::clone(&self.live),
        ))
    }
}

/// Calculator state for one pane
pub struct CalculatorSession {
    leaf: LeafId,
    input: watch::Sender<String>,
    results: watch::Receiver<Vec<Option<String>>>,
    inert: Arc<AtomicBool>,
    task: JoinHandle<()>,
    live: Arc<AtomicUsize>,
}

impl CalculatorSession {
    fn spawn(
        leaf: LeafId,
        runtime: &Handle,
        engine: Box<dyn Engine>,
        debounce: Duration,
        live: Arc<AtomicUsize>,
    ) -> Self {
        let (input, input_rx) = watch::channel(String::new());
        let (results_tx, results) = watch::channel(Vec::new());
        let inert = Arc::new(AtomicBool::new(false));

        let task = runtime.spawn(recompute_loop(
            input_rx,
            results_tx,
            engine,
            Arc::clone(&inert),
            debounce,
        ));

        tracing::debug!("Created session for pane {}", leaf);

        Self {
            leaf,
            input,
            results,
            inert,
            task,
            live,
        }
    }

    pub fn leaf(&self) -> LeafId {
        self.leaf
    }

    pub fn input(&self) -> String {
        self.input.borrow().clone()
    }

    /// Replace the input text and schedule a recompute. Ignored once disposed.
    pub fn set_input(&self, text: impl Into<String>) {
        if self.is_inert() {
            tracing::debug!("Ignoring input for disposed pane {}", self.leaf);
            return;
        }
        self.input.send_replace(text.into());
    }

    /// Latest per-line results
    pub fn results(&self) -> Vec<Option<String>> {
        self.results.borrow().clone()
    }

    /// Receiver that wakes whenever new results are published
    pub fn subscribe(&self) -> watch::Receiver<Vec<Option<String>>> {
        let mut rx = self.results.clone();
        rx.borrow_and_update();
        rx
    }
}

impl ContentSession for CalculatorSession {
    fn dispose(&mut self) -> Result<(), SessionError> {
        if self.inert.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyDisposed);
        }
        self.task.abort();
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Disposed session for pane {}", self.leaf);
        Ok(())
    }

    fn is_inert(&self) -> bool {
        self.inert.load(Ordering::SeqCst)
    }

    fn contents(&self) -> String {
        self.input()
    }

    fn restore_contents(&mut self, contents: String) {
        self.set_input(contents);
    }
}

impl Drop for CalculatorSession {
    fn drop(&mut self) {
        if !self.is_inert() {
            let _ = self.dispose();
        }
    }
}

async fn recompute_loop(
    mut input: watch::Receiver<String>,
    results: watch::Sender<Vec<Option<String>>>,
    mut engine: Box<dyn Engine>,
    inert: Arc<AtomicBool>,
    debounce: Duration,
) {
    while input.changed().await.is_ok() {
        // Restart the quiet period on every further edit
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        if inert.load(Ordering::SeqCst) {
            return;
        }
        let text = input.borrow_and_update().clone();
        // Engine calls block, so they run on the blocking pool
        let batch = tokio::task::spawn_blocking(move || {
            let lines: Vec<Option<String>> =
                text.lines().map(|line| engine.evaluate(line)).collect();
            (engine, lines)
        });
        let lines = match batch.await {
            Ok((returned, lines)) => {
                engine = returned;
                lines
            }
            Err(e) => {
                tracing::warn!("Calculator engine failed: {}", e);
                return;
            }
        };
        if inert.load(Ordering::SeqCst) {
            return;
        }
        results.send_replace(lines);
    }
}
