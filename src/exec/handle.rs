//! One-shot asynchronous runs
//!
//! A [`DeferredRun`] owns its controller, so it can run at most once. The
//! outcome travels back over a bounded channel, which is the only point at
//! which a caller observes it: there is no flag that can be read ahead of
//! the result it describes.

use crate::config::types::{EngineError, Result, ScriptError};
use crate::exec::controller::ExecutionController;
use crate::language::executor::LanguageExecutor;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::io;
use std::thread::{self, JoinHandle};

const RUN_THREAD_NAME: &str = "scriptbox-run";

pub struct DeferredRun<E: LanguageExecutor> {
    controller: ExecutionController<E>,
}

impl<E: LanguageExecutor> DeferredRun<E> {
    pub(crate) fn new(controller: ExecutionController<E>) -> Self {
        Self { controller }
    }

    /// Run on the calling thread
    pub fn run(mut self) -> RunOutcome<E> {
        let result = self.controller.run();
        RunOutcome {
            controller: self.controller,
            result,
        }
    }

    /// Run on a dedicated thread
    pub fn spawn(self) -> io::Result<RunHandle<E>>
    where
        E: 'static,
    {
        let (sender, receiver) = bounded(1);
        let thread = thread::Builder::new()
            .name(RUN_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = self.run();
                if sender.send(outcome).is_err() {
                    log::debug!("run handle dropped before the outcome was delivered");
                }
            })?;

        Ok(RunHandle {
            receiver,
            thread: Some(thread),
        })
    }
}

pub struct RunHandle<E: LanguageExecutor> {
    receiver: Receiver<RunOutcome<E>>,
    thread: Option<JoinHandle<()>>,
}

impl<E: LanguageExecutor> RunHandle<E> {
    /// Block until the run finishes
    pub fn wait(mut self) -> Result<RunOutcome<E>> {
        let outcome = self.receiver.recv().map_err(|_| lost_outcome());
        self.join();
        outcome
    }

    /// The outcome if the run has already finished
    pub fn try_outcome(&mut self) -> Option<Result<RunOutcome<E>>> {
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.join();
                Some(Ok(outcome))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(lost_outcome()))
            }
        }
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("{} thread panicked", RUN_THREAD_NAME);
            }
        }
    }
}

fn lost_outcome() -> ScriptError {
    ScriptError::Engine(EngineError::Runtime(
        "run thread ended without delivering an outcome".to_string(),
    ))
}

/// What a finished run produced, along with the controller for disposal
pub struct RunOutcome<E: LanguageExecutor> {
    controller: ExecutionController<E>,
    result: Result<E::Output>,
}

impl<E: LanguageExecutor> RunOutcome<E> {
    /// Whether the run finished without failing
    pub fn completed(&self) -> bool {
        self.result.is_ok()
    }

    pub fn exception(&self) -> Option<&ScriptError> {
        self.result.as_ref().err()
    }

    pub fn result(&self) -> Option<&E::Output> {
        self.result.as_ref().ok()
    }

    pub fn controller(&self) -> &ExecutionController<E> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExecutionController<E> {
        &mut self.controller
    }

    pub fn into_result(self) -> Result<E::Output> {
        self.result
    }

    pub fn into_controller(self) -> ExecutionController<E> {
        self.controller
    }

    pub fn into_parts(self) -> (ExecutionController<E>, Result<E::Output>) {
        (self.controller, self.result)
    }
}
