use std::mem;
use std::thread::{self, JoinHandle};
use crossbeam_channel::bounded;
use log::{debug, error};
use crate::error::OrchestratorError;
use crate::facade::conversion_facade::panic_message;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::{BatchRequest, BatchResult};

type Facade = Box<dyn ConversionFacadeTrait>;
type Finished = (Facade, Result<BatchResult, OrchestratorError>);

enum Slot {
    Idle(Facade),
    Running(JoinHandle<Option<Finished>>),
    Lost,
}

/// Runs batches on a dedicated thread so the caller's thread stays free.
///
/// The facade moves into the thread for the duration of a batch and comes
/// back on `wait`. Only one batch runs at a time.
pub struct BatchWorker {
    slot: Slot,
}

impl BatchWorker {
    pub fn new(facade: Facade) -> Self {
        BatchWorker { slot: Slot::Idle(facade) }
    }

    pub fn start(&mut self, request: BatchRequest) -> Result<(), OrchestratorError> {
        let facade = match mem::replace(&mut self.slot, Slot::Lost) {
            Slot::Idle(facade) => facade,
            running @ Slot::Running(_) => {
                self.slot = running;
                return Err(OrchestratorError::AlreadyRunning);
            }
            Slot::Lost => {
                return Err(OrchestratorError::WorkerPanicked(
                    "orchestrator was lost in an earlier batch".to_string(),
                ))
            }
        };

        // the thread is spawned before the facade is handed over, so a
        // failed spawn leaves the worker idle
        let (handoff, inbox) = bounded::<(Facade, BatchRequest)>(1);
        let spawned = thread::Builder::new()
            .name("hwpx-batch".to_string())
            .spawn(move || {
                let (mut facade, request) = inbox.recv().ok()?;
                let result = facade.run_batch(&request);
                Some((facade, result))
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.slot = Slot::Idle(facade);
                return Err(OrchestratorError::WorkerSpawn(e));
            }
        };

        if let Err(returned) = handoff.send((facade, request)) {
            let (facade, _) = returned.into_inner();
            let _ = handle.join();
            self.slot = Slot::Idle(facade);
            return Err(OrchestratorError::WorkerPanicked(
                "batch thread exited before receiving work".to_string(),
            ));
        }
        debug!("batch thread started");
        self.slot = Slot::Running(handle);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.slot, Slot::Running(handle) if !handle.is_finished())
    }

    /// Blocks until the running batch ends and returns its result.
    pub fn wait(&mut self) -> Result<BatchResult, OrchestratorError> {
        let handle = match mem::replace(&mut self.slot, Slot::Lost) {
            Slot::Running(handle) => handle,
            other => {
                self.slot = other;
                return Err(OrchestratorError::NotStarted);
            }
        };
        match handle.join() {
            Ok(Some((facade, result))) => {
                self.slot = Slot::Idle(facade);
                result
            }
            Ok(None) => Err(OrchestratorError::WorkerPanicked(
                "batch thread received no work".to_string(),
            )),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!("batch thread panicked: {}", reason);
                Err(OrchestratorError::WorkerPanicked(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Receiver, Sender};
    use std::path::PathBuf;

    struct GatedFacade {
        entered: Sender<()>,
        release: Receiver<()>,
        runs: usize,
    }

    impl ConversionFacadeTrait for GatedFacade {
        fn run_batch(&mut self, _request: &BatchRequest) -> Result<BatchResult, OrchestratorError> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            self.runs += 1;
            let mut result = BatchResult::empty();
            result.succeeded = self.runs;
            Ok(result.finalize())
        }
    }

    struct PanickingFacade;

    impl ConversionFacadeTrait for PanickingFacade {
        fn run_batch(&mut self, _request: &BatchRequest) -> Result<BatchResult, OrchestratorError> {
            panic!("facade blew up")
        }
    }

    fn request() -> BatchRequest {
        BatchRequest {
            input_root: PathBuf::from("in"),
            output_root: PathBuf::from("out"),
            recursive: false,
        }
    }

    fn gated() -> (BatchWorker, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = bounded(4);
        let (release_tx, release_rx) = bounded(4);
        let facade = GatedFacade {
            entered: entered_tx,
            release: release_rx,
            runs: 0,
        };
        (BatchWorker::new(Box::new(facade)), entered_rx, release_tx)
    }

    #[test]
    fn second_start_is_rejected_while_running() {
        let (mut worker, entered, release) = gated();
        worker.start(request()).unwrap();
        entered.recv().unwrap();

        assert!(worker.is_running());
        assert!(matches!(worker.start(request()), Err(OrchestratorError::AlreadyRunning)));

        release.send(()).unwrap();
        assert_eq!(worker.wait().unwrap().succeeded, 1);
        assert!(!worker.is_running());
    }

    #[test]
    fn wait_without_start_is_an_error() {
        let (mut worker, _entered, _release) = gated();
        assert!(matches!(worker.wait(), Err(OrchestratorError::NotStarted)));
    }

    #[test]
    fn facade_comes_back_for_the_next_batch() {
        let (mut worker, entered, release) = gated();
        for expected in 1..=2 {
            worker.start(request()).unwrap();
            entered.recv().unwrap();
            release.send(()).unwrap();
            assert_eq!(worker.wait().unwrap().succeeded, expected);
        }
    }

    #[test]
    fn panicking_batch_is_reported() {
        let mut worker = BatchWorker::new(Box::new(PanickingFacade));
        worker.start(request()).unwrap();
        match worker.wait() {
            Err(OrchestratorError::WorkerPanicked(reason)) => assert_eq!(reason, "facade blew up"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(worker.start(request()), Err(OrchestratorError::WorkerPanicked(_))));
    }
}
