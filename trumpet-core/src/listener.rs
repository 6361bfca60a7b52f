//! # Pitch Listener
//!
//! Runs microphone capture and pitch estimation on a dedicated worker thread
//! and hands [`AnalysisResult`]s to the UI thread.
//!
//! ## Architecture
//! - The audio source is created on the worker, where its stream lives
//! - Raw frames and control messages are selected on crossbeam channels
//! - Start failures are reported back synchronously as [`AudioError`]
//! - A lost device or a stream that cannot be resumed ends the worker; the
//!   owner sees it as stopped and can read the cause with `take_fault`

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::audio::{AudioSource, CpalInput};
use crate::error::AudioError;
use crate::pitch::PitchEstimator;
use crate::AnalysisResult;

/// How long `start` waits for the device to open.
const START_TIMEOUT: Duration = Duration::from_secs(5);

const RAW_FRAME_CAPACITY: usize = 16;
const RESULT_CAPACITY: usize = 64;
const FAULT_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Suspend,
    Resume,
    Shutdown,
}

#[derive(Debug)]
struct Worker {
    control_tx: Sender<Control>,
    results_rx: Receiver<AnalysisResult>,
    fault_rx: Receiver<AudioError>,
    thread_handle: Option<JoinHandle<()>>,
    sample_rate: u32,
}

/// Exclusive owner of the microphone while listening.
#[derive(Debug, Default)]
pub struct PitchListener {
    worker: Option<Worker>,
}

impl PitchListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts listening on the default input device.
    pub fn start_default(&mut self, reference: f32) -> Result<(), AudioError> {
        self.start(CpalInput::default, reference)
    }

    /// Starts listening on the source built by `make_source`. Calling this
    /// while already listening does nothing.
    pub fn start<S, F>(&mut self, make_source: F, reference: f32) -> Result<(), AudioError>
    where
        S: AudioSource,
        F: FnOnce() -> S + Send + 'static,
    {
        if self.is_listening() {
            debug!("listener already running");
            return Ok(());
        }
        // Clean up a worker that ended on its own.
        self.stop();

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<u32, AudioError>>(1);
        let (control_tx, control_rx) = crossbeam_channel::unbounded::<Control>();
        let (results_tx, results_rx) = crossbeam_channel::bounded::<AnalysisResult>(RESULT_CAPACITY);
        let (fault_tx, fault_rx) = crossbeam_channel::bounded::<AudioError>(1);

        let thread_handle = thread::spawn(move || {
            debug!("audio worker starting");
            let (raw_tx, raw_rx) = crossbeam_channel::bounded::<Vec<f32>>(RAW_FRAME_CAPACITY);
            let (stream_fault_tx, stream_fault_rx) =
                crossbeam_channel::bounded::<AudioError>(FAULT_CAPACITY);
            let mut source = make_source();
            let sample_rate = match source.start(raw_tx, stream_fault_tx) {
                Ok(rate) => {
                    let _ = ready_tx.send(Ok(rate));
                    rate
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let estimator = PitchEstimator::new(sample_rate).with_reference(reference);

            loop {
                crossbeam_channel::select! {
                    recv(raw_rx) -> msg => match msg {
                        Ok(frame) => {
                            let result = estimator.analyse(&frame);
                            match results_tx.try_send(result) {
                                Ok(()) | Err(crossbeam_channel::TrySendError::Full(_)) => {}
                                Err(crossbeam_channel::TrySendError::Disconnected(_)) => break,
                            }
                        }
                        Err(_) => {
                            debug!("audio frame channel closed");
                            break;
                        }
                    },
                    recv(control_rx) -> msg => match msg {
                        Ok(Control::Suspend) => source.suspend(),
                        Ok(Control::Resume) => {
                            if let Err(e) = source.resume() {
                                warn!("could not resume audio input, stopping: {}", e);
                                let _ = fault_tx.try_send(e);
                                break;
                            }
                        }
                        Ok(Control::Shutdown) | Err(_) => break,
                    },
                    recv(stream_fault_rx) -> msg => match msg {
                        Ok(AudioError::Stream(detail)) => {
                            // Transient backend errors get one restart attempt.
                            warn!("audio stream error, restarting: {}", detail);
                            if let Err(e) = source.resume() {
                                warn!("audio stream did not recover: {}", e);
                                let _ = fault_tx.try_send(e);
                                break;
                            }
                        }
                        Ok(fault) => {
                            warn!("audio input lost: {}", fault);
                            let _ = fault_tx.try_send(fault);
                            break;
                        }
                        Err(_) => {
                            debug!("audio stream dropped");
                            break;
                        }
                    },
                }
            }

            source.stop();
            debug!("audio worker finished");
        });

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(sample_rate)) => {
                info!(sample_rate, "pitch listener started");
                self.worker = Some(Worker {
                    control_tx,
                    results_rx,
                    fault_rx,
                    thread_handle: Some(thread_handle),
                    sample_rate,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("audio input failed to start: {}", e);
                let _ = thread_handle.join();
                Err(e)
            }
            Err(_) => {
                // Dropping the control sender makes the worker exit once the
                // device call returns.
                warn!("audio input did not start within {:?}", START_TIMEOUT);
                Err(AudioError::StartTimeout)
            }
        }
    }

    /// Listening, and the worker is still alive.
    pub fn is_listening(&self) -> bool {
        self.worker
            .as_ref()
            .and_then(|w| w.thread_handle.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.worker.as_ref().map(|w| w.sample_rate)
    }

    /// Pauses capture, e.g. while the window is hidden.
    pub fn suspend(&self) {
        self.send(Control::Suspend);
    }

    pub fn resume(&self) {
        self.send(Control::Resume);
    }

    fn send(&self, control: Control) {
        if let Some(worker) = &self.worker {
            let _ = worker.control_tx.send(control);
        }
    }

    /// Every result produced since the last call, oldest first.
    pub fn drain(&self) -> Vec<AnalysisResult> {
        let mut results = Vec::new();
        if let Some(worker) = &self.worker {
            loop {
                match worker.results_rx.try_recv() {
                    Ok(result) => results.push(result),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
        results
    }

    /// Why the worker ended on its own, if it did.
    pub fn take_fault(&self) -> Option<AudioError> {
        self.worker.as_ref().and_then(|w| w.fault_rx.try_recv().ok())
    }

    /// Waits up to `timeout` for the next result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AnalysisResult> {
        self.worker
            .as_ref()
            .and_then(|w| w.results_rx.recv_timeout(timeout).ok())
    }

    /// Stops the worker and releases the device.
    pub fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            let _ = worker.control_tx.send(Control::Shutdown);
            if let Some(handle) = worker.thread_handle.take() {
                if handle.join().is_err() {
                    warn!("audio worker panicked");
                }
            }
            info!("pitch listener stopped");
        }
    }
}

impl Drop for PitchListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Sends a fixed number of sine frames and an optional stream fault, then
    /// holds both channels open.
    struct SineSource {
        frames: usize,
        fault: Option<AudioError>,
        senders: Option<(Sender<Vec<f32>>, Sender<AudioError>)>,
        stops: Arc<AtomicUsize>,
        fail_resume: bool,
    }

    impl AudioSource for SineSource {
        fn start(
            &mut self,
            frames: Sender<Vec<f32>>,
            faults: Sender<AudioError>,
        ) -> Result<u32, AudioError> {
            for _ in 0..self.frames {
                let frame = (0..2048)
                    .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
                    .collect();
                let _ = frames.send(frame);
            }
            if let Some(fault) = self.fault.take() {
                let _ = faults.send(fault);
            }
            self.senders = Some((frames, faults));
            Ok(44100)
        }

        fn suspend(&mut self) {}

        fn resume(&mut self) -> Result<(), AudioError> {
            if self.fail_resume {
                Err(AudioError::Stream("gone".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            self.senders = None;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct DeniedSource;

    impl AudioSource for DeniedSource {
        fn start(
            &mut self,
            _frames: Sender<Vec<f32>>,
            _faults: Sender<AudioError>,
        ) -> Result<u32, AudioError> {
            Err(AudioError::PermissionDenied("denied".into()))
        }
        fn suspend(&mut self) {}
        fn resume(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn stop(&mut self) {}
    }

    fn sine_source(frames: usize, stops: &Arc<AtomicUsize>, fail_resume: bool) -> SineSource {
        SineSource {
            frames,
            fault: None,
            senders: None,
            stops: Arc::clone(stops),
            fail_resume,
        }
    }

    #[test]
    fn results_flow_from_the_worker() {
        let stops = Arc::new(AtomicUsize::new(0));
        let source_stops = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener
            .start(move || sine_source(3, &source_stops, false), 440.0)
            .unwrap();
        assert!(listener.is_listening());
        assert_eq!(listener.sample_rate(), Some(44100));

        let result = listener.recv_timeout(Duration::from_secs(2)).unwrap();
        let sample = result.sample.unwrap();
        assert_eq!(sample.note_name, "A");
        assert_eq!(sample.octave, 4);

        listener.stop();
        assert!(!listener.is_listening());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_failure_is_reported() {
        let mut listener = PitchListener::new();
        let err = listener.start(|| DeniedSource, 440.0).unwrap_err();
        assert!(matches!(err, AudioError::PermissionDenied(_)));
        assert!(!listener.is_listening());
        assert!(listener.drain().is_empty());
    }

    #[test]
    fn second_start_is_a_no_op() {
        let stops = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&stops);
        let second = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener.start(move || sine_source(0, &first, false), 440.0).unwrap();
        listener.start(move || sine_source(0, &second, false), 440.0).unwrap();
        drop(listener);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_resume_stops_the_worker() {
        let stops = Arc::new(AtomicUsize::new(0));
        let source_stops = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener
            .start(move || sine_source(0, &source_stops, true), 440.0)
            .unwrap();
        listener.suspend();
        listener.resume();

        wait_until_stopped(&listener);
        assert!(!listener.is_listening());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(matches!(listener.take_fault(), Some(AudioError::Stream(_))));
        listener.stop();
    }

    fn wait_until_stopped(listener: &PitchListener) {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while listener.is_listening() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn lost_device_stops_the_worker() {
        let stops = Arc::new(AtomicUsize::new(0));
        let source_stops = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener
            .start(
                move || SineSource {
                    fault: Some(AudioError::NoDevice),
                    ..sine_source(0, &source_stops, false)
                },
                440.0,
            )
            .unwrap();

        wait_until_stopped(&listener);
        assert!(!listener.is_listening());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(listener.take_fault(), Some(AudioError::NoDevice));
        listener.stop();
    }

    #[test]
    fn transient_stream_error_keeps_listening() {
        let stops = Arc::new(AtomicUsize::new(0));
        let source_stops = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener
            .start(
                move || SineSource {
                    fault: Some(AudioError::Stream("xrun".into())),
                    ..sine_source(0, &source_stops, false)
                },
                440.0,
            )
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(listener.is_listening());
        assert_eq!(listener.take_fault(), None);
        listener.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unrecoverable_stream_error_is_reported() {
        let stops = Arc::new(AtomicUsize::new(0));
        let source_stops = Arc::clone(&stops);
        let mut listener = PitchListener::new();
        listener
            .start(
                move || SineSource {
                    fault: Some(AudioError::Stream("xrun".into())),
                    ..sine_source(0, &source_stops, true)
                },
                440.0,
            )
            .unwrap();

        wait_until_stopped(&listener);
        assert!(!listener.is_listening());
        assert!(matches!(listener.take_fault(), Some(AudioError::Stream(_))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
