//! Host-facing inverter sound engine.
//!
//! [`Inverter`] owns the controller, the playback sink and, while running,
//! a generator thread and a playback thread connected by the buffer
//! pipeline. Telemetry setters run on the caller's thread and update the
//! shared controller; the generator picks the new parameters up on its next
//! buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use vvvf_spec::InverterConfig;

use crate::controller::{Controller, DerivedParams};
use crate::error::{EngineError, EngineResult};
use crate::generator::WaveformEngine;
use crate::pipeline::{self, Consumer, Fill, Producer, Step};
use crate::sink::PlaybackSink;
use crate::stats::{EngineStats, RateMeter, StatsCounters};

/// Name of the sample generation thread.
pub const GENERATOR_THREAD: &str = "vvvf-generator";

/// Name of the playback thread.
pub const PLAYBACK_THREAD: &str = "vvvf-playback";

type SharedSink = Arc<Mutex<Box<dyn PlaybackSink>>>;

struct Workers {
    running: Arc<AtomicBool>,
    generator: JoinHandle<()>,
    playback: JoinHandle<()>,
}

/// Real-time inverter sound engine.
///
/// # Example
///
/// ```
/// use vvvf_backend_audio::{Inverter, MemorySink};
/// use vvvf_spec::InverterConfig;
///
/// let sink = MemorySink::new();
/// let mut inverter = Inverter::new(InverterConfig::default(), sink.clone()).unwrap();
///
/// inverter.set_motor_poles(4);
/// let params = inverter.set_motor_current(60.0);
/// assert!(params.amplitude > 0.0);
///
/// inverter.start().unwrap();
/// inverter.stop().unwrap();
/// assert!(sink.capture().finished);
/// ```
pub struct Inverter {
    config: InverterConfig,
    controller: Arc<Mutex<Controller>>,
    counters: Arc<StatsCounters>,
    rates: Mutex<RateMeter>,
    sink: SharedSink,
    workers: Option<Workers>,
}

impl Inverter {
    /// Validates `config` and creates a stopped engine.
    pub fn new(config: InverterConfig, sink: impl PlaybackSink + 'static) -> EngineResult<Self> {
        config.validate()?;
        let sink: Box<dyn PlaybackSink> = Box::new(sink);
        Ok(Self {
            controller: Arc::new(Mutex::new(Controller::new(config.clone()))),
            counters: Arc::new(StatsCounters::new()),
            rates: Mutex::new(RateMeter::new()),
            sink: Arc::new(Mutex::new(sink)),
            workers: None,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &InverterConfig {
        &self.config
    }

    /// Whether the worker threads are running.
    pub fn is_running(&self) -> bool {
        self.workers.is_some()
    }

    /// Allocates the buffers and spawns the worker threads.
    ///
    /// Does nothing (with a warning) if already running. On failure nothing
    /// is left allocated or running.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.workers.is_some() {
            log::warn!("Inverter sound engine already running");
            return Ok(());
        }

        let pipeline_config = self.config.pipeline;
        let (producer, consumer) =
            pipeline::channel(pipeline_config.buffer_count, pipeline_config.buffer_length)?;
        let running = Arc::new(AtomicBool::new(true));

        let generator = self.spawn_generator(producer, Arc::clone(&running))?;
        let playback = match self.spawn_playback(consumer, Arc::clone(&running)) {
            Ok(handle) => handle,
            Err(e) => {
                running.store(false, Ordering::Release);
                if generator.join().is_err() {
                    log::error!("{} thread panicked during aborted start", GENERATOR_THREAD);
                }
                return Err(e);
            }
        };

        *self.rates.lock() =
            RateMeter::with_totals(self.counters.generated(), self.counters.consumed());
        self.workers = Some(Workers {
            running,
            generator,
            playback,
        });
        log::info!(
            "Started inverter sound engine: {} Hz, {} x {} samples",
            pipeline_config.sample_rate,
            pipeline_config.buffer_count,
            pipeline_config.buffer_length
        );
        Ok(())
    }

    /// Stops and joins the worker threads, releases the buffers and
    /// finalizes the sink. Does nothing if not running.
    pub fn stop(&mut self) -> EngineResult<()> {
        let Some(workers) = self.workers.take() else {
            log::debug!("Inverter sound engine not running");
            return Ok(());
        };

        workers.running.store(false, Ordering::Release);
        let generator = workers.generator.join();
        let playback = workers.playback.join();
        if generator.is_err() {
            return Err(EngineError::ThreadPanicked {
                name: GENERATOR_THREAD,
            });
        }
        if playback.is_err() {
            return Err(EngineError::ThreadPanicked {
                name: PLAYBACK_THREAD,
            });
        }

        self.sink.lock().finish()?;
        log::info!(
            "Stopped inverter sound engine after {} samples",
            self.counters.consumed()
        );
        Ok(())
    }

    /// Feeds a phase current sample in amps.
    pub fn set_motor_current(&self, amps: f32) -> DerivedParams {
        self.controller.lock().set_motor_current(amps)
    }

    /// Feeds an electrical frequency sample in Hz.
    pub fn set_motor_frequency(&self, hz: f32) -> DerivedParams {
        self.controller.lock().set_motor_frequency(hz)
    }

    /// Sets the motor pole count.
    pub fn set_motor_poles(&self, poles: u32) -> DerivedParams {
        self.controller.lock().set_motor_poles(poles)
    }

    /// Latest derived parameters.
    pub fn params(&self) -> DerivedParams {
        self.controller.lock().params()
    }

    /// Snapshot of counters and parameters.
    ///
    /// Rates are measured since the previous call (or since start).
    pub fn stats(&self) -> EngineStats {
        let params = self.params();
        let generated = self.counters.generated();
        let consumed = self.counters.consumed();
        let (generated_per_second, consumed_per_second) =
            self.rates.lock().sample(generated, consumed);

        let pipeline = &self.config.pipeline;
        let ceiling = pipeline.sample_rate as f64 * pipeline.rate_warning_factor as f64;
        if self.is_running() && generated_per_second > ceiling {
            log::warn!(
                "Generating {:.0} samples/s, above the {} Hz sample rate",
                generated_per_second,
                pipeline.sample_rate
            );
        }

        EngineStats {
            running: self.is_running(),
            generated_samples: generated,
            consumed_samples: consumed,
            generated_per_second,
            consumed_per_second,
            starvation_count: self.counters.starved(),
            sink_errors: self.counters.sink_errors(),
            speed_kmh: params.speed_kmh,
            rotor_state: params.rotor_state,
            active_range: params.active_range,
            waveform: params.waveform_kind(),
            carrier_hz: self.counters.carrier_hz(),
            amplitude: params.amplitude,
        }
    }

    fn thread_builder(&self, name: &'static str) -> thread::Builder {
        thread::Builder::new()
            .name(name.to_string())
            .stack_size(self.config.pipeline.thread_stack_size)
    }

    fn spawn_generator(
        &self,
        producer: Producer,
        running: Arc<AtomicBool>,
    ) -> EngineResult<JoinHandle<()>> {
        let controller = Arc::clone(&self.controller);
        let counters = Arc::clone(&self.counters);
        let pipeline_config = self.config.pipeline;
        let hz_to_kmh = self.config.hz_to_kmh_factor;
        let mut engine = WaveformEngine::new(pipeline_config.sample_rate, self.config.generator);
        let poll = Duration::from_micros(pipeline_config.poll_interval_us);

        self.thread_builder(GENERATOR_THREAD)
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    let step = producer.fill_next(poll, |samples| {
                        let params = controller.lock().params();
                        let enabled = engine.generate(
                            samples,
                            &params.active_range,
                            params.rotor_state,
                            params.command_hz,
                            params.pole_count,
                            hz_to_kmh,
                        );
                        counters.set_carrier_hz(if enabled {
                            engine.carrier_frequency()
                        } else {
                            0.0
                        });
                        Fill {
                            gain: params.amplitude,
                            enabled,
                        }
                    });
                    match step {
                        Step::Transferred(n) => counters.add_generated(n),
                        Step::TimedOut | Step::Skipped => {}
                        Step::Disconnected => break,
                    }
                }
                log::debug!("{} thread exiting", GENERATOR_THREAD);
            })
            .map_err(|source| EngineError::ThreadSpawn {
                name: GENERATOR_THREAD,
                source,
            })
    }

    fn spawn_playback(
        &self,
        consumer: Consumer,
        running: Arc<AtomicBool>,
    ) -> EngineResult<JoinHandle<()>> {
        let sink = Arc::clone(&self.sink);
        let counters = Arc::clone(&self.counters);
        let pipeline_config = self.config.pipeline;
        let poll = Duration::from_micros(pipeline_config.poll_interval_us);
        let grace = Duration::from_millis(pipeline_config.startup_grace_ms);
        let buffer_duration = Duration::from_micros(pipeline_config.buffer_duration_us());

        self.thread_builder(PLAYBACK_THREAD)
            .spawn(move || {
                let started = Instant::now();
                while running.load(Ordering::Acquire) {
                    let step = consumer.consume_next(poll, |buffer| {
                        if buffer.is_enabled() || pipeline_config.play_silent_buffers {
                            let result = sink.lock().play(
                                buffer.samples(),
                                pipeline_config.sample_rate,
                                buffer.gain(),
                            );
                            if let Err(e) = result {
                                log::warn!("Playback sink failed: {}", e);
                                counters.add_sink_error();
                            }
                        }
                        // The buffer stays out of the free pool until its playing time is up.
                        if pipeline_config.compensate_playback {
                            thread::sleep(buffer_duration);
                        }
                    });
                    match step {
                        Step::Transferred(n) => counters.add_consumed(n),
                        Step::TimedOut => {
                            if started.elapsed() >= grace {
                                log::warn!("Playback thread starved for sample buffers");
                                counters.add_starvation();
                            }
                        }
                        Step::Skipped => {}
                        Step::Disconnected => break,
                    }
                }
                log::debug!("{} thread exiting", PLAYBACK_THREAD);
            })
            .map_err(|source| EngineError::ThreadSpawn {
                name: PLAYBACK_THREAD,
                source,
            })
    }
}

impl Drop for Inverter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Failed to stop inverter sound engine: {}", e);
        }
    }
}
