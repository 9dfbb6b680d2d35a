//! Soft-PWM buzzer
//!
//! Drives a piezo buzzer by toggling a GPIO pin in software at the
//! configured audible frequency; no timer peripheral is consumed.
//! Commands arrive through a bounded channel and are rendered one at a
//! time, strictly in submission order. Producers only ever block when
//! the queue is full, which is the back-pressure signal that alerts
//! are being issued faster than they can sound.
//!
//! Tone lengths are timed against the monotonic clock rather than
//! counted in cycles, so a tone may run long by at most one
//! half-period.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;

use fornax_core::shutdown::ShutdownLatch;

/// Capacity of the command queue between producers and the render loop
pub const QUEUE_DEPTH: usize = 16;

/// How often a blocked or silent render loop re-checks the shutdown
/// latch
const LATCH_POLL: Duration = Duration::from_millis(10);

/// One queued buzzer action: a signed duration in seconds. Positive
/// values sound the buzzer, negative values hold silence for the
/// magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuzzerCommand {
    seconds: f32,
}

impl BuzzerCommand {
    /// A tone of `seconds` length
    pub fn beep(seconds: f32) -> Self {
        Self {
            seconds: seconds.abs(),
        }
    }

    /// Silence of `seconds` length
    pub fn pause(seconds: f32) -> Self {
        Self {
            seconds: -seconds.abs(),
        }
    }

    /// Whether this command sounds the buzzer
    pub fn is_tone(&self) -> bool {
        self.seconds > 0.0
    }

    /// Magnitude of the command
    pub fn duration(&self) -> Duration {
        Duration::from_micros((self.seconds.abs() * 1_000_000.0) as u64)
    }
}

/// Software-PWM buzzer output
pub struct SoftPwmBuzzer<P> {
    pin: P,
    half_period: Duration,
}

impl<P: OutputPin> SoftPwmBuzzer<P> {
    /// Take ownership of the output pin and drive it to its quiet
    /// level. `freq_hz` is the audible frequency of rendered tones.
    pub fn new(mut pin: P, freq_hz: u32) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            half_period: Duration::from_micros(1_000_000 / (2 * freq_hz as u64)),
        })
    }

    /// Render a single command.
    ///
    /// Tones toggle the pin in half-period steps until the wall-clock
    /// deadline passes; silence sleeps in bounded slices. Both forms
    /// abandon the remainder as soon as the shutdown latch is set.
    pub async fn render(
        &mut self,
        command: BuzzerCommand,
        latch: &ShutdownLatch,
    ) -> Result<(), P::Error> {
        let deadline = Instant::now() + command.duration();

        if command.is_tone() {
            while Instant::now() < deadline && !latch.is_set() {
                self.pin.set_high()?;
                Timer::after(self.half_period).await;
                self.pin.set_low()?;
                Timer::after(self.half_period).await;
            }
        } else {
            while Instant::now() < deadline && !latch.is_set() {
                Timer::after(LATCH_POLL).await;
            }
        }

        Ok(())
    }

    /// Consume and render commands until shutdown.
    ///
    /// Blocks on an empty queue; setting the latch unblocks the wait
    /// and cuts any tone in progress. The pin is driven to its quiet
    /// level exactly once on the way out, on every exit path.
    pub async fn run<M: RawMutex, const N: usize>(
        &mut self,
        commands: Receiver<'_, M, BuzzerCommand, N>,
        latch: &ShutdownLatch,
    ) -> Result<(), P::Error> {
        let result = loop {
            if latch.is_set() {
                break Ok(());
            }
            match select(commands.receive(), cancelled(latch)).await {
                Either::First(command) => {
                    if let Err(e) = self.render(command, latch).await {
                        break Err(e);
                    }
                }
                Either::Second(()) => break Ok(()),
            }
        };

        let release = self.pin.set_low();
        result.and(release)
    }
}

/// Resolve once the shutdown latch is set
async fn cancelled(latch: &ShutdownLatch) {
    while !latch.is_set() {
        Timer::after(LATCH_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;

    /// Mock GPIO pin recording every level change
    struct MockPin {
        high: bool,
        highs: u32,
        lows: u32,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                highs: 0,
                lows: 0,
            }
        }
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.lows += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.highs += 1;
            Ok(())
        }
    }

    #[test]
    fn test_command_sign_convention() {
        let beep = BuzzerCommand::beep(0.1);
        assert!(beep.is_tone());
        assert_eq!(beep.duration(), Duration::from_millis(100));

        let pause = BuzzerCommand::pause(1.0);
        assert!(!pause.is_tone());
        assert_eq!(pause.duration(), Duration::from_secs(1));

        // Magnitudes are normalized either way
        assert_eq!(BuzzerCommand::beep(-0.1), BuzzerCommand::beep(0.1));
        assert_eq!(BuzzerCommand::pause(-1.0), BuzzerCommand::pause(1.0));
    }

    #[test]
    fn test_new_parks_pin_low() {
        let buzzer = SoftPwmBuzzer::new(MockPin::new(), 4000).unwrap();
        assert!(!buzzer.pin.high);
        assert_eq!(buzzer.pin.lows, 1);
        assert_eq!(buzzer.half_period, Duration::from_micros(125));
    }

    #[test]
    fn test_tone_toggles_and_respects_deadline() {
        let mut buzzer = SoftPwmBuzzer::new(MockPin::new(), 1000).unwrap();
        let latch = ShutdownLatch::new();

        let start = Instant::now();
        block_on(buzzer.render(BuzzerCommand::beep(0.02), &latch)).unwrap();
        let elapsed = start.elapsed();

        // ~20 ms at 1 kHz is ~20 full cycles; allow generous slack for
        // host scheduling but require actual oscillation
        assert!(buzzer.pin.highs >= 5);
        assert_eq!(buzzer.pin.highs + 1, buzzer.pin.lows); // +1 from new()
        assert!(elapsed >= Duration::from_millis(20));
        assert!(!buzzer.pin.high);
    }

    #[test]
    fn test_silence_does_not_toggle() {
        let mut buzzer = SoftPwmBuzzer::new(MockPin::new(), 1000).unwrap();
        let latch = ShutdownLatch::new();

        let start = Instant::now();
        block_on(buzzer.render(BuzzerCommand::pause(0.03), &latch)).unwrap();

        assert_eq!(buzzer.pin.highs, 0);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_commands_render_in_submission_order() {
        let channel: Channel<NoopRawMutex, BuzzerCommand, QUEUE_DEPTH> = Channel::new();
        let mut buzzer = SoftPwmBuzzer::new(MockPin::new(), 2000).unwrap();
        let latch = ShutdownLatch::new();

        block_on(async {
            // Queue everything up front: beep, pause, beep, then stop
            channel.send(BuzzerCommand::beep(0.01)).await;
            channel.send(BuzzerCommand::pause(0.02)).await;
            channel.send(BuzzerCommand::beep(0.01)).await;

            let consume = async {
                for expected_tone in [true, false, true] {
                    let command = channel.receive().await;
                    assert_eq!(command.is_tone(), expected_tone);
                    let toggles_before = buzzer.pin.highs;
                    buzzer.render(command, &latch).await.unwrap();
                    if expected_tone {
                        assert!(buzzer.pin.highs > toggles_before);
                    } else {
                        assert_eq!(buzzer.pin.highs, toggles_before);
                    }
                }
            };
            consume.await;
        });
    }

    #[test]
    fn test_latch_unblocks_empty_queue_and_releases_pin_once() {
        let channel: Channel<NoopRawMutex, BuzzerCommand, QUEUE_DEPTH> = Channel::new();
        let mut buzzer = SoftPwmBuzzer::new(MockPin::new(), 4000).unwrap();
        let latch = ShutdownLatch::new();

        block_on(async {
            let run = buzzer.run(channel.receiver(), &latch);
            let trip = async {
                Timer::after(Duration::from_millis(30)).await;
                latch.set();
            };
            let (result, ()) = join(run, trip).await;
            result.unwrap();
        });

        // No command ever arrived, so the only transitions are the
        // park in new() and the single release on exit
        assert_eq!(buzzer.pin.highs, 0);
        assert_eq!(buzzer.pin.lows, 2);
        assert!(!buzzer.pin.high);
    }

    #[test]
    fn test_latch_cuts_tone_mid_render() {
        let channel: Channel<NoopRawMutex, BuzzerCommand, QUEUE_DEPTH> = Channel::new();
        let mut buzzer = SoftPwmBuzzer::new(MockPin::new(), 4000).unwrap();
        let latch = ShutdownLatch::new();

        block_on(async {
            // A tone far longer than the cancellation delay
            channel.send(BuzzerCommand::beep(10.0)).await;

            let run = buzzer.run(channel.receiver(), &latch);
            let trip = async {
                Timer::after(Duration::from_millis(20)).await;
                latch.set();
            };
            let start = Instant::now();
            let (result, ()) = join(run, trip).await;
            result.unwrap();

            // Seconds of tone remained, but the loop exited promptly
            assert!(start.elapsed() < Duration::from_secs(2));
        });

        assert!(buzzer.pin.highs > 0);
        assert!(!buzzer.pin.high);
    }
}
