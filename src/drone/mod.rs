//! Session controller — owns the series position and every user-settable
//! parameter, and drives the audio thread through engine commands.
//!
//! Any note change while the drone sounds goes through *blink* semantics:
//! release, mutate, re-attack. The caller never has to stop the drone to
//! step, switch series, or reload settings.

use ringbuf::traits::Producer;

use crate::audio::{AudioError, CommandSender, EngineCommand, Timbre};
use crate::config::Config;
use crate::theory::{Position, Series, SeriesKind};

/// Slowest supported metronome tempo.
pub const MIN_BPM: f64 = 30.0;

/// Fastest supported metronome tempo.
pub const MAX_BPM: f64 = 300.0;

/// The practice session: drone, metronome, and the knobs on both.
pub struct Droner {
    series: Series,
    direction: i8,
    linked: bool,
    droning: bool,
    ticking: bool,
    bpm: f64,
    velocity: f32,
    volume: f32,
    timbre: Timbre,
    commands: CommandSender,
}

impl Droner {
    /// Create a session from saved settings and push them to the audio
    /// thread so both sides agree from the first block.
    pub fn new(commands: CommandSender, config: &Config) -> Result<Self, AudioError> {
        let config = config.clone().sanitized();
        let mut droner = Self {
            series: Series::with_index(config.series, config.index as isize),
            direction: config.direction,
            linked: config.linked,
            droning: false,
            ticking: false,
            bpm: config.bpm,
            velocity: config.velocity,
            volume: config.volume,
            timbre: config.timbre,
            commands,
        };
        droner.push_parameters()?;
        Ok(droner)
    }

    fn send(&mut self, cmd: EngineCommand) -> Result<(), AudioError> {
        self.commands
            .try_push(cmd)
            .map_err(|_| AudioError::CommandQueueFull)
    }

    fn push_parameters(&mut self) -> Result<(), AudioError> {
        self.send(EngineCommand::SetTimbre(self.timbre))?;
        self.send(EngineCommand::SetVelocity(self.velocity))?;
        self.send(EngineCommand::SetVolume(self.volume))?;
        self.send(EngineCommand::SetBpm(self.bpm))
    }

    // --- drone & metronome state -------------------------------------------

    /// Toggle the drone; with link on, the metronome follows.
    pub fn toggle_drone(&mut self) -> Result<(), AudioError> {
        let on = !self.droning;
        let tick = if self.linked { on } else { self.ticking };
        self.set_running(on, tick)
    }

    /// Toggle the metronome; with link on, the drone follows.
    pub fn toggle_tick(&mut self) -> Result<(), AudioError> {
        let on = !self.ticking;
        let drone = if self.linked { on } else { self.droning };
        self.set_running(drone, on)
    }

    /// Linking while either side runs brings the other up with it.
    pub fn set_linked(&mut self, linked: bool) -> Result<(), AudioError> {
        self.linked = linked;
        if linked && (self.droning || self.ticking) {
            self.set_running(true, true)
        } else {
            Ok(())
        }
    }

    pub fn toggle_linked(&mut self) -> Result<(), AudioError> {
        self.set_linked(!self.linked)
    }

    fn set_running(&mut self, drone: bool, tick: bool) -> Result<(), AudioError> {
        if drone != self.droning {
            if drone {
                self.send(EngineCommand::DroneOn(self.series.midi_note()))?;
                self.series.set_pivot();
            } else {
                self.send(EngineCommand::DroneOff)?;
                self.series.clear_pivot();
            }
            self.droning = drone;
        }
        if tick != self.ticking {
            self.send(if tick {
                EngineCommand::TickOn
            } else {
                EngineCommand::TickOff
            })?;
            self.ticking = tick;
        }
        Ok(())
    }

    /// Run `mutate` with the drone silenced, re-attacking at the new note if
    /// it was sounding.
    fn blink<T>(
        &mut self,
        mutate: impl FnOnce(&mut Series) -> T,
    ) -> Result<T, AudioError> {
        let was_droning = self.droning;
        if was_droning {
            self.send(EngineCommand::DroneOff)?;
        }
        let out = mutate(&mut self.series);
        if was_droning {
            self.send(EngineCommand::DroneOn(self.series.midi_note()))?;
        }
        Ok(out)
    }

    // --- position ----------------------------------------------------------

    /// Step "forward" or "back" as seen from the pedal and arrow keys; the
    /// configured direction decides which way that is.
    pub fn step(&mut self, forward: bool) -> Result<Position, AudioError> {
        let delta = self.direction as isize * if forward { 1 } else { -1 };
        self.change_drone(delta)
    }

    /// Move by a raw delta, ignoring direction.
    pub fn change_drone(&mut self, delta: isize) -> Result<Position, AudioError> {
        self.blink(|series| series.step(delta))
    }

    /// Jump to an absolute series index.
    pub fn set_drone(&mut self, index: isize) -> Result<Position, AudioError> {
        self.blink(|series| series.jump(index))
    }

    /// Load a different series, keeping the drone sounding if it was.
    pub fn set_series(
        &mut self,
        kind: SeriesKind,
        index: Option<usize>,
    ) -> Result<Position, AudioError> {
        let droning = self.droning;
        self.blink(move |series| {
            *series = Series::with_index(kind, index.unwrap_or(0) as isize);
            if droning {
                series.set_pivot();
            }
            series.position()
        })
    }

    pub fn cycle_series(&mut self) -> Result<Position, AudioError> {
        self.set_series(self.series.kind().next(), None)
    }

    pub fn flip_direction(&mut self) {
        self.direction = -self.direction;
    }

    // --- parameters --------------------------------------------------------

    /// Set the tempo, rounded to a whole BPM and clamped to the dial range.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<(), AudioError> {
        self.bpm = bpm.round().clamp(MIN_BPM, MAX_BPM);
        self.send(EngineCommand::SetBpm(self.bpm))
    }

    pub fn nudge_bpm(&mut self, delta: f64) -> Result<(), AudioError> {
        self.set_bpm(self.bpm + delta)
    }

    /// Halve or double the tempo (clamped like any other change).
    pub fn scale_bpm(&mut self, factor: f64) -> Result<(), AudioError> {
        self.set_bpm(self.bpm * factor)
    }

    pub fn set_velocity(&mut self, velocity: f32) -> Result<(), AudioError> {
        self.velocity = velocity.clamp(0.0, 1.0);
        self.send(EngineCommand::SetVelocity(self.velocity))
    }

    pub fn nudge_velocity(&mut self, delta: f32) -> Result<(), AudioError> {
        self.set_velocity(self.velocity + delta)
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.volume = volume.clamp(0.0, 1.0);
        self.send(EngineCommand::SetVolume(self.volume))
    }

    pub fn nudge_volume(&mut self, delta: f32) -> Result<(), AudioError> {
        self.set_volume(self.volume + delta)
    }

    pub fn set_timbre(&mut self, timbre: Timbre) -> Result<(), AudioError> {
        self.timbre = timbre;
        self.send(EngineCommand::SetTimbre(timbre))
    }

    pub fn cycle_timbre(&mut self) -> Result<(), AudioError> {
        self.set_timbre(self.timbre.next())
    }

    /// Reapply a full settings snapshot (startup restore and reset).
    pub fn apply_config(&mut self, config: &Config) -> Result<(), AudioError> {
        let config = config.clone().sanitized();
        self.direction = config.direction;
        self.linked = config.linked;
        self.bpm = config.bpm;
        self.velocity = config.velocity;
        self.volume = config.volume;
        self.timbre = config.timbre;
        self.push_parameters()?;
        self.set_series(config.series, Some(config.index))?;
        Ok(())
    }

    /// Snapshot the session for saving.
    pub fn to_config(&self) -> Config {
        Config {
            series: self.series.kind(),
            index: self.series.index(),
            direction: self.direction,
            volume: self.volume,
            velocity: self.velocity,
            bpm: self.bpm,
            linked: self.linked,
            timbre: self.timbre,
        }
    }

    // --- accessors ---------------------------------------------------------

    pub fn position(&self) -> Position {
        self.series.position()
    }

    pub fn series_kind(&self) -> SeriesKind {
        self.series.kind()
    }

    pub fn is_droning(&self) -> bool {
        self.droning
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn direction(&self) -> i8 {
        self.direction
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn timbre(&self) -> Timbre {
        self.timbre
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{
        traits::{Consumer, Split},
        HeapRb,
    };

    fn setup() -> (Droner, ringbuf::HeapCons<EngineCommand>) {
        let rb = HeapRb::<EngineCommand>::new(64);
        let (prod, cons) = rb.split();
        let droner = Droner::new(prod, &Config::default()).unwrap();
        (droner, cons)
    }

    fn drain(cons: &mut ringbuf::HeapCons<EngineCommand>) -> Vec<EngineCommand> {
        let mut cmds = Vec::new();
        while let Some(cmd) = cons.try_pop() {
            cmds.push(cmd);
        }
        cmds
    }

    #[test]
    fn new_pushes_saved_parameters() {
        let (_droner, mut cons) = setup();
        let cmds = drain(&mut cons);
        assert!(cmds.contains(&EngineCommand::SetBpm(60.0)));
        assert!(cmds.contains(&EngineCommand::SetVelocity(0.8)));
        assert!(cmds.contains(&EngineCommand::SetVolume(1.0)));
        assert!(cmds.contains(&EngineCommand::SetTimbre(Timbre::Strings)));
    }

    #[test]
    fn toggle_drone_marks_the_pivot() {
        let (mut droner, mut cons) = setup();
        drain(&mut cons);

        droner.toggle_drone().unwrap();
        assert!(droner.is_droning());
        assert_eq!(droner.position().pivot_note, Some("C"));
        assert!(drain(&mut cons).contains(&EngineCommand::DroneOn(48)));

        droner.toggle_drone().unwrap();
        assert!(!droner.is_droning());
        assert_eq!(droner.position().pivot_note, None);
        assert!(drain(&mut cons).contains(&EngineCommand::DroneOff));
    }

    #[test]
    fn linked_toggle_drives_both() {
        let (mut droner, mut cons) = setup();
        drain(&mut cons);

        droner.toggle_drone().unwrap();
        assert!(droner.is_droning() && droner.is_ticking());
        let cmds = drain(&mut cons);
        assert!(cmds.contains(&EngineCommand::DroneOn(48)));
        assert!(cmds.contains(&EngineCommand::TickOn));

        droner.toggle_tick().unwrap();
        assert!(!droner.is_droning() && !droner.is_ticking());
    }

    #[test]
    fn unlinked_toggles_are_independent() {
        let (mut droner, mut cons) = setup();
        droner.set_linked(false).unwrap();
        drain(&mut cons);

        droner.toggle_tick().unwrap();
        assert!(droner.is_ticking());
        assert!(!droner.is_droning());
        let cmds = drain(&mut cons);
        assert!(cmds.contains(&EngineCommand::TickOn));
        assert!(!cmds.contains(&EngineCommand::DroneOn(48)));
    }

    #[test]
    fn relinking_brings_the_other_side_up() {
        let (mut droner, _cons) = setup();
        droner.set_linked(false).unwrap();
        droner.toggle_tick().unwrap();
        assert!(!droner.is_droning());

        droner.set_linked(true).unwrap();
        assert!(droner.is_droning() && droner.is_ticking());
    }

    #[test]
    fn stepping_while_droning_blinks() {
        let (mut droner, mut cons) = setup();
        droner.toggle_drone().unwrap();
        drain(&mut cons);

        let pos = droner.step(true).unwrap();
        assert_eq!(pos.current_note, "F");
        assert_eq!(
            drain(&mut cons),
            vec![EngineCommand::DroneOff, EngineCommand::DroneOn(53)]
        );
        // The pivot still marks where the drone was started.
        assert_eq!(pos.pivot_note, Some("C"));
    }

    #[test]
    fn stepping_while_stopped_is_silent() {
        let (mut droner, mut cons) = setup();
        drain(&mut cons);
        droner.step(true).unwrap();
        assert!(drain(&mut cons).is_empty());
    }

    #[test]
    fn direction_reverses_forward() {
        let (mut droner, _cons) = setup();
        droner.flip_direction();
        let pos = droner.step(true).unwrap();
        // Forward with direction -1 walks the series backwards.
        assert_eq!(pos.index, 11);
        assert_eq!(pos.current_note, "G");
    }

    #[test]
    fn series_change_keeps_the_drone_sounding() {
        let (mut droner, mut cons) = setup();
        droner.toggle_drone().unwrap();
        drain(&mut cons);

        let pos = droner.set_series(SeriesKind::Chromatic, None).unwrap();
        assert_eq!(pos.current_note, "C");
        assert_eq!(pos.pivot_note, Some("C"));
        let cmds = drain(&mut cons);
        assert_eq!(
            cmds,
            vec![EngineCommand::DroneOff, EngineCommand::DroneOn(48)]
        );
        assert_eq!(droner.series_kind(), SeriesKind::Chromatic);
    }

    #[test]
    fn bpm_rounds_and_clamps() {
        let (mut droner, _cons) = setup();
        droner.set_bpm(72.4).unwrap();
        assert_eq!(droner.bpm(), 72.0);
        droner.set_bpm(1000.0).unwrap();
        assert_eq!(droner.bpm(), MAX_BPM);
        droner.scale_bpm(0.5).unwrap();
        assert_eq!(droner.bpm(), 150.0);
        droner.set_bpm(10.0).unwrap();
        assert_eq!(droner.bpm(), MIN_BPM);
        droner.nudge_bpm(-5.0).unwrap();
        assert_eq!(droner.bpm(), MIN_BPM);
    }

    #[test]
    fn levels_clamp_to_unit_range() {
        let (mut droner, _cons) = setup();
        droner.set_volume(1.7).unwrap();
        assert_eq!(droner.volume(), 1.0);
        droner.nudge_velocity(1.0).unwrap();
        assert_eq!(droner.velocity(), 1.0);
        droner.set_velocity(-0.5).unwrap();
        assert_eq!(droner.velocity(), 0.0);
    }

    #[test]
    fn config_round_trips_through_the_session() {
        let (mut droner, _cons) = setup();
        droner.cycle_series().unwrap();
        droner.change_drone(4).unwrap();
        droner.flip_direction();
        droner.set_bpm(96.0).unwrap();
        droner.cycle_timbre().unwrap();

        let saved = droner.to_config();
        assert_eq!(saved.series, SeriesKind::FlatsThenSharps);
        assert_eq!(saved.index, 4);
        assert_eq!(saved.direction, -1);
        assert_eq!(saved.bpm, 96.0);
        assert_eq!(saved.timbre, Timbre::Beep);

        let rb = HeapRb::<EngineCommand>::new(64);
        let (prod, _cons2) = rb.split();
        let restored = Droner::new(prod, &saved).unwrap();
        assert_eq!(restored.position().index, 4);
        assert_eq!(restored.series_kind(), SeriesKind::FlatsThenSharps);
        assert_eq!(restored.bpm(), 96.0);
    }

    #[test]
    fn buffer_full_is_an_error_not_a_panic() {
        let rb = HeapRb::<EngineCommand>::new(2);
        let (prod, _cons) = rb.split();
        // Two slots cannot hold the four startup parameters.
        assert!(matches!(
            Droner::new(prod, &Config::default()),
            Err(AudioError::CommandQueueFull)
        ));
    }
}
